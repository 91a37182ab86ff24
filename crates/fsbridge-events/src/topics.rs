//! Event names shared by the host executor and the application layer.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named events multiplexed over the shared transfer channel.
///
/// All downloads share the `Download*` names and all uploads share the
/// `Upload*` names; the job handle embedded in each payload tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// Response headers for a download arrived.
    DownloadBegin,
    /// Bytes were written for a download.
    DownloadProgress,
    /// The host reported that a download can be resumed.
    DownloadResumable,
    /// An upload request started streaming.
    UploadBegin,
    /// Bytes were sent for an upload.
    UploadProgress,
}

impl EventName {
    /// Every event name, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::DownloadBegin,
        Self::DownloadProgress,
        Self::DownloadResumable,
        Self::UploadBegin,
        Self::UploadProgress,
    ];

    /// Wire name used by the host when emitting the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DownloadBegin => "DownloadBegin",
            Self::DownloadProgress => "DownloadProgress",
            Self::DownloadResumable => "DownloadResumable",
            Self::UploadBegin => "UploadBegin",
            Self::UploadProgress => "UploadProgress",
        }
    }
}

impl Display for EventName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventName {
    /// Name supplied by the caller.
    pub value: String,
}

impl Display for UnknownEventName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("unknown event name")
    }
}

impl std::error::Error for UnknownEventName {}

impl FromStr for EventName {
    type Err = UnknownEventName;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == value)
            .ok_or_else(|| UnknownEventName {
                value: value.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_round_trip_through_wire_strings() {
        for name in EventName::ALL {
            assert_eq!(name.as_str().parse::<EventName>(), Ok(name));
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn unknown_event_name_keeps_value() {
        let err = "DownloadDone"
            .parse::<EventName>()
            .expect_err("unknown name should fail");
        assert_eq!(err.value, "DownloadDone");
        assert_eq!(err.to_string(), "unknown event name");
    }
}
