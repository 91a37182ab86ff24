//! Event payload types carried on the shared transfer channel.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::topics::EventName;

/// Opaque identity correlating a transfer with its events and control calls.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct JobHandle(u64);

impl JobHandle {
    /// Placeholder handle returned when no job was started.
    pub const UNASSIGNED: Self = Self(0);

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this handle was issued by an allocator.
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl Display for JobHandle {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Response headers for a download arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadBegin {
    /// Job the event belongs to.
    pub job_id: JobHandle,
    /// HTTP status code of the response.
    pub status_code: u16,
    /// Expected payload size in bytes.
    pub content_length: u64,
    /// Response headers as reported by the host.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Bytes were written for a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    /// Job the event belongs to.
    pub job_id: JobHandle,
    /// Expected payload size in bytes.
    pub content_length: u64,
    /// Bytes written to disk so far.
    pub bytes_written: u64,
}

/// The host reported that a paused download can be resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResumable {
    /// Job the event belongs to.
    pub job_id: JobHandle,
}

/// An upload request started streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBegin {
    /// Job the event belongs to.
    pub job_id: JobHandle,
}

/// Bytes were sent for an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadProgress {
    /// Job the event belongs to.
    pub job_id: JobHandle,
    /// Total request body size.
    pub total_bytes_expected_to_send: u64,
    /// Bytes sent so far.
    pub total_bytes_sent: u64,
}

/// Typed events surfaced by the host executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TransferEvent {
    /// See [`DownloadBegin`].
    DownloadBegin(DownloadBegin),
    /// See [`DownloadProgress`].
    DownloadProgress(DownloadProgress),
    /// See [`DownloadResumable`].
    DownloadResumable(DownloadResumable),
    /// See [`UploadBegin`].
    UploadBegin(UploadBegin),
    /// See [`UploadProgress`].
    UploadProgress(UploadProgress),
}

impl TransferEvent {
    /// Channel name the event is emitted under.
    #[must_use]
    pub const fn name(&self) -> EventName {
        match self {
            Self::DownloadBegin(_) => EventName::DownloadBegin,
            Self::DownloadProgress(_) => EventName::DownloadProgress,
            Self::DownloadResumable(_) => EventName::DownloadResumable,
            Self::UploadBegin(_) => EventName::UploadBegin,
            Self::UploadProgress(_) => EventName::UploadProgress,
        }
    }

    /// Job handle embedded in the payload.
    #[must_use]
    pub const fn job_handle(&self) -> JobHandle {
        match self {
            Self::DownloadBegin(event) => event.job_id,
            Self::DownloadProgress(event) => event.job_id,
            Self::DownloadResumable(event) => event.job_id,
            Self::UploadBegin(event) => event.job_id,
            Self::UploadProgress(event) => event.job_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_and_handle_follow_variant() {
        let handle = JobHandle::new(7);
        let cases = [
            (
                TransferEvent::DownloadBegin(DownloadBegin {
                    job_id: handle,
                    status_code: 200,
                    content_length: 10,
                    headers: BTreeMap::new(),
                }),
                EventName::DownloadBegin,
            ),
            (
                TransferEvent::DownloadProgress(DownloadProgress {
                    job_id: handle,
                    content_length: 10,
                    bytes_written: 5,
                }),
                EventName::DownloadProgress,
            ),
            (
                TransferEvent::DownloadResumable(DownloadResumable { job_id: handle }),
                EventName::DownloadResumable,
            ),
            (
                TransferEvent::UploadBegin(UploadBegin { job_id: handle }),
                EventName::UploadBegin,
            ),
            (
                TransferEvent::UploadProgress(UploadProgress {
                    job_id: handle,
                    total_bytes_expected_to_send: 10,
                    total_bytes_sent: 1,
                }),
                EventName::UploadProgress,
            ),
        ];

        for (event, name) in cases {
            assert_eq!(event.name(), name);
            assert_eq!(event.job_handle(), handle);
        }
    }

    #[test]
    fn progress_payload_uses_host_field_names() {
        let event = TransferEvent::DownloadProgress(DownloadProgress {
            job_id: JobHandle::new(1),
            content_length: 100,
            bytes_written: 50,
        });
        let value = serde_json::to_value(&event).expect("serialize event");
        assert_eq!(
            value,
            serde_json::json!({
                "event": "DownloadProgress",
                "jobId": 1,
                "contentLength": 100,
                "bytesWritten": 50,
            })
        );
    }

    #[test]
    fn unassigned_handle_is_zero() {
        assert!(!JobHandle::UNASSIGNED.is_assigned());
        assert!(JobHandle::new(3).is_assigned());
        assert_eq!(JobHandle::new(3).to_string(), "3");
    }
}
