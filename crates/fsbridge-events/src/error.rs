//! Event channel error primitives.

use std::fmt::{self, Display, Formatter};

use crate::hub::SubscriptionToken;

/// Error emitted when a listener registration cannot be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventChannelError {
    /// The token does not refer to a live registration.
    UnknownSubscription {
        /// Token supplied by the caller.
        token: SubscriptionToken,
    },
}

impl EventChannelError {
    /// Token involved in the failure.
    #[must_use]
    pub const fn token(&self) -> SubscriptionToken {
        match self {
            Self::UnknownSubscription { token } => *token,
        }
    }
}

impl Display for EventChannelError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("subscription is not registered")
    }
}

impl std::error::Error for EventChannelError {}

/// Result wrapper for event channel operations.
pub type EventChannelResult<T> = Result<T, EventChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_channel_error_exposes_token() {
        let err = EventChannelError::UnknownSubscription {
            token: SubscriptionToken::new(42),
        };

        assert_eq!(err.token().get(), 42);
        assert_eq!(err.to_string(), "subscription is not registered");
    }
}
