//! # Design
//!
//! - Constant error messages; context travels in fields (operation, field, reason).
//! - Host failures are wrapped, never rewritten, so callers see the executor's error.
//! - Unsupported host capabilities surface as a dedicated variant on both layers.

use std::error::Error;

use fsbridge_events::JobHandle;
use thiserror::Error;

use crate::codec::CodecError;

/// Errors reported by host executors and filesystem hosts.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The host does not implement the operation.
    #[error("host operation not supported")]
    Unsupported {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The host attempted the operation and failed.
    #[error("host operation failed")]
    Failed {
        /// Operation identifier.
        operation: &'static str,
        /// Host error code (for example `ENOENT`) when one was reported.
        code: Option<String>,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl ExecutorError {
    /// Wrap a host failure without an error code.
    pub fn failed(
        operation: &'static str,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Failed {
            operation,
            code: None,
            source: source.into(),
        }
    }

    /// Wrap a host failure carrying a platform error code.
    pub fn coded(
        operation: &'static str,
        code: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self::Failed {
            operation,
            code: Some(code.into()),
            source: source.into(),
        }
    }

    /// Operation identifier attached to the error.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Unsupported { operation } | Self::Failed { operation, .. } => *operation,
        }
    }

    /// Host error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Unsupported { .. } => None,
            Self::Failed { code, .. } => code.as_deref(),
        }
    }
}

/// Result alias for host calls.
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors surfaced to bridge callers.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A caller-supplied argument failed validation.
    #[error("invalid argument")]
    InvalidArgument {
        /// Operation that rejected the argument.
        operation: &'static str,
        /// Offending field, using the wire name.
        field: &'static str,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// The encoding selector is not one of `utf8`, `ascii`, `base64`.
    #[error("invalid encoding")]
    InvalidEncoding {
        /// Selector supplied by the caller.
        value: String,
    },
    /// Payload could not be transcoded.
    #[error("malformed payload")]
    MalformedPayload {
        /// Operation that was transcoding.
        operation: &'static str,
        /// Underlying codec failure.
        #[source]
        source: CodecError,
    },
    /// The host lacks the capability required by the operation.
    #[error("operation not supported")]
    UnsupportedOperation {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The host reported a failure; forwarded unchanged.
    #[error("executor failure")]
    Executor {
        /// Operation identifier.
        operation: &'static str,
        /// Host error.
        #[source]
        source: ExecutorError,
    },
    /// The job was cancelled before the host reported a result.
    #[error("transfer cancelled")]
    Cancelled {
        /// Cancelled job.
        job: JobHandle,
    },
    /// The job driver stopped without producing an outcome.
    #[error("transfer outcome lost")]
    OutcomeLost {
        /// Affected job.
        job: JobHandle,
    },
    /// Transfers were started outside a Tokio runtime.
    #[error("no async runtime available")]
    RuntimeUnavailable {
        /// Operation identifier.
        operation: &'static str,
    },
}

impl BridgeError {
    pub(crate) const fn invalid(
        operation: &'static str,
        field: &'static str,
        reason: &'static str,
    ) -> Self {
        Self::InvalidArgument {
            operation,
            field,
            reason,
        }
    }

    /// Map a host error onto the bridge surface.
    ///
    /// Unsupported host calls become [`BridgeError::UnsupportedOperation`];
    /// everything else is wrapped as [`BridgeError::Executor`].
    #[must_use]
    pub fn from_executor(operation: &'static str, source: ExecutorError) -> Self {
        match source {
            ExecutorError::Unsupported { .. } => Self::UnsupportedOperation { operation },
            other => Self::Executor {
                operation,
                source: other,
            },
        }
    }

    /// Map a codec error onto the bridge surface.
    #[must_use]
    pub fn from_codec(operation: &'static str, source: CodecError) -> Self {
        match source {
            CodecError::InvalidEncoding { value } => Self::InvalidEncoding { value },
            other => Self::MalformedPayload {
                operation,
                source: other,
            },
        }
    }

    /// Field name for argument errors.
    #[must_use]
    pub const fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidArgument { field, .. } => Some(*field),
            _ => None,
        }
    }
}

/// Result alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn unsupported_host_call_maps_to_unsupported_operation() {
        let err = BridgeError::from_executor(
            "stopUpload",
            ExecutorError::Unsupported {
                operation: "stop_upload",
            },
        );
        assert!(matches!(
            err,
            BridgeError::UnsupportedOperation {
                operation: "stopUpload"
            }
        ));
    }

    #[test]
    fn host_failures_are_wrapped_unchanged() {
        let err = BridgeError::from_executor(
            "downloadFile",
            ExecutorError::coded("submit_download", "ENOENT", io::Error::other("no such file")),
        );
        match err {
            BridgeError::Executor { operation, source } => {
                assert_eq!(operation, "downloadFile");
                assert_eq!(source.code(), Some("ENOENT"));
                assert_eq!(source.operation(), "submit_download");
                let inner = source.source().map(ToString::to_string);
                assert_eq!(inner.as_deref(), Some("no such file"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn codec_errors_split_encoding_from_payload() {
        let err = BridgeError::from_codec(
            "readFile",
            CodecError::InvalidEncoding {
                value: "utf16".into(),
            },
        );
        assert!(matches!(err, BridgeError::InvalidEncoding { ref value } if value == "utf16"));

        let err = BridgeError::from_codec("readFile", CodecError::NotByteString { position: 3 });
        assert!(matches!(err, BridgeError::MalformedPayload { .. }));
        assert_eq!(err.to_string(), "malformed payload");
    }
}
