//! Error types for telemetry operations.

use std::fmt::{self, Display, Formatter};

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Step of collector setup that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorStage {
    /// Building the collector from its options.
    Build,
    /// Adding the collector to the registry.
    Register,
}

impl Display for CollectorStage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Build => "build",
            Self::Register => "register",
        })
    }
}

/// Errors raised by telemetry helpers.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global tracing subscriber was already installed.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A Prometheus collector could not be set up.
    #[error("failed to set up metrics collector")]
    Collector {
        /// Metric name.
        metric: &'static str,
        /// Setup step that failed.
        stage: CollectorStage,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Gathered metrics could not be encoded.
    #[error("failed to encode metrics")]
    Encode {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// Encoded metrics were not valid UTF-8.
    #[error("metrics output was not valid utf-8")]
    Utf8 {
        /// Underlying conversion error.
        source: std::string::FromUtf8Error,
    },
}
