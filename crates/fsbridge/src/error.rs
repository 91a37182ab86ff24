//! # Design
//!
//! - Bootstrap failures carry the operation that failed and the source error.
//! - Bridge call failures stay in [`fsbridge_core::BridgeError`].

use thiserror::Error;

/// Result alias for bootstrap operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Errors raised while assembling a bridge.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration could not be loaded.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: fsbridge_config::ConfigError,
    },
    /// Telemetry could not be initialised.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: fsbridge_telemetry::TelemetryError,
    },
    /// Configuration passed validation but the bridge rejected it.
    #[error("invalid configuration")]
    InvalidConfig {
        /// Field name that failed.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value.
        value: Option<String>,
    },
}

impl BootstrapError {
    pub(crate) const fn config(
        operation: &'static str,
        source: fsbridge_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: fsbridge_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_variants() {
        let config = BootstrapError::config(
            "load",
            fsbridge_config::ConfigError::InvalidField {
                section: "transfers",
                field: "read_timeout_ms",
                value: Some("0".to_string()),
                reason: "zero",
            },
        );
        assert!(matches!(config, BootstrapError::Config { operation: "load", .. }));
        assert_eq!(config.to_string(), "configuration operation failed");

        let invalid = BootstrapError::InvalidConfig {
            field: "default_encoding",
            reason: "unknown_encoding",
            value: Some("latin1".to_string()),
        };
        assert_eq!(invalid.to_string(), "invalid configuration");
    }
}
