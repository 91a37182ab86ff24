//! Typed configuration models.

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Complete bridge configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Defaults applied to transfer requests.
    pub transfers: TransferDefaults,
    /// Encoding used by read/write calls that do not name one.
    pub default_encoding: String,
    /// Logging output settings.
    pub logging: LoggingSettings,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            transfers: TransferDefaults::default(),
            default_encoding: defaults::DEFAULT_ENCODING.to_string(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Tuning values used when a transfer request omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransferDefaults {
    /// Read timeout in milliseconds.
    pub read_timeout_ms: u64,
    /// Connection timeout in milliseconds.
    pub connection_timeout_ms: u64,
    /// Background session timeout in milliseconds.
    pub background_timeout_ms: u64,
    /// Progress divider (percent steps); zero reports every update.
    pub progress_divider: u32,
    /// Minimum interval between progress events; zero disables throttling.
    pub progress_interval_ms: u64,
    /// HTTP method used for uploads.
    pub upload_method: String,
}

impl Default for TransferDefaults {
    fn default() -> Self {
        Self {
            read_timeout_ms: defaults::READ_TIMEOUT_MS,
            connection_timeout_ms: defaults::CONNECTION_TIMEOUT_MS,
            background_timeout_ms: defaults::BACKGROUND_TIMEOUT_MS,
            progress_divider: defaults::PROGRESS_DIVIDER,
            progress_interval_ms: defaults::PROGRESS_INTERVAL_MS,
            upload_method: defaults::UPLOAD_METHOD.to_string(),
        }
    }
}

/// Logging settings. `format` is `json` or `pretty`; absent means "infer from build".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Level directive handed to the tracing filter.
    pub level: String,
    /// Output format.
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            format: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_transfer_contract() {
        let config = BridgeConfig::default();
        assert_eq!(config.transfers.read_timeout_ms, 15_000);
        assert_eq!(config.transfers.connection_timeout_ms, 5_000);
        assert_eq!(config.transfers.background_timeout_ms, 3_600_000);
        assert_eq!(config.transfers.progress_divider, 0);
        assert_eq!(config.transfers.progress_interval_ms, 0);
        assert_eq!(config.transfers.upload_method, "POST");
        assert_eq!(config.default_encoding, "utf8");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.format.is_none());
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"transfers": {"read_timeout_ms": 30000}}"#)
                .expect("parse partial config");
        assert_eq!(config.transfers.read_timeout_ms, 30_000);
        assert_eq!(config.transfers.connection_timeout_ms, 5_000);
        assert_eq!(config.default_encoding, "utf8");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed = serde_json::from_str::<BridgeConfig>(r#"{"transfer": {}}"#);
        assert!(parsed.is_err());
    }
}
