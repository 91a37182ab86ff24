//! Validation and parsing helpers for configuration values.

use crate::error::{ConfigError, ConfigResult};
use crate::model::BridgeConfig;

/// Encoding selectors understood by the codec.
pub const KNOWN_ENCODINGS: [&str; 3] = ["utf8", "ascii", "base64"];

const KNOWN_LOG_FORMATS: [&str; 2] = ["json", "pretty"];

/// Check cross-field invariants of a fully assembled configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the first offending field.
pub fn validate(config: &BridgeConfig) -> ConfigResult<()> {
    let transfers = &config.transfers;
    require_positive("transfers", "read_timeout_ms", transfers.read_timeout_ms)?;
    require_positive(
        "transfers",
        "connection_timeout_ms",
        transfers.connection_timeout_ms,
    )?;
    require_positive(
        "transfers",
        "background_timeout_ms",
        transfers.background_timeout_ms,
    )?;
    if transfers.progress_divider > 100 {
        return Err(ConfigError::invalid(
            "transfers",
            "progress_divider",
            Some(transfers.progress_divider.to_string()),
            "must be between 0 and 100",
        ));
    }
    if transfers.upload_method.trim().is_empty() {
        return Err(ConfigError::invalid(
            "transfers",
            "upload_method",
            None,
            "must not be empty",
        ));
    }

    if !KNOWN_ENCODINGS.contains(&config.default_encoding.as_str()) {
        return Err(ConfigError::invalid(
            "bridge",
            "default_encoding",
            Some(config.default_encoding.clone()),
            "must be one of utf8, ascii, base64",
        ));
    }

    if let Some(format) = &config.logging.format
        && !KNOWN_LOG_FORMATS.contains(&format.as_str())
    {
        return Err(ConfigError::invalid(
            "logging",
            "format",
            Some(format.clone()),
            "must be json or pretty",
        ));
    }
    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::invalid(
            "logging",
            "level",
            None,
            "must not be empty",
        ));
    }
    Ok(())
}

pub(crate) fn parse_u64(
    section: &'static str,
    field: &'static str,
    raw: &str,
) -> ConfigResult<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        ConfigError::invalid(
            section,
            field,
            Some(raw.to_string()),
            "must be a non-negative integer",
        )
    })
}

fn require_positive(section: &'static str, field: &'static str, value: u64) -> ConfigResult<()> {
    if value == 0 {
        return Err(ConfigError::invalid(
            section,
            field,
            Some("0".into()),
            "must be positive",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: &ConfigError) -> Option<&'static str> {
        match err {
            ConfigError::InvalidField { field, .. } => Some(*field),
            _ => None,
        }
    }

    #[test]
    fn default_configuration_is_valid() {
        assert!(validate(&BridgeConfig::default()).is_ok());
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let mut config = BridgeConfig::default();
        config.transfers.connection_timeout_ms = 0;
        let err = validate(&config).expect_err("zero timeout");
        assert_eq!(field_of(&err), Some("connection_timeout_ms"));
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let mut config = BridgeConfig::default();
        config.default_encoding = "latin1".into();
        let err = validate(&config).expect_err("unknown encoding");
        assert_eq!(field_of(&err), Some("default_encoding"));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let mut config = BridgeConfig::default();
        config.logging.format = Some("xml".into());
        let err = validate(&config).expect_err("unknown format");
        assert_eq!(field_of(&err), Some("format"));
    }

    #[test]
    fn numeric_parsers_report_offending_value() {
        assert_eq!(parse_u64("transfers", "read_timeout_ms", " 42 ").ok(), Some(42));
        let err = parse_u64("transfers", "read_timeout_ms", "-1").expect_err("negative");
        match err {
            ConfigError::InvalidField { value, .. } => assert_eq!(value.as_deref(), Some("-1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
