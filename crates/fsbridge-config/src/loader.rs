//! Layered configuration loading: defaults, then an optional JSON document,
//! then `FSBRIDGE_*` environment overrides.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::BridgeConfig;
use crate::validate::{parse_u64, validate};

/// Environment key overriding the read timeout.
pub const ENV_READ_TIMEOUT_MS: &str = "FSBRIDGE_READ_TIMEOUT_MS";
/// Environment key overriding the connection timeout.
pub const ENV_CONNECTION_TIMEOUT_MS: &str = "FSBRIDGE_CONNECTION_TIMEOUT_MS";
/// Environment key overriding the background timeout.
pub const ENV_BACKGROUND_TIMEOUT_MS: &str = "FSBRIDGE_BACKGROUND_TIMEOUT_MS";
/// Environment key overriding the default encoding.
pub const ENV_DEFAULT_ENCODING: &str = "FSBRIDGE_DEFAULT_ENCODING";
/// Environment key overriding the log level.
pub const ENV_LOG_LEVEL: &str = "FSBRIDGE_LOG_LEVEL";
/// Environment key overriding the log format.
pub const ENV_LOG_FORMAT: &str = "FSBRIDGE_LOG_FORMAT";

const ENV_KEYS: [&str; 6] = [
    ENV_READ_TIMEOUT_MS,
    ENV_CONNECTION_TIMEOUT_MS,
    ENV_BACKGROUND_TIMEOUT_MS,
    ENV_DEFAULT_ENCODING,
    ENV_LOG_LEVEL,
    ENV_LOG_FORMAT,
];

/// Builder that assembles a validated [`BridgeConfig`].
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    overrides: HashMap<String, String>,
}

impl ConfigLoader {
    /// Start from built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer a JSON configuration document over the defaults.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Capture `FSBRIDGE_*` overrides from the process environment.
    #[must_use]
    pub fn with_env(self) -> Self {
        let vars = ENV_KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| ((*key).to_string(), value)));
        self.with_vars(vars)
    }

    /// Layer explicit key/value overrides using the environment key names.
    #[must_use]
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides
            .extend(vars.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    /// Assemble and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed, an override
    /// is malformed, or the assembled configuration fails validation.
    pub fn load(&self) -> ConfigResult<BridgeConfig> {
        let mut config = match &self.file {
            Some(path) => read_document(path)?,
            None => BridgeConfig::default(),
        };
        self.apply_overrides(&mut config)?;
        validate(&config)?;
        debug!(
            file = ?self.file,
            overrides = self.overrides.len(),
            "bridge configuration loaded"
        );
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut BridgeConfig) -> ConfigResult<()> {
        if let Some(raw) = self.overrides.get(ENV_READ_TIMEOUT_MS) {
            config.transfers.read_timeout_ms = parse_u64("transfers", "read_timeout_ms", raw)?;
        }
        if let Some(raw) = self.overrides.get(ENV_CONNECTION_TIMEOUT_MS) {
            config.transfers.connection_timeout_ms =
                parse_u64("transfers", "connection_timeout_ms", raw)?;
        }
        if let Some(raw) = self.overrides.get(ENV_BACKGROUND_TIMEOUT_MS) {
            config.transfers.background_timeout_ms =
                parse_u64("transfers", "background_timeout_ms", raw)?;
        }
        if let Some(raw) = self.overrides.get(ENV_DEFAULT_ENCODING) {
            config.default_encoding = raw.trim().to_string();
        }
        if let Some(raw) = self.overrides.get(ENV_LOG_LEVEL) {
            config.logging.level = raw.trim().to_string();
        }
        if let Some(raw) = self.overrides.get(ENV_LOG_FORMAT) {
            config.logging.format = Some(raw.trim().to_ascii_lowercase());
        }
        Ok(())
    }
}

fn read_document(path: &Path) -> ConfigResult<BridgeConfig> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "config.read",
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
