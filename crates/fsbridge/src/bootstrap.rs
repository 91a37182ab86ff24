//! Bridge assembly from configuration.
//!
//! Order: configuration, logging, metrics, event hub, executor, bridge.

use std::fmt;
use std::sync::Arc;

use fsbridge_config::{BridgeConfig, ConfigLoader};
use fsbridge_core::{FileSystemHost, TransferExecutor};
use fsbridge_events::EventHub;
use fsbridge_telemetry::{LogFormat, LoggingConfig, Metrics, build_sha};
use tracing::{debug, info};

use crate::bridge::FsBridge;
use crate::error::{BootstrapError, BootstrapResult};

/// Assembled bridge together with the shared services it was built on.
pub struct BridgeRuntime {
    bridge: FsBridge,
    events: EventHub,
    metrics: Metrics,
    config: BridgeConfig,
}

impl BridgeRuntime {
    /// The bridge.
    #[must_use]
    pub const fn bridge(&self) -> &FsBridge {
        &self.bridge
    }

    /// Event hub the executor emits on.
    #[must_use]
    pub const fn events(&self) -> &EventHub {
        &self.events
    }

    /// Metrics registry shared by the bridge.
    #[must_use]
    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

impl fmt::Debug for BridgeRuntime {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BridgeRuntime")
            .field("bridge", &self.bridge)
            .field("listeners", &self.events.listener_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Load configuration, install logging and wire a bridge over `host`.
///
/// `executor` receives the event hub the bridge listens on and returns the
/// transfer executor that emits on it. An already installed tracing
/// subscriber is kept.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or names an
/// unusable value, or the metrics registry cannot be built.
pub fn bootstrap<F>(
    loader: &ConfigLoader,
    host: Arc<dyn FileSystemHost>,
    executor: F,
) -> BootstrapResult<BridgeRuntime>
where
    F: FnOnce(&EventHub) -> Arc<dyn TransferExecutor>,
{
    let config = loader
        .load()
        .map_err(|err| BootstrapError::config("config_loader.load", err))?;

    let format = match config.logging.format.as_deref() {
        Some(raw) => raw.parse().map_err(|_| BootstrapError::InvalidConfig {
            field: "logging.format",
            reason: "unknown_format",
            value: Some(raw.to_string()),
        })?,
        None => LogFormat::infer(),
    };
    let logging = LoggingConfig {
        level: &config.logging.level,
        format,
        build_sha: build_sha(),
    };
    if let Err(err) = fsbridge_telemetry::init_logging(&logging) {
        debug!(error = %err, "keeping existing tracing subscriber");
    }

    let metrics =
        Metrics::new().map_err(|err| BootstrapError::telemetry("telemetry.metrics", err))?;
    let events = EventHub::new();
    let executor = executor(&events);
    let bridge = FsBridge::new(host, executor, Arc::new(events.clone()), &config)
        .map_err(|_| BootstrapError::InvalidConfig {
            field: "default_encoding",
            reason: "unknown_encoding",
            value: Some(config.default_encoding.clone()),
        })?
        .with_metrics(metrics.clone());

    info!(
        default_encoding = %bridge.default_encoding(),
        capabilities = ?bridge.capabilities(),
        "filesystem bridge ready"
    );
    Ok(BridgeRuntime {
        bridge,
        events,
        metrics,
        config,
    })
}
