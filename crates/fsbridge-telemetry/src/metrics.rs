//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes the counters/gauges the bridge needs: job lifecycle, event
//!   dispatch, and pass-through call outcomes.

use std::sync::Arc;

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{CollectorStage, Result, TelemetryError};

/// Prometheus-backed metrics registry shared by the bridge components.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    transfers_started_total: IntCounterVec,
    transfers_settled_total: IntCounterVec,
    active_transfers: IntGauge,
    events_dispatched_total: IntCounterVec,
    bridge_calls_total: IntCounterVec,
}

/// Snapshot of selected gauges for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Transfers started but not yet settled.
    pub active_transfers: i64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or
    /// registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let inner = MetricsInner {
            transfers_started_total: counter(
                &registry,
                "fsbridge_transfers_started_total",
                "Transfer jobs started by kind",
                &["kind"],
            )?,
            transfers_settled_total: counter(
                &registry,
                "fsbridge_transfers_settled_total",
                "Transfer jobs settled by kind and outcome",
                &["kind", "outcome"],
            )?,
            active_transfers: gauge(
                &registry,
                "fsbridge_active_transfers",
                "Transfer jobs started but not yet settled",
            )?,
            events_dispatched_total: counter(
                &registry,
                "fsbridge_events_dispatched_total",
                "Transfer events delivered to job handlers by name",
                &["event"],
            )?,
            bridge_calls_total: counter(
                &registry,
                "fsbridge_bridge_calls_total",
                "Pass-through host calls by operation and outcome",
                &["operation", "outcome"],
            )?,
            registry,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Record a transfer job start for `kind` (`download` or `upload`).
    pub fn inc_transfer_started(&self, kind: &str) {
        self.inner
            .transfers_started_total
            .with_label_values(&[kind])
            .inc();
        self.inner.active_transfers.inc();
    }

    /// Record a transfer job settlement with its terminal outcome.
    pub fn inc_transfer_settled(&self, kind: &str, outcome: &str) {
        self.inner
            .transfers_settled_total
            .with_label_values(&[kind, outcome])
            .inc();
        self.inner.active_transfers.dec();
    }

    /// Record one event delivered to a job handler.
    pub fn inc_event_dispatched(&self, event: &str) {
        self.inner
            .events_dispatched_total
            .with_label_values(&[event])
            .inc();
    }

    /// Record one pass-through host call.
    pub fn inc_bridge_call(&self, operation: &str, outcome: &str) {
        self.inner
            .bridge_calls_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::Encode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::Utf8 { source })
    }

    /// Take a point-in-time snapshot of the gauges.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_transfers: self.inner.active_transfers.get(),
        }
    }
}

fn counter(
    registry: &Registry,
    metric: &'static str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec> {
    let collector = IntCounterVec::new(Opts::new(metric, help), labels)
        .map_err(|source| collector_error(metric, CollectorStage::Build, source))?;
    register(registry, metric, collector)
}

fn gauge(registry: &Registry, metric: &'static str, help: &str) -> Result<IntGauge> {
    let collector = IntGauge::with_opts(Opts::new(metric, help))
        .map_err(|source| collector_error(metric, CollectorStage::Build, source))?;
    register(registry, metric, collector)
}

fn register<C>(registry: &Registry, metric: &'static str, collector: C) -> Result<C>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| collector_error(metric, CollectorStage::Register, source))?;
    Ok(collector)
}

const fn collector_error(
    metric: &'static str,
    stage: CollectorStage,
    source: prometheus::Error,
) -> TelemetryError {
    TelemetryError::Collector {
        metric,
        stage,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_track_transfer_lifecycle() -> Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_transfer_started("download");
        metrics.inc_transfer_started("upload");
        metrics.inc_event_dispatched("DownloadProgress");
        metrics.inc_transfer_settled("download", "succeeded");
        metrics.inc_bridge_call("read_file", "ok");

        assert_eq!(metrics.snapshot().active_transfers, 1);

        let rendered = metrics.render()?;
        assert!(rendered.contains("fsbridge_transfers_started_total"));
        assert!(rendered.contains("fsbridge_events_dispatched_total"));
        assert!(rendered.contains("outcome=\"succeeded\""));
        assert!(rendered.contains("operation=\"read_file\""));
        Ok(())
    }

    #[test]
    fn registries_are_independent() -> Result<()> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.inc_transfer_started("download");
        assert_eq!(first.snapshot().active_transfers, 1);
        assert_eq!(second.snapshot().active_transfers, 0);
        Ok(())
    }
}
