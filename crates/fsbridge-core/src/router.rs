//! Per-job subscriptions on the shared event channel.
//!
//! The channel is shared by every job of a kind, so each registration wraps
//! the caller's handler in a filter on the embedded job handle. All
//! registrations made for one job live in a [`SubscriptionSet`] that releases
//! them exactly once.

use std::fmt;
use std::sync::Arc;

use fsbridge_events::{
    EventChannel, EventName, JobHandle, Listener, SubscriptionToken, TransferEvent,
};
use fsbridge_telemetry::Metrics;
use tracing::{debug, warn};

/// Handler invoked with events that belong to the subscribed job.
pub type EventHandler = Arc<dyn Fn(&TransferEvent) + Send + Sync>;

/// Binds job-scoped handlers to an injected [`EventChannel`].
#[derive(Clone)]
pub struct SubscriptionRouter {
    channel: Arc<dyn EventChannel>,
    metrics: Option<Metrics>,
}

impl SubscriptionRouter {
    /// Router over `channel`.
    #[must_use]
    pub fn new(channel: Arc<dyn EventChannel>) -> Self {
        Self {
            channel,
            metrics: None,
        }
    }

    /// Count dispatched events in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register `handler` for `name`, invoked only for events carrying `job`.
    pub fn attach(
        &self,
        job: JobHandle,
        name: EventName,
        handler: EventHandler,
    ) -> SubscriptionToken {
        let metrics = self.metrics.clone();
        let listener: Listener = Arc::new(move |event: &TransferEvent| {
            if event.job_handle() != job {
                return;
            }
            if let Some(metrics) = &metrics {
                metrics.inc_event_dispatched(name.as_str());
            }
            handler(event);
        });
        let token = self.channel.add_listener(name, listener);
        debug!(job_id = %job, event = %name, token = %token, "subscription attached");
        token
    }

    /// Remove every registration in `tokens`.
    ///
    /// Removal failures are logged and skipped; they never abort the release.
    pub fn release_all(&self, job: JobHandle, tokens: &[SubscriptionToken]) {
        for token in tokens {
            if let Err(err) = self.channel.remove_listener(*token) {
                warn!(
                    job_id = %job,
                    token = %err.token(),
                    error = %err,
                    "subscription cleanup failed"
                );
            }
        }
        debug!(job_id = %job, released = tokens.len(), "subscriptions released");
    }

    /// Empty subscription set for `job`.
    #[must_use]
    pub fn subscriptions(&self, job: JobHandle) -> SubscriptionSet {
        SubscriptionSet {
            router: self.clone(),
            job,
            tokens: Vec::new(),
            released: false,
        }
    }
}

impl fmt::Debug for SubscriptionRouter {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SubscriptionRouter")
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

/// Registrations created for one job. Released once, explicitly or on drop.
pub struct SubscriptionSet {
    router: SubscriptionRouter,
    job: JobHandle,
    tokens: Vec<SubscriptionToken>,
    released: bool,
}

impl SubscriptionSet {
    /// Job the set belongs to.
    #[must_use]
    pub const fn job(&self) -> JobHandle {
        self.job
    }

    /// Register a job-filtered handler and keep its token.
    pub fn attach(&mut self, name: EventName, handler: EventHandler) {
        let token = self.router.attach(self.job, name, handler);
        self.tokens.push(token);
    }

    /// Number of registrations held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the set holds no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether [`SubscriptionSet::release`] already ran.
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    /// Release every registration. Returns `false` if the set was already released.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.router.release_all(self.job, &self.tokens);
        true
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        if !self.released {
            warn!(job_id = %self.job, "subscription set dropped before settlement");
            let _ = self.release();
        }
    }
}

impl fmt::Debug for SubscriptionSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SubscriptionSet")
            .field("job", &self.job)
            .field("tokens", &self.tokens)
            .field("released", &self.released)
            .finish()
    }
}
