//! Live transfer jobs and their lifecycle state.
//!
//! `Created -> Running -> {Succeeded | Failed | Cancelled}`. Settling a job
//! removes it from the table, releases its subscriptions and records the
//! outcome; a second settlement for the same handle is a no-op.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

use fsbridge_events::JobHandle;
use fsbridge_telemetry::Metrics;
use tokio::sync::oneshot;
use tracing::{info, trace};

use crate::model::TransferKind;
use crate::router::SubscriptionSet;

/// Lifecycle state of a transfer job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Handle allocated, request not yet submitted.
    Created,
    /// Submitted to the host.
    Running,
    /// Host reported success.
    Succeeded,
    /// Host reported failure.
    Failed,
    /// Cancelled by the caller before the host finished.
    Cancelled,
}

impl JobState {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    /// Metric/log label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for JobState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

struct JobEntry {
    kind: TransferKind,
    state: JobState,
    subscriptions: SubscriptionSet,
    cancel: Option<oneshot::Sender<()>>,
}

/// Registry of jobs that have not settled yet.
#[derive(Default)]
pub struct JobTable {
    jobs: Mutex<HashMap<JobHandle, JobEntry>>,
    metrics: Option<Metrics>,
}

impl JobTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record job lifecycle counters in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Track a new job in `Created`. `cancel` fires when the job is cancelled.
    pub fn register(
        &self,
        handle: JobHandle,
        kind: TransferKind,
        subscriptions: SubscriptionSet,
        cancel: oneshot::Sender<()>,
    ) {
        let entry = JobEntry {
            kind,
            state: JobState::Created,
            subscriptions,
            cancel: Some(cancel),
        };
        let previous = self.lock().insert(handle, entry);
        debug_assert!(previous.is_none(), "job handle {handle} registered twice");
        if let Some(metrics) = &self.metrics {
            metrics.inc_transfer_started(kind.as_str());
        }
        trace!(job_id = %handle, kind = kind.as_str(), "job registered");
    }

    /// Move a `Created` job to `Running`. Returns `false` for unknown or
    /// already running jobs.
    pub fn mark_running(&self, handle: JobHandle) -> bool {
        let mut jobs = self.lock();
        match jobs.get_mut(&handle) {
            Some(entry) if entry.state == JobState::Created => {
                entry.state = JobState::Running;
                true
            }
            _ => false,
        }
    }

    /// Settle a job in a terminal `state`.
    ///
    /// Returns `true` only for the first settlement of a live job; the job's
    /// subscriptions are released before this returns. Cancelling also fires
    /// the job's cancel signal.
    pub fn settle(&self, handle: JobHandle, state: JobState) -> bool {
        if !state.is_terminal() {
            return false;
        }
        let Some(mut entry) = self.lock().remove(&handle) else {
            trace!(job_id = %handle, state = %state, "duplicate settlement ignored");
            return false;
        };

        let _ = entry.subscriptions.release();
        if state == JobState::Cancelled
            && let Some(cancel) = entry.cancel.take()
        {
            let _ = cancel.send(());
        }
        if let Some(metrics) = &self.metrics {
            metrics.inc_transfer_settled(entry.kind.as_str(), state.as_str());
        }
        info!(
            job_id = %handle,
            kind = entry.kind.as_str(),
            from = %entry.state,
            state = %state,
            "transfer settled"
        );
        true
    }

    /// Current state of a live job.
    #[must_use]
    pub fn state(&self, handle: JobHandle) -> Option<JobState> {
        self.lock().get(&handle).map(|entry| entry.state)
    }

    /// Kind of a live job.
    #[must_use]
    pub fn kind(&self, handle: JobHandle) -> Option<TransferKind> {
        self.lock().get(&handle).map(|entry| entry.kind)
    }

    /// Number of live jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no job is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobHandle, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for JobTable {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JobTable")
            .field("live", &self.len())
            .finish_non_exhaustive()
    }
}
