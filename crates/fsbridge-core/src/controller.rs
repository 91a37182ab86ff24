//! Transfer job controller.
//!
//! `start_*` validates options, allocates a handle, wires job-scoped
//! subscriptions, submits the normalized request and returns immediately
//! with the handle and an outcome future. A spawned driver waits for the
//! host result (or a cancellation), settles the job in the [`JobTable`] and
//! only then resolves the outcome.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fsbridge_config::TransferDefaults;
use fsbridge_events::{EventChannel, EventName, JobHandle, TransferEvent};
use fsbridge_telemetry::Metrics;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, BridgeResult, ExecutorResult};
use crate::jobs::JobIdAllocator;
use crate::model::{
    DownloadOptions, DownloadResult, TransferKind, UploadOptions, UploadResult,
};
use crate::router::{SubscriptionRouter, SubscriptionSet};
use crate::service::TransferExecutor;
use crate::table::{JobState, JobTable};
use crate::validate::{download_request, upload_request, validate_download, validate_upload};

/// Single-resolution result of a transfer job.
///
/// Resolves after the job's subscriptions were released.
#[must_use = "the outcome reports whether the transfer succeeded"]
pub struct JobOutcome<T> {
    job: JobHandle,
    receiver: oneshot::Receiver<BridgeResult<T>>,
}

impl<T> JobOutcome<T> {
    fn pending(job: JobHandle) -> (oneshot::Sender<BridgeResult<T>>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { job, receiver })
    }

    fn ready(job: JobHandle, result: BridgeResult<T>) -> Self {
        let (sender, outcome) = Self::pending(job);
        let _ = sender.send(result);
        outcome
    }

    /// Job this outcome belongs to.
    #[must_use]
    pub const fn job(&self) -> JobHandle {
        self.job
    }
}

impl<T> Future for JobOutcome<T> {
    type Output = BridgeResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let job = self.job;
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(BridgeError::OutcomeLost { job })))
    }
}

impl<T> fmt::Debug for JobOutcome<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("JobOutcome")
            .field("job", &self.job)
            .finish_non_exhaustive()
    }
}

/// A started transfer: its handle plus the outcome future.
#[derive(Debug)]
pub struct TransferJob<T> {
    /// Handle correlating events and control calls; `0` when no job started.
    pub handle: JobHandle,
    /// Resolves with the host result, or the failure that ended the job.
    pub outcome: JobOutcome<T>,
}

/// Started download.
pub type DownloadJob = TransferJob<DownloadResult>;
/// Started upload.
pub type UploadJob = TransferJob<UploadResult>;

/// Starts, tracks and controls transfer jobs against a host executor.
pub struct TransferController {
    executor: Arc<dyn TransferExecutor>,
    router: SubscriptionRouter,
    allocator: Arc<JobIdAllocator>,
    table: Arc<JobTable>,
    defaults: TransferDefaults,
}

impl TransferController {
    /// Controller using the process-wide allocator.
    #[must_use]
    pub fn new(
        executor: Arc<dyn TransferExecutor>,
        channel: Arc<dyn EventChannel>,
        defaults: TransferDefaults,
    ) -> Self {
        Self {
            executor,
            router: SubscriptionRouter::new(channel),
            allocator: JobIdAllocator::global(),
            table: Arc::new(JobTable::new()),
            defaults,
        }
    }

    /// Use a dedicated allocator instead of the process-wide one.
    #[must_use]
    pub fn with_allocator(mut self, allocator: Arc<JobIdAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Record job and event metrics.
    ///
    /// Call before starting any job; live jobs keep the table they started in.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.router = self.router.with_metrics(metrics.clone());
        self.table = Arc::new(JobTable::new().with_metrics(metrics));
        self
    }

    /// Start a download.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidArgument`] before a handle is allocated
    /// when `fromUrl` or `toFile` is empty, and
    /// [`BridgeError::RuntimeUnavailable`] outside a Tokio runtime.
    pub fn start_download(&self, options: DownloadOptions) -> BridgeResult<DownloadJob> {
        validate_download(&options)?;
        let runtime = runtime(TransferKind::Download)?;

        let handle = self.allocator.next_id();
        let mut subscriptions = self.router.subscriptions(handle);
        if let Some(begin) = options.begin.clone() {
            subscriptions.attach(
                EventName::DownloadBegin,
                Arc::new(move |event: &TransferEvent| {
                    if let TransferEvent::DownloadBegin(payload) = event {
                        begin(payload);
                    }
                }),
            );
        }
        if let Some(progress) = options.progress.clone() {
            subscriptions.attach(
                EventName::DownloadProgress,
                Arc::new(move |event: &TransferEvent| {
                    if let TransferEvent::DownloadProgress(payload) = event {
                        progress(payload);
                    }
                }),
            );
        }
        if let Some(resumable) = options.resumable.clone() {
            subscriptions.attach(
                EventName::DownloadResumable,
                Arc::new(move |event: &TransferEvent| {
                    if let TransferEvent::DownloadResumable(payload) = event {
                        resumable(payload);
                    }
                }),
            );
        }

        let request = download_request(handle, &options, &self.defaults);
        info!(
            job_id = %handle,
            from_url = %request.from_url,
            to_file = %request.to_file,
            subscriptions = subscriptions.len(),
            "download started"
        );
        let executor = Arc::clone(&self.executor);
        let outcome = self.drive(
            &runtime,
            handle,
            TransferKind::Download,
            subscriptions,
            async move { executor.submit_download(request).await },
        );
        Ok(TransferJob { handle, outcome })
    }

    /// Start an upload.
    ///
    /// Hosts without upload support yield a job with
    /// [`JobHandle::UNASSIGNED`] whose outcome rejects with
    /// [`BridgeError::UnsupportedOperation`]; no handle is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidArgument`] before a handle is allocated
    /// when `toUrl` is empty or a file lacks a path, and
    /// [`BridgeError::RuntimeUnavailable`] outside a Tokio runtime.
    pub fn start_upload(&self, options: UploadOptions) -> BridgeResult<UploadJob> {
        if !self.executor.supports_uploads() {
            warn!("upload requested on a host without upload support");
            return Ok(TransferJob {
                handle: JobHandle::UNASSIGNED,
                outcome: JobOutcome::ready(
                    JobHandle::UNASSIGNED,
                    Err(BridgeError::UnsupportedOperation {
                        operation: TransferKind::Upload.operation(),
                    }),
                ),
            });
        }
        validate_upload(&options)?;
        let runtime = runtime(TransferKind::Upload)?;

        let handle = self.allocator.next_id();
        let mut subscriptions = self.router.subscriptions(handle);
        if let Some(begin) = options.begin.clone() {
            subscriptions.attach(
                EventName::UploadBegin,
                Arc::new(move |event: &TransferEvent| {
                    if let TransferEvent::UploadBegin(payload) = event {
                        begin(payload);
                    }
                }),
            );
        }
        if let Some(progress) = options.progress.clone() {
            subscriptions.attach(
                EventName::UploadProgress,
                Arc::new(move |event: &TransferEvent| {
                    if let TransferEvent::UploadProgress(payload) = event {
                        progress(payload);
                    }
                }),
            );
        }

        let request = upload_request(handle, &options, &self.defaults);
        info!(
            job_id = %handle,
            to_url = %request.to_url,
            files = request.files.len(),
            method = %request.method,
            "upload started"
        );
        let executor = Arc::clone(&self.executor);
        let outcome = self.drive(
            &runtime,
            handle,
            TransferKind::Upload,
            subscriptions,
            async move { executor.submit_upload(request).await },
        );
        Ok(TransferJob { handle, outcome })
    }

    fn drive<T, F>(
        &self,
        runtime: &Handle,
        handle: JobHandle,
        kind: TransferKind,
        subscriptions: SubscriptionSet,
        submission: F,
    ) -> JobOutcome<T>
    where
        T: Send + 'static,
        F: Future<Output = ExecutorResult<T>> + Send + 'static,
    {
        let (cancel, cancelled) = oneshot::channel();
        let (resolve, outcome) = JobOutcome::pending(handle);
        self.table.register(handle, kind, subscriptions, cancel);
        let _ = self.table.mark_running(handle);

        let settlement = Settlement {
            table: Arc::clone(&self.table),
            handle,
            resolve: Some(resolve),
        };
        let _driver = runtime.spawn(async move {
            let finished = tokio::select! {
                result = submission => Some(result),
                _ = cancelled => None,
            };
            let result = match finished {
                None => Err(BridgeError::Cancelled { job: handle }),
                Some(result) => {
                    let state = if result.is_ok() {
                        JobState::Succeeded
                    } else {
                        JobState::Failed
                    };
                    if settlement.settle(state) {
                        result.map_err(|err| {
                            warn!(job_id = %handle, error = %err, "transfer failed");
                            BridgeError::from_executor(kind.operation(), err)
                        })
                    } else {
                        debug!(job_id = %handle, "late host result ignored");
                        Err(BridgeError::Cancelled { job: handle })
                    }
                }
            };
            settlement.resolve(result);
        });
        outcome
    }

    /// Ask the host to stop a download.
    ///
    /// # Errors
    ///
    /// Forwards host failures; unsupported hosts yield
    /// [`BridgeError::UnsupportedOperation`].
    pub async fn stop_download(&self, job: JobHandle) -> BridgeResult<()> {
        debug!(job_id = %job, "stop download requested");
        self.executor
            .stop_download(job)
            .await
            .map_err(|err| BridgeError::from_executor("stopDownload", err))
    }

    /// Ask the host to resume a paused download.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn resume_download(&self, job: JobHandle) -> BridgeResult<()> {
        debug!(job_id = %job, "resume download requested");
        self.executor
            .resume_download(job)
            .await
            .map_err(|err| BridgeError::from_executor("resumeDownload", err))
    }

    /// Whether the host can resume the download.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn is_resumable(&self, job: JobHandle) -> BridgeResult<bool> {
        self.executor
            .is_resumable(job)
            .await
            .map_err(|err| BridgeError::from_executor("isResumable", err))
    }

    /// Ask the host to stop an upload.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn stop_upload(&self, job: JobHandle) -> BridgeResult<()> {
        debug!(job_id = %job, "stop upload requested");
        self.executor
            .stop_upload(job)
            .await
            .map_err(|err| BridgeError::from_executor("stopUpload", err))
    }

    /// Invoke the host's background-session completion handler (iOS).
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn complete_handler_ios(&self, job: JobHandle) -> BridgeResult<()> {
        self.executor
            .complete_handler_ios(job)
            .await
            .map_err(|err| BridgeError::from_executor("completeHandlerIOS", err))
    }

    /// Cancel a live job: forward the stop request, then settle it as
    /// `Cancelled` so its outcome rejects with [`BridgeError::Cancelled`].
    ///
    /// Returns `false` when the job is unknown or already settled. A failed
    /// stop request is logged and does not prevent the settlement.
    pub async fn cancel_job(&self, job: JobHandle) -> bool {
        let Some(kind) = self.table.kind(job) else {
            return false;
        };
        let stopped = match kind {
            TransferKind::Download => self.stop_download(job).await,
            TransferKind::Upload => self.stop_upload(job).await,
        };
        if let Err(err) = stopped {
            warn!(job_id = %job, error = %err, "stop request failed during cancellation");
        }
        self.table.settle(job, JobState::Cancelled)
    }

    /// Lifecycle state of a live job; `None` once settled.
    #[must_use]
    pub fn job_state(&self, job: JobHandle) -> Option<JobState> {
        self.table.state(job)
    }

    /// Number of jobs that have not settled.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.table.len()
    }
}

impl fmt::Debug for TransferController {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TransferController")
            .field("router", &self.router)
            .field("table", &self.table)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Settlement owned by a job's driver task.
///
/// Dropping it unresolved (the submission panicked or the runtime shut down)
/// settles the job as `Failed` before the outcome rejects with
/// [`BridgeError::OutcomeLost`].
struct Settlement<T> {
    table: Arc<JobTable>,
    handle: JobHandle,
    resolve: Option<oneshot::Sender<BridgeResult<T>>>,
}

impl<T> Settlement<T> {
    fn settle(&self, state: JobState) -> bool {
        self.table.settle(self.handle, state)
    }

    fn resolve(mut self, result: BridgeResult<T>) {
        if let Some(resolve) = self.resolve.take() {
            let _ = resolve.send(result);
        }
    }
}

impl<T> Drop for Settlement<T> {
    fn drop(&mut self) {
        let Some(resolve) = self.resolve.take() else {
            return;
        };
        if self.settle(JobState::Failed) {
            warn!(job_id = %self.handle, "transfer driver ended without a host result");
        }
        let _ = resolve.send(Err(BridgeError::OutcomeLost { job: self.handle }));
    }
}

fn runtime(kind: TransferKind) -> BridgeResult<Handle> {
    Handle::try_current().map_err(|_| BridgeError::RuntimeUnavailable {
        operation: kind.operation(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutorError;
    use crate::model::{DownloadRequest, UploadFileItem, UploadRequest};
    use async_trait::async_trait;
    use fsbridge_events::EventHub;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        downloads: Mutex<Vec<DownloadRequest>>,
        uploads: Mutex<Vec<UploadRequest>>,
        fail: bool,
    }

    #[async_trait]
    impl TransferExecutor for Recorder {
        fn supports_uploads(&self) -> bool {
            true
        }

        async fn submit_download(
            &self,
            request: DownloadRequest,
        ) -> ExecutorResult<DownloadResult> {
            let job_id = request.job_id;
            self.downloads.lock().expect("lock").push(request);
            if self.fail {
                return Err(ExecutorError::coded(
                    "submit_download",
                    "EUNSPECIFIED",
                    std::io::Error::other("connection reset"),
                ));
            }
            Ok(DownloadResult {
                job_id,
                status_code: 200,
                bytes_written: 4,
            })
        }

        async fn submit_upload(&self, request: UploadRequest) -> ExecutorResult<UploadResult> {
            let job_id = request.job_id;
            self.uploads.lock().expect("lock").push(request);
            Ok(UploadResult {
                job_id,
                status_code: 201,
                headers: std::collections::BTreeMap::new(),
                body: "ok".into(),
            })
        }
    }

    fn controller(executor: Arc<Recorder>, hub: &EventHub) -> TransferController {
        TransferController::new(executor, Arc::new(hub.clone()), TransferDefaults::default())
            .with_allocator(Arc::new(JobIdAllocator::new()))
    }

    #[tokio::test]
    async fn download_resolves_and_releases_subscriptions() -> anyhow::Result<()> {
        let hub = EventHub::new();
        let executor = Arc::new(Recorder::default());
        let controller = controller(Arc::clone(&executor), &hub);

        let job = controller.start_download(
            DownloadOptions::new("https://x/y.bin", "file:///tmp/y.bin")
                .on_begin(|_| {})
                .on_progress(|_| {}),
        )?;
        assert_eq!(job.handle, JobHandle::new(1));
        let result = job.outcome.await?;
        assert_eq!(result.status_code, 200);
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(controller.active_jobs(), 0);

        let submitted = executor.downloads.lock().expect("lock").clone();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].to_file, "/tmp/y.bin");
        assert!(submitted[0].has_begin_callback);
        assert!(!submitted[0].has_resumable_callback);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_options_do_not_allocate() {
        let hub = EventHub::new();
        let allocator = Arc::new(JobIdAllocator::new());
        let controller = TransferController::new(
            Arc::new(Recorder::default()),
            Arc::new(hub.clone()),
            TransferDefaults::default(),
        )
        .with_allocator(Arc::clone(&allocator));

        let err = controller
            .start_download(DownloadOptions::new("", "/tmp/a"))
            .expect_err("missing fromUrl");
        assert_eq!(err.field(), Some("fromUrl"));
        assert_eq!(allocator.issued(), 0);
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn host_failures_reject_after_cleanup() {
        let hub = EventHub::new();
        let executor = Arc::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        let controller = controller(executor, &hub);

        let job = controller
            .start_download(DownloadOptions::new("https://x", "/tmp/a").on_progress(|_| {}))
            .expect("valid options");
        let err = job.outcome.await.expect_err("host failure");
        match err {
            BridgeError::Executor { operation, source } => {
                assert_eq!(operation, "downloadFile");
                assert_eq!(source.code(), Some("EUNSPECIFIED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(hub.listener_count(), 0);
    }

    #[tokio::test]
    async fn upload_uses_configured_method() -> anyhow::Result<()> {
        let hub = EventHub::new();
        let executor = Arc::new(Recorder::default());
        let controller = controller(Arc::clone(&executor), &hub);

        let job = controller.start_upload(UploadOptions::new(
            "https://x/u",
            vec![UploadFileItem::new("f", "a.txt", "file:///tmp/a.txt")],
        ))?;
        let result = job.outcome.await?;
        assert_eq!(result.body, "ok");
        let submitted = executor.uploads.lock().expect("lock").clone();
        assert_eq!(submitted[0].method, "POST");
        assert_eq!(submitted[0].files[0].filepath, "/tmp/a.txt");
        Ok(())
    }

    #[test]
    fn starting_outside_a_runtime_is_reported() {
        let hub = EventHub::new();
        let allocator = Arc::new(JobIdAllocator::new());
        let controller = controller(Arc::new(Recorder::default()), &hub)
            .with_allocator(Arc::clone(&allocator));
        let err = controller
            .start_download(DownloadOptions::new("https://x", "/tmp/a"))
            .expect_err("no runtime");
        assert!(matches!(err, BridgeError::RuntimeUnavailable { .. }));
        assert_eq!(allocator.issued(), 0);
    }

    struct Crashing;

    #[async_trait]
    impl TransferExecutor for Crashing {
        async fn submit_download(
            &self,
            _request: DownloadRequest,
        ) -> ExecutorResult<DownloadResult> {
            panic!("host adapter crashed");
        }
    }

    #[tokio::test]
    async fn crashed_submission_still_settles_the_job() {
        let hub = EventHub::new();
        let metrics = Metrics::new().expect("metrics");
        let controller = TransferController::new(
            Arc::new(Crashing),
            Arc::new(hub.clone()),
            TransferDefaults::default(),
        )
        .with_allocator(Arc::new(JobIdAllocator::new()))
        .with_metrics(metrics.clone());

        let job = controller
            .start_download(DownloadOptions::new("https://x", "/tmp/a").on_progress(|_| {}))
            .expect("valid options");
        let handle = job.handle;
        assert_eq!(hub.listener_count(), 1);

        let err = job.outcome.await.expect_err("crashed host");
        assert!(matches!(err, BridgeError::OutcomeLost { job } if job == handle));
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(controller.job_state(handle), None);
        assert_eq!(controller.active_jobs(), 0);
        assert_eq!(metrics.snapshot().active_transfers, 0);
    }
}
