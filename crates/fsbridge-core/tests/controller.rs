use std::sync::Arc;

use anyhow::{Result, anyhow};
use fsbridge_config::TransferDefaults;
use fsbridge_core::{BridgeError, DownloadOptions, JobIdAllocator, JobState, TransferController};
use fsbridge_events::{DownloadProgress, DownloadResumable, EventHub, JobHandle, TransferEvent};
use fsbridge_telemetry::Metrics;
use fsbridge_test_support::{
    EventLog, RecordingChannel, ScriptedExecutor, TransferScript, sample_download,
};
use serde_json::json;

fn controller(
    script: TransferScript,
) -> (TransferController, Arc<ScriptedExecutor>, RecordingChannel) {
    let hub = EventHub::new();
    let channel = RecordingChannel::new(hub.clone());
    let executor = Arc::new(ScriptedExecutor::new(hub, script));
    let controller = TransferController::new(
        Arc::clone(&executor) as _,
        Arc::new(channel.clone()),
        TransferDefaults::default(),
    )
    .with_allocator(Arc::new(JobIdAllocator::new()));
    (controller, executor, channel)
}

#[tokio::test]
async fn every_callback_gets_one_registration_released_once() -> Result<()> {
    let (controller, _executor, channel) = controller(TransferScript {
        emit_resumable: true,
        ..TransferScript::default()
    });
    let progress = EventLog::<DownloadProgress>::new();
    let resumable = EventLog::<DownloadResumable>::new();
    let job = controller.start_download(
        sample_download("r.bin")
            .on_begin(|_| {})
            .on_progress(progress.recorder())
            .on_resumable(resumable.recorder()),
    )?;
    assert_eq!(channel.added(), 3);
    assert_eq!(controller.job_state(job.handle), Some(JobState::Running));

    let _ = job.outcome.await?;
    assert_eq!(channel.removed(), 3);
    assert_eq!(channel.failed_removals(), 0);
    assert_eq!(channel.live(), 0);
    assert_eq!(progress.len(), 2);
    assert_eq!(
        resumable.entries(),
        vec![DownloadResumable {
            job_id: JobHandle::new(1)
        }]
    );
    assert_eq!(controller.active_jobs(), 0);
    Ok(())
}

#[tokio::test]
async fn listeners_for_other_jobs_are_not_invoked() -> Result<()> {
    let (controller, _executor, channel) = controller(TransferScript::default());
    let progress = EventLog::<DownloadProgress>::new();
    let job =
        controller.start_download(sample_download("a.bin").on_progress(progress.recorder()))?;

    let _ = channel.hub().emit(TransferEvent::DownloadProgress(DownloadProgress {
        job_id: JobHandle::new(99),
        content_length: 1,
        bytes_written: 1,
    }));
    let _ = job.outcome.await?;
    assert!(progress.entries().iter().all(|event| event.job_id == job.handle));
    assert_eq!(progress.len(), 2);
    Ok(())
}

#[tokio::test]
async fn late_result_after_cancel_is_ignored() -> Result<()> {
    let (controller, executor, channel) = controller(TransferScript {
        hold: true,
        ..TransferScript::default()
    });
    let metrics = Metrics::new()?;
    let controller = controller.with_metrics(metrics.clone());
    let job = controller.start_download(sample_download("late.bin").on_progress(|_| {}))?;
    tokio::task::yield_now().await;

    assert!(controller.cancel_job(job.handle).await);
    executor.release_held();
    let err = job
        .outcome
        .await
        .err()
        .ok_or_else(|| anyhow!("cancelled job must not succeed"))?;
    assert!(matches!(err, BridgeError::Cancelled { .. }));
    assert_eq!(channel.removed(), 1);
    assert_eq!(metrics.snapshot().active_transfers, 0);
    let rendered = metrics.render()?;
    assert!(rendered.contains(r#"outcome="cancelled""#));
    Ok(())
}

#[test]
fn loose_bags_reject_malformed_numbers() {
    let negative = DownloadOptions::from_json(&json!({
        "fromUrl": "https://x/y.bin",
        "toFile": "/tmp/y.bin",
        "readTimeout": -5,
    }));
    assert_eq!(negative.err().and_then(|err| err.field()), Some("readTimeout"));

    let wrong_type = DownloadOptions::from_json(&json!({
        "fromUrl": "https://x/y.bin",
        "toFile": "/tmp/y.bin",
        "background": "yes",
    }));
    assert_eq!(wrong_type.err().and_then(|err| err.field()), Some("background"));
}

#[tokio::test]
async fn tuning_values_fall_back_to_defaults() -> Result<()> {
    let (controller, executor, _channel) = controller(TransferScript::default());
    let options = DownloadOptions::from_json(&json!({
        "fromUrl": "https://x/y.bin",
        "toFile": "file:///tmp/y.bin",
        "readTimeout": 0,
        "connectionTimeout": 1200,
        "progressDivider": 10,
    }))?;
    let _ = controller.start_download(options)?.outcome.await?;

    let request = &executor.downloads()[0];
    let defaults = TransferDefaults::default();
    assert_eq!(request.to_file, "/tmp/y.bin");
    assert_eq!(request.read_timeout_ms, defaults.read_timeout_ms);
    assert_eq!(request.connection_timeout_ms, 1200);
    assert_eq!(request.progress_divider, 10);
    assert!(!request.has_progress_callback);
    Ok(())
}

#[test]
fn global_allocator_hands_out_increasing_handles() {
    let allocator = JobIdAllocator::global();
    let handles: Vec<JobHandle> = (0..16).map(|_| allocator.next_id()).collect();
    assert!(handles.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(handles.iter().all(|handle| handle.is_assigned()));
}
