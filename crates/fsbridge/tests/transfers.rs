use std::sync::Arc;

use anyhow::{Result, anyhow};
use fsbridge::{BridgeError, FsBridge};
use fsbridge_config::BridgeConfig;
use fsbridge_core::{DownloadOptions, JobIdAllocator, JobState, UploadFileItem, UploadOptions};
use fsbridge_events::{DownloadBegin, DownloadProgress, EventHub, JobHandle, UploadProgress};
use fsbridge_test_support::{
    ControlCall, EventLog, MemoryFileSystem, RecordingChannel, ScriptedExecutor, TransferScript,
    sample_download, sample_upload,
};
use serde_json::json;

struct Harness {
    bridge: FsBridge,
    executor: Arc<ScriptedExecutor>,
    channel: RecordingChannel,
    allocator: Arc<JobIdAllocator>,
}

fn harness(script: TransferScript) -> Result<Harness> {
    let hub = EventHub::new();
    let channel = RecordingChannel::new(hub.clone());
    let executor = Arc::new(ScriptedExecutor::new(hub, script));
    let allocator = Arc::new(JobIdAllocator::new());
    let bridge = FsBridge::new(
        Arc::new(MemoryFileSystem::default()),
        Arc::clone(&executor) as _,
        Arc::new(channel.clone()),
        &BridgeConfig::default(),
    )?
    .with_allocator(Arc::clone(&allocator));
    Ok(Harness {
        bridge,
        executor,
        channel,
        allocator,
    })
}

#[tokio::test]
async fn first_download_gets_handle_one_and_sees_its_progress() -> Result<()> {
    let h = harness(TransferScript {
        content_length: 100,
        progress: vec![50],
        ..TransferScript::default()
    })?;
    let progress = EventLog::<DownloadProgress>::new();

    let job = h.bridge.download_file(
        DownloadOptions::new("https://x/y.bin", "/tmp/y.bin").on_progress(progress.recorder()),
    )?;
    assert_eq!(job.handle, JobHandle::new(1));

    let result = job.outcome.await?;
    assert_eq!(result.job_id, JobHandle::new(1));
    assert_eq!(result.bytes_written, 100);
    assert_eq!(
        progress.entries(),
        vec![DownloadProgress {
            job_id: JobHandle::new(1),
            content_length: 100,
            bytes_written: 50,
        }]
    );
    assert_eq!(h.channel.live(), 0);
    Ok(())
}

#[tokio::test]
async fn request_carries_normalized_paths_and_callback_flags() -> Result<()> {
    let h = harness(TransferScript::default())?;
    let begins = EventLog::<DownloadBegin>::new();
    let job = h.bridge.download_file(
        sample_download("a.bin")
            .header("Authorization", "Bearer t")
            .on_begin(begins.recorder()),
    )?;
    let _ = job.outcome.await?;

    let requests = h.executor.downloads();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.to_file, "/data/documents/a.bin");
    assert!(request.has_begin_callback);
    assert!(!request.has_progress_callback);
    assert!(!request.has_resumable_callback);
    assert_eq!(request.read_timeout_ms, 15_000);
    assert_eq!(
        request.headers.get("Authorization").map(String::as_str),
        Some("Bearer t")
    );
    assert_eq!(begins.len(), 1);
    Ok(())
}

#[tokio::test]
async fn concurrent_downloads_only_see_their_own_events() -> Result<()> {
    let h = harness(TransferScript {
        content_length: 4,
        progress: vec![1, 2, 3, 4],
        ..TransferScript::default()
    })?;
    let first_log = EventLog::<DownloadProgress>::new();
    let second_log = EventLog::<DownloadProgress>::new();

    let first = h
        .bridge
        .download_file(sample_download("one.bin").on_progress(first_log.recorder()))?;
    let second = h
        .bridge
        .download_file(sample_download("two.bin").on_progress(second_log.recorder()))?;
    assert_ne!(first.handle, second.handle);

    let (first_result, second_result) = tokio::join!(first.outcome, second.outcome);
    let _ = (first_result?, second_result?);

    for (log, handle) in [(&first_log, first.handle), (&second_log, second.handle)] {
        let entries = log.entries();
        assert!(entries.iter().all(|event| event.job_id == handle));
        let written: Vec<u64> = entries.iter().map(|event| event.bytes_written).collect();
        assert_eq!(written, vec![1, 2, 3, 4]);
    }
    Ok(())
}

#[tokio::test]
async fn missing_from_url_fails_before_allocation() -> Result<()> {
    let h = harness(TransferScript::default())?;

    let typed = h.bridge.download_file(DownloadOptions::new("", "/tmp/y.bin"));
    assert!(matches!(
        typed,
        Err(BridgeError::InvalidArgument {
            field: "fromUrl",
            ..
        })
    ));
    let loose = h.bridge.download_file_json(&json!({ "toFile": "/tmp/y.bin" }));
    assert_eq!(loose.err().and_then(|err| err.field()), Some("fromUrl"));

    assert_eq!(h.allocator.issued(), 0);
    assert_eq!(h.channel.added(), 0);
    assert!(h.executor.downloads().is_empty());
    Ok(())
}

#[tokio::test]
async fn subscriptions_are_released_once_on_failure() -> Result<()> {
    let h = harness(TransferScript {
        failure: Some("connection reset".to_string()),
        ..TransferScript::default()
    })?;
    let progress = EventLog::<DownloadProgress>::new();
    let job = h
        .bridge
        .download_file(sample_download("f.bin").on_progress(progress.recorder()))?;
    assert_eq!(h.channel.added(), 1);

    let err = job
        .outcome
        .await
        .err()
        .ok_or_else(|| anyhow!("download should fail"))?;
    assert!(matches!(
        err,
        BridgeError::Executor {
            operation: "downloadFile",
            ..
        }
    ));
    assert_eq!(h.channel.removed(), 1);
    assert_eq!(h.channel.failed_removals(), 0);
    assert_eq!(h.bridge.job_state(job.handle), None);
    assert!(!h.bridge.cancel_job(job.handle).await);
    assert_eq!(h.channel.removed(), 1);
    Ok(())
}

#[tokio::test]
async fn cancelling_a_held_download_rejects_its_outcome() -> Result<()> {
    let h = harness(TransferScript {
        hold: true,
        ..TransferScript::default()
    })?;
    let job = h.bridge.download_file(
        sample_download("held.bin").on_progress(|_: &DownloadProgress| {}),
    )?;
    tokio::task::yield_now().await;
    assert_eq!(h.bridge.job_state(job.handle), Some(JobState::Running));

    assert!(h.bridge.cancel_job(job.handle).await);
    assert!(!h.bridge.cancel_job(job.handle).await);
    let outcome = job.outcome.await;
    assert!(matches!(outcome, Err(BridgeError::Cancelled { job }) if job == JobHandle::new(1)));
    assert_eq!(h.executor.controls(), vec![ControlCall::StopDownload(JobHandle::new(1))]);
    assert_eq!(h.channel.live(), 0);

    h.executor.release_held();
    Ok(())
}

#[tokio::test]
async fn upload_defaults_to_post_and_routes_progress() -> Result<()> {
    let h = harness(TransferScript::default())?;
    let progress = EventLog::<UploadProgress>::new();
    let job = h.bridge.upload_files(
        UploadOptions::new(
            "https://example.test/upload",
            vec![UploadFileItem::new("file", "a.bin", "file:///tmp/a.bin")],
        )
        .field("album", "holiday")
        .on_progress(progress.recorder()),
    )?;
    let result = job.outcome.await?;
    assert_eq!(result.status_code, 200);

    let requests = h.executor.uploads();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].files[0].filepath, "/tmp/a.bin");
    assert!(requests[0].has_progress_callback);
    assert!(!requests[0].has_begin_callback);
    assert_eq!(progress.len(), 2);
    Ok(())
}

#[tokio::test]
async fn upload_on_host_without_support_gets_unassigned_handle() -> Result<()> {
    let h = harness(TransferScript {
        uploads: false,
        ..TransferScript::default()
    })?;
    let job = h.bridge.upload_files(sample_upload("/tmp/a.bin"))?;
    assert_eq!(job.handle, JobHandle::UNASSIGNED);
    assert!(matches!(
        job.outcome.await,
        Err(BridgeError::UnsupportedOperation {
            operation: "uploadFiles"
        })
    ));
    assert_eq!(h.allocator.issued(), 0);
    assert!(h.executor.uploads().is_empty());
    Ok(())
}

#[tokio::test]
async fn loose_upload_bag_is_validated_field_by_field() -> Result<()> {
    let h = harness(TransferScript::default())?;
    let bad = h.bridge.upload_files_json(&json!({
        "toUrl": "https://example.test/upload",
        "files": "not-a-list",
    }));
    assert_eq!(bad.err().and_then(|err| err.field()), Some("files"));

    let job = h.bridge.upload_files_json(&json!({
        "toUrl": "https://example.test/upload",
        "files": [{ "name": "f", "filename": "a.bin", "filepath": "/tmp/a.bin" }],
        "method": "PUT",
    }))?;
    let _ = job.outcome.await?;
    assert_eq!(h.executor.uploads()[0].method, "PUT");
    Ok(())
}

#[tokio::test]
async fn control_calls_reach_the_executor() -> Result<()> {
    let h = harness(TransferScript {
        emit_resumable: true,
        ..TransferScript::default()
    })?;
    let job = JobHandle::new(7);
    h.bridge.resume_download(job).await?;
    assert!(h.bridge.is_resumable(job).await?);
    h.bridge.stop_upload(job).await?;
    h.bridge.complete_handler_ios(job).await?;
    assert_eq!(
        h.executor.controls(),
        vec![
            ControlCall::ResumeDownload(job),
            ControlCall::IsResumable(job),
            ControlCall::StopUpload(job),
            ControlCall::CompleteHandler(job),
        ]
    );
    Ok(())
}
