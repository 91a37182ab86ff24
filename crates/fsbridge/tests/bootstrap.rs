use std::fs;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use fsbridge::{BootstrapError, Encoding, bootstrap};
use fsbridge_config::ConfigLoader;
use fsbridge_core::TransferExecutor;
use fsbridge_events::EventHub;
use fsbridge_test_support::{MemoryFileSystem, ScriptedExecutor, TransferScript, sample_download};

fn scripted(hub: &EventHub) -> Arc<dyn TransferExecutor> {
    Arc::new(ScriptedExecutor::new(hub.clone(), TransferScript::default()))
}

#[tokio::test]
async fn bootstrap_wires_config_into_the_bridge() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fsbridge.json");
    fs::write(
        &path,
        r#"{ "default_encoding": "base64", "transfers": { "read_timeout_ms": 2500 } }"#,
    )?;
    let loader = ConfigLoader::new()
        .with_file(&path)
        .with_vars([("FSBRIDGE_CONNECTION_TIMEOUT_MS", "1200")]);

    let runtime = bootstrap(&loader, Arc::new(MemoryFileSystem::default()), scripted)?;
    assert_eq!(runtime.config().transfers.connection_timeout_ms, 1_200);
    assert_eq!(runtime.config().transfers.read_timeout_ms, 2_500);
    assert_eq!(runtime.bridge().default_encoding(), Encoding::Base64);

    let bridge = runtime.bridge();
    bridge.write_file("/b.txt", "aGk=", None).await?;
    assert_eq!(bridge.read_file("/b.txt", Some(&"utf8".into())).await?, "hi");

    let job = bridge.download_file(sample_download("c.bin").on_progress(|_| {}))?;
    let _ = job.outcome.await?;
    let snapshot = runtime.metrics().snapshot();
    assert_eq!(snapshot.active_transfers, 0);
    assert_eq!(runtime.events().listener_count(), 0);
    Ok(())
}

#[test]
fn invalid_configuration_is_reported() -> Result<()> {
    let loader = ConfigLoader::new().with_vars([("FSBRIDGE_DEFAULT_ENCODING", "latin1")]);
    let err = bootstrap(&loader, Arc::new(MemoryFileSystem::default()), scripted)
        .err()
        .ok_or_else(|| anyhow!("latin1 should be rejected"))?;
    assert!(matches!(err, BootstrapError::Config { operation: "config_loader.load", .. }));
    Ok(())
}
