//! Application-facing bridge over a filesystem host and a transfer executor.
//!
//! # Design
//! - Path arguments lose their `file://` prefix before reaching the host.
//! - Payloads are transcoded to the base64 wire form before a host call and
//!   back after it; a bad encoding selector fails before the host is touched.
//! - Optional host groups (assets, resources, photo library) are checked up
//!   front and reported as [`BridgeError::UnsupportedOperation`].
//! - Transfers are delegated to the [`TransferController`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fsbridge_config::BridgeConfig;
use fsbridge_core::model::host_time;
use fsbridge_core::{
    AssetImageCopy, BridgeError, BridgeResult, DownloadJob, DownloadOptions, Encoding,
    EncodingOrOptions, ExecutorResult, FileCopyOptions, FileSystemHost, FsInfo, HashAlgorithm,
    HostCapabilities, JobIdAllocator, JobState, MkdirOptions, PlatformConstants, ReadDirItem,
    ResolvedOptions, StatResult, TransferController, TransferExecutor, UploadJob, UploadOptions,
    normalize_file_path,
};
use fsbridge_events::{EventChannel, JobHandle};
use fsbridge_telemetry::Metrics;
use serde_json::Value;
use tracing::{debug, warn};

/// Filesystem and transfer bridge.
pub struct FsBridge {
    host: Arc<dyn FileSystemHost>,
    transfers: TransferController,
    default_encoding: Encoding,
    metrics: Option<Metrics>,
}

impl FsBridge {
    /// Bridge using `config` for transfer defaults and the default encoding.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidEncoding`] when the configured default
    /// encoding is not a known selector.
    pub fn new(
        host: Arc<dyn FileSystemHost>,
        executor: Arc<dyn TransferExecutor>,
        channel: Arc<dyn EventChannel>,
        config: &BridgeConfig,
    ) -> BridgeResult<Self> {
        let default_encoding = config
            .default_encoding
            .parse()
            .map_err(|err| BridgeError::from_codec("configure", err))?;
        Ok(Self {
            host,
            transfers: TransferController::new(executor, channel, config.transfers.clone()),
            default_encoding,
            metrics: None,
        })
    }

    /// Use a dedicated job handle allocator.
    #[must_use]
    pub fn with_allocator(mut self, allocator: Arc<JobIdAllocator>) -> Self {
        self.transfers = self.transfers.with_allocator(allocator);
        self
    }

    /// Record call, job and event metrics. Call before starting transfers.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.transfers = self.transfers.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    /// Encoding applied when a call does not name one.
    #[must_use]
    pub const fn default_encoding(&self) -> Encoding {
        self.default_encoding
    }

    /// Transfer controller backing the job operations.
    #[must_use]
    pub const fn transfers(&self) -> &TransferController {
        &self.transfers
    }

    /// Optional capabilities exposed by the host.
    #[must_use]
    pub fn capabilities(&self) -> HostCapabilities {
        self.host.capabilities()
    }

    /// Standard directories and platform markers.
    #[must_use]
    pub fn constants(&self) -> PlatformConstants {
        self.host.constants()
    }

    /// Create a directory and its parents.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn mkdir(&self, path: &str, options: &MkdirOptions) -> BridgeResult<()> {
        let path = normalize_file_path(path);
        self.call("mkdir", self.host.mkdir(path, options)).await
    }

    /// Move a file.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn move_file(
        &self,
        from: &str,
        to: &str,
        options: &FileCopyOptions,
    ) -> BridgeResult<()> {
        let (from, to) = (normalize_file_path(from), normalize_file_path(to));
        self.call("moveFile", self.host.move_file(from, to, options)).await
    }

    /// Copy a file.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn copy_file(
        &self,
        from: &str,
        to: &str,
        options: &FileCopyOptions,
    ) -> BridgeResult<()> {
        let (from, to) = (normalize_file_path(from), normalize_file_path(to));
        self.call("copyFile", self.host.copy_file(from, to, options)).await
    }

    /// Remove a file or a directory tree.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn unlink(&self, path: &str) -> BridgeResult<()> {
        let path = normalize_file_path(path);
        self.call("unlink", self.host.unlink(path)).await
    }

    /// Whether a file or directory exists.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn exists(&self, path: &str) -> BridgeResult<bool> {
        let path = normalize_file_path(path);
        self.call("exists", self.host.exists(path)).await
    }

    /// Read a whole file, decoded with the selected encoding.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidEncoding`] before the host call for an
    /// unknown selector; forwards host and decoding failures.
    pub async fn read_file(
        &self,
        path: &str,
        options: Option<&EncodingOrOptions>,
    ) -> BridgeResult<String> {
        let resolved = self.resolve("readFile", options)?;
        let path = normalize_file_path(path);
        let wire = self.call("readFile", self.host.read_file(path)).await?;
        decode("readFile", resolved.encoding, &wire)
    }

    /// Read `length` bytes from `position`. Both default to 0; a zero length
    /// reads to the end of the file.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_file`].
    pub async fn read(
        &self,
        path: &str,
        length: Option<u64>,
        position: Option<u64>,
        options: Option<&EncodingOrOptions>,
    ) -> BridgeResult<String> {
        let resolved = self.resolve("read", options)?;
        let path = normalize_file_path(path);
        let (length, position) = (length.unwrap_or(0), position.unwrap_or(0));
        let wire = self.call("read", self.host.read(path, length, position)).await?;
        decode("read", resolved.encoding, &wire)
    }

    /// Replace a file's contents. Extra options are forwarded to the host.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidEncoding`] or
    /// [`BridgeError::MalformedPayload`] before the host call; forwards host
    /// failures.
    pub async fn write_file(
        &self,
        path: &str,
        contents: &str,
        options: Option<&EncodingOrOptions>,
    ) -> BridgeResult<()> {
        let resolved = self.resolve("writeFile", options)?;
        let wire = encode("writeFile", resolved.encoding, contents)?;
        let path = normalize_file_path(path);
        let host_options = resolved.to_host_map();
        self.call("writeFile", self.host.write_file(path, &wire, &host_options)).await
    }

    /// Append to a file, creating it when missing.
    ///
    /// # Errors
    ///
    /// Same as [`Self::write_file`].
    pub async fn append_file(
        &self,
        path: &str,
        contents: &str,
        options: Option<&EncodingOrOptions>,
    ) -> BridgeResult<()> {
        let resolved = self.resolve("appendFile", options)?;
        let wire = encode("appendFile", resolved.encoding, contents)?;
        let path = normalize_file_path(path);
        self.call("appendFile", self.host.append_file(path, &wire)).await
    }

    /// Write at `position`, or append when no position is given.
    ///
    /// # Errors
    ///
    /// Same as [`Self::write_file`].
    pub async fn write(
        &self,
        path: &str,
        contents: &str,
        position: Option<u64>,
        options: Option<&EncodingOrOptions>,
    ) -> BridgeResult<()> {
        let resolved = self.resolve("write", options)?;
        let wire = encode("write", resolved.encoding, contents)?;
        let path = normalize_file_path(path);
        self.call("write", self.host.write(path, &wire, position)).await
    }

    /// File metadata. `path` is echoed back as given.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn stat(&self, path: &str) -> BridgeResult<StatResult> {
        let stat = self.call("stat", self.host.stat(normalize_file_path(path))).await?;
        Ok(StatResult {
            path: path.to_string(),
            ctime: host_time(stat.ctime),
            mtime: host_time(stat.mtime),
            size: stat.size,
            mode: stat.mode,
            original_filepath: stat.original_filepath,
            kind: stat.kind,
        })
    }

    /// Directory entries with metadata.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn read_dir(&self, path: &str) -> BridgeResult<Vec<ReadDirItem>> {
        let path = normalize_file_path(path);
        let entries = self.call("readDir", self.host.read_dir(path)).await?;
        Ok(entries.into_iter().map(ReadDirItem::from).collect())
    }

    /// Directory entry names only.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn readdir(&self, path: &str) -> BridgeResult<Vec<String>> {
        let path = normalize_file_path(path);
        let entries = self.call("readdir", self.host.read_dir(path)).await?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// Hex digest of a file.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn hash(&self, path: &str, algorithm: HashAlgorithm) -> BridgeResult<String> {
        let path = normalize_file_path(path);
        self.call("hash", self.host.hash(path, algorithm)).await
    }

    /// Set modification and creation times. Omitted times are left to the
    /// host.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn touch(
        &self,
        path: &str,
        mtime: Option<DateTime<Utc>>,
        ctime: Option<DateTime<Utc>>,
    ) -> BridgeResult<()> {
        let path = normalize_file_path(path);
        self.call("touch", self.host.touch(path, mtime, ctime)).await
    }

    /// Change a file's readable flag (Android).
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn set_readable(
        &self,
        path: &str,
        readable: bool,
        owner_only: bool,
    ) -> BridgeResult<bool> {
        let path = normalize_file_path(path);
        self.call("setReadable", self.host.set_readable(path, readable, owner_only)).await
    }

    /// Ask the media scanner to index a file (Android).
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn scan_file(&self, path: &str) -> BridgeResult<Vec<String>> {
        let path = normalize_file_path(path);
        self.call("scanFile", self.host.scan_file(path)).await
    }

    /// Total and free space of the data volume.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn get_fs_info(&self) -> BridgeResult<FsInfo> {
        self.call("getFSInfo", self.host.get_fs_info()).await
    }

    /// App-specific directories on every external volume (Android).
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn get_all_external_files_dirs(&self) -> BridgeResult<Vec<String>> {
        self.call("getAllExternalFilesDirs", self.host.get_all_external_files_dirs()).await
    }

    /// Path of a named resource bundle (iOS).
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn path_for_bundle(&self, name: &str) -> BridgeResult<String> {
        self.call("pathForBundle", self.host.path_for_bundle(name)).await
    }

    /// Container path of an app group (iOS).
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn path_for_group(&self, name: &str) -> BridgeResult<String> {
        self.call("pathForGroup", self.host.path_for_group(name)).await
    }

    /// Entries of a bundled asset directory.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without assets.
    pub async fn read_dir_assets(&self, path: &str) -> BridgeResult<Vec<ReadDirItem>> {
        self.require("readDirAssets", self.capabilities().assets)?;
        let path = normalize_file_path(path);
        let entries = self.call("readDirAssets", self.host.read_dir_assets(path)).await?;
        Ok(entries.into_iter().map(ReadDirItem::from).collect())
    }

    /// Whether a bundled asset exists.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without assets.
    pub async fn exists_assets(&self, path: &str) -> BridgeResult<bool> {
        self.require("existsAssets", self.capabilities().assets)?;
        let path = normalize_file_path(path);
        self.call("existsAssets", self.host.exists_assets(path)).await
    }

    /// Whether a raw resource exists.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without
    /// resources.
    pub async fn exists_res(&self, name: &str) -> BridgeResult<bool> {
        self.require("existsRes", self.capabilities().resources)?;
        self.call("existsRes", self.host.exists_res(name)).await
    }

    /// Read a bundled asset, decoded with the selected encoding.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without assets
    /// and [`BridgeError::InvalidEncoding`] for an unknown selector.
    pub async fn read_file_assets(
        &self,
        path: &str,
        options: Option<&EncodingOrOptions>,
    ) -> BridgeResult<String> {
        self.require("readFileAssets", self.capabilities().assets)?;
        let resolved = self.resolve("readFileAssets", options)?;
        let path = normalize_file_path(path);
        let wire = self.call("readFileAssets", self.host.read_file_assets(path)).await?;
        decode("readFileAssets", resolved.encoding, &wire)
    }

    /// Read a raw resource, decoded with the selected encoding.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without
    /// resources and [`BridgeError::InvalidEncoding`] for an unknown selector.
    pub async fn read_file_res(
        &self,
        name: &str,
        options: Option<&EncodingOrOptions>,
    ) -> BridgeResult<String> {
        self.require("readFileRes", self.capabilities().resources)?;
        let resolved = self.resolve("readFileRes", options)?;
        let name = normalize_file_path(name);
        let wire = self.call("readFileRes", self.host.read_file_res(name)).await?;
        decode("readFileRes", resolved.encoding, &wire)
    }

    /// Copy a bundled asset to the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without assets.
    pub async fn copy_file_assets(&self, from: &str, to: &str) -> BridgeResult<()> {
        self.require("copyFileAssets", self.capabilities().assets)?;
        let from = normalize_file_path(from);
        let to = normalize_file_path(to);
        self.call("copyFileAssets", self.host.copy_file_assets(from, to)).await
    }

    /// Copy a raw resource to the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without
    /// resources.
    pub async fn copy_file_res(&self, name: &str, to: &str) -> BridgeResult<()> {
        self.require("copyFileRes", self.capabilities().resources)?;
        let to = normalize_file_path(to);
        self.call("copyFileRes", self.host.copy_file_res(name, to)).await
    }

    /// Export a photo-library image; returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without a photo
    /// library.
    pub async fn copy_assets_file_ios(&self, request: &AssetImageCopy) -> BridgeResult<String> {
        self.require("copyAssetsFileIOS", self.capabilities().photo_library)?;
        let request = AssetImageCopy {
            dest_path: normalize_file_path(&request.dest_path).to_string(),
            ..request.clone()
        };
        self.call("copyAssetsFileIOS", self.host.copy_assets_file_ios(&request)).await
    }

    /// Export a photo-library video; returns the written path.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] on hosts without a photo
    /// library.
    pub async fn copy_assets_video_ios(
        &self,
        image_uri: &str,
        dest_path: &str,
    ) -> BridgeResult<String> {
        self.require("copyAssetsVideoIOS", self.capabilities().photo_library)?;
        let dest_path = normalize_file_path(dest_path);
        self.call("copyAssetsVideoIOS", self.host.copy_assets_video_ios(image_uri, dest_path)).await
    }

    /// Start a download. See [`TransferController::start_download`].
    ///
    /// # Errors
    ///
    /// Returns validation errors before a handle is allocated.
    pub fn download_file(&self, options: DownloadOptions) -> BridgeResult<DownloadJob> {
        self.transfers.start_download(options)
    }

    /// Start a download from a loose JSON options bag.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidArgument`] naming the first bad field.
    pub fn download_file_json(&self, options: &Value) -> BridgeResult<DownloadJob> {
        self.download_file(DownloadOptions::from_json(options)?)
    }

    /// Start an upload. See [`TransferController::start_upload`].
    ///
    /// # Errors
    ///
    /// Returns validation errors before a handle is allocated.
    pub fn upload_files(&self, options: UploadOptions) -> BridgeResult<UploadJob> {
        self.transfers.start_upload(options)
    }

    /// Start an upload from a loose JSON options bag.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidArgument`] naming the first bad field.
    pub fn upload_files_json(&self, options: &Value) -> BridgeResult<UploadJob> {
        self.upload_files(UploadOptions::from_json(options)?)
    }

    /// Ask the host to stop a download.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn stop_download(&self, job: JobHandle) -> BridgeResult<()> {
        self.transfers.stop_download(job).await
    }

    /// Ask the host to resume a paused download.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn resume_download(&self, job: JobHandle) -> BridgeResult<()> {
        self.transfers.resume_download(job).await
    }

    /// Whether the host can resume the download.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn is_resumable(&self, job: JobHandle) -> BridgeResult<bool> {
        self.transfers.is_resumable(job).await
    }

    /// Ask the host to stop an upload.
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn stop_upload(&self, job: JobHandle) -> BridgeResult<()> {
        self.transfers.stop_upload(job).await
    }

    /// Invoke the background-session completion handler (iOS).
    ///
    /// # Errors
    ///
    /// Forwards host failures.
    pub async fn complete_handler_ios(&self, job: JobHandle) -> BridgeResult<()> {
        self.transfers.complete_handler_ios(job).await
    }

    /// Cancel a live transfer. Returns `false` when it already settled.
    pub async fn cancel_job(&self, job: JobHandle) -> bool {
        self.transfers.cancel_job(job).await
    }

    /// Lifecycle state of a live transfer.
    #[must_use]
    pub fn job_state(&self, job: JobHandle) -> Option<JobState> {
        self.transfers.job_state(job)
    }

    fn resolve(
        &self,
        operation: &'static str,
        options: Option<&EncodingOrOptions>,
    ) -> BridgeResult<ResolvedOptions> {
        ResolvedOptions::from_caller(options, self.default_encoding).map_err(|err| {
            self.record(operation, false);
            BridgeError::from_codec(operation, err)
        })
    }

    fn require(&self, operation: &'static str, enabled: bool) -> BridgeResult<()> {
        if enabled {
            return Ok(());
        }
        self.record(operation, false);
        debug!(operation, "host capability missing");
        Err(BridgeError::UnsupportedOperation { operation })
    }

    async fn call<T, F>(&self, operation: &'static str, call: F) -> BridgeResult<T>
    where
        F: Future<Output = ExecutorResult<T>>,
    {
        match call.await {
            Ok(value) => {
                self.record(operation, true);
                Ok(value)
            }
            Err(err) => {
                self.record(operation, false);
                warn!(operation, error = %err, code = ?err.code(), "host call failed");
                Err(BridgeError::from_executor(operation, err))
            }
        }
    }

    fn record(&self, operation: &'static str, ok: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_bridge_call(operation, if ok { "ok" } else { "error" });
        }
    }
}

fn encode(operation: &'static str, encoding: Encoding, contents: &str) -> BridgeResult<String> {
    encoding
        .encode(contents)
        .map_err(|err| BridgeError::from_codec(operation, err))
}

fn decode(operation: &'static str, encoding: Encoding, wire: &str) -> BridgeResult<String> {
    encoding
        .decode(wire)
        .map_err(|err| BridgeError::from_codec(operation, err))
}

impl fmt::Debug for FsBridge {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FsBridge")
            .field("transfers", &self.transfers)
            .field("default_encoding", &self.default_encoding)
            .field("capabilities", &self.host.capabilities())
            .finish_non_exhaustive()
    }
}
