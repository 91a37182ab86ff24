//! Host traits implemented by platform adapters.
//!
//! Payloads cross this boundary as base64 wire text and paths arrive already
//! normalized. Optional operations default to
//! [`ExecutorError::Unsupported`], mirroring hosts that simply do not expose
//! them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fsbridge_events::JobHandle;
use serde_json::{Map, Value};

use crate::error::{ExecutorError, ExecutorResult};
use crate::model::{
    AssetImageCopy, DownloadRequest, DownloadResult, FileCopyOptions, FsInfo, HashAlgorithm,
    HostDirEntry, HostStat, MkdirOptions, PlatformConstants, UploadRequest, UploadResult,
};

fn unsupported<T>(operation: &'static str) -> ExecutorResult<T> {
    Err(ExecutorError::Unsupported { operation })
}

/// Performs network transfers and reports lifecycle events on the shared channel.
///
/// Implementations must emit every event for a job before the submit future
/// resolves.
#[async_trait]
pub trait TransferExecutor: Send + Sync {
    /// Whether the host can upload at all. Hosts implementing
    /// [`TransferExecutor::submit_upload`] return `true`.
    fn supports_uploads(&self) -> bool {
        false
    }

    /// Run a download to completion.
    async fn submit_download(&self, request: DownloadRequest) -> ExecutorResult<DownloadResult>;

    /// Run an upload to completion; default implementation reports lack of support.
    async fn submit_upload(&self, request: UploadRequest) -> ExecutorResult<UploadResult> {
        let _ = request;
        unsupported("submit_upload")
    }

    /// Ask the host to stop a download; default implementation reports lack of support.
    async fn stop_download(&self, job: JobHandle) -> ExecutorResult<()> {
        let _ = job;
        unsupported("stop_download")
    }

    /// Resume a paused download; default implementation reports lack of support.
    async fn resume_download(&self, job: JobHandle) -> ExecutorResult<()> {
        let _ = job;
        unsupported("resume_download")
    }

    /// Whether a download can be resumed; default implementation reports lack of support.
    async fn is_resumable(&self, job: JobHandle) -> ExecutorResult<bool> {
        let _ = job;
        unsupported("is_resumable")
    }

    /// Ask the host to stop an upload; default implementation reports lack of support.
    async fn stop_upload(&self, job: JobHandle) -> ExecutorResult<()> {
        let _ = job;
        unsupported("stop_upload")
    }

    /// Invoke the background-session completion handler (iOS).
    async fn complete_handler_ios(&self, job: JobHandle) -> ExecutorResult<()> {
        let _ = job;
        unsupported("complete_handler_ios")
    }
}

/// Optional operation groups a filesystem host may expose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Bundled application assets (Android).
    pub assets: bool,
    /// Raw application resources (Android).
    pub resources: bool,
    /// Photo-library exports (iOS).
    pub photo_library: bool,
}

impl HostCapabilities {
    /// Every optional group enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            assets: true,
            resources: true,
            photo_library: true,
        }
    }
}

/// Stateless filesystem primitives served by the host.
#[async_trait]
pub trait FileSystemHost: Send + Sync {
    /// Optional groups this host implements.
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities::default()
    }

    /// Static directory paths and markers.
    fn constants(&self) -> PlatformConstants;

    /// Create a directory and any missing parents.
    async fn mkdir(&self, path: &str, options: &MkdirOptions) -> ExecutorResult<()>;

    /// Move a file.
    async fn move_file(
        &self,
        from: &str,
        to: &str,
        options: &FileCopyOptions,
    ) -> ExecutorResult<()>;

    /// Copy a file.
    async fn copy_file(
        &self,
        from: &str,
        to: &str,
        options: &FileCopyOptions,
    ) -> ExecutorResult<()>;

    /// Remove a file or directory tree.
    async fn unlink(&self, path: &str) -> ExecutorResult<()>;

    /// Whether the path exists.
    async fn exists(&self, path: &str) -> ExecutorResult<bool>;

    /// Whole file as base64.
    async fn read_file(&self, path: &str) -> ExecutorResult<String>;

    /// `length` bytes from `position` as base64; zero length reads to the end.
    async fn read(&self, path: &str, length: u64, position: u64) -> ExecutorResult<String>;

    /// Replace the file contents with the decoded payload.
    async fn write_file(
        &self,
        path: &str,
        contents: &str,
        options: &Map<String, Value>,
    ) -> ExecutorResult<()>;

    /// Append the decoded payload.
    async fn append_file(&self, path: &str, contents: &str) -> ExecutorResult<()>;

    /// Write at `position`, or append when `None`.
    async fn write(
        &self,
        path: &str,
        contents: &str,
        position: Option<u64>,
    ) -> ExecutorResult<()>;

    /// Entry metadata.
    async fn stat(&self, path: &str) -> ExecutorResult<HostStat>;

    /// Directory listing.
    async fn read_dir(&self, path: &str) -> ExecutorResult<Vec<HostDirEntry>>;

    /// Hex digest of the file contents.
    async fn hash(&self, path: &str, algorithm: HashAlgorithm) -> ExecutorResult<String>;

    /// Set timestamps; `None` leaves the host default in place.
    async fn touch(
        &self,
        path: &str,
        mtime: Option<DateTime<Utc>>,
        ctime: Option<DateTime<Utc>>,
    ) -> ExecutorResult<()>;

    /// Storage totals.
    async fn get_fs_info(&self) -> ExecutorResult<FsInfo>;

    /// Change readability; default implementation reports lack of support.
    async fn set_readable(
        &self,
        path: &str,
        readable: bool,
        owner_only: bool,
    ) -> ExecutorResult<bool> {
        let _ = (path, readable, owner_only);
        unsupported("set_readable")
    }

    /// Ask the media scanner to index a path; default implementation reports lack of support.
    async fn scan_file(&self, path: &str) -> ExecutorResult<Vec<String>> {
        let _ = path;
        unsupported("scan_file")
    }

    /// External files directories; default implementation reports lack of support.
    async fn get_all_external_files_dirs(&self) -> ExecutorResult<Vec<String>> {
        unsupported("get_all_external_files_dirs")
    }

    /// Path of a named resource bundle; default implementation reports lack of support.
    async fn path_for_bundle(&self, name: &str) -> ExecutorResult<String> {
        let _ = name;
        unsupported("path_for_bundle")
    }

    /// Path of a shared app-group container; default implementation reports lack of support.
    async fn path_for_group(&self, name: &str) -> ExecutorResult<String> {
        let _ = name;
        unsupported("path_for_group")
    }

    /// List a bundled asset directory.
    async fn read_dir_assets(&self, path: &str) -> ExecutorResult<Vec<HostDirEntry>> {
        let _ = path;
        unsupported("read_dir_assets")
    }

    /// Whether a bundled asset exists.
    async fn exists_assets(&self, path: &str) -> ExecutorResult<bool> {
        let _ = path;
        unsupported("exists_assets")
    }

    /// Whether a raw resource exists.
    async fn exists_res(&self, name: &str) -> ExecutorResult<bool> {
        let _ = name;
        unsupported("exists_res")
    }

    /// Bundled asset contents as base64.
    async fn read_file_assets(&self, path: &str) -> ExecutorResult<String> {
        let _ = path;
        unsupported("read_file_assets")
    }

    /// Raw resource contents as base64.
    async fn read_file_res(&self, name: &str) -> ExecutorResult<String> {
        let _ = name;
        unsupported("read_file_res")
    }

    /// Copy a bundled asset to the filesystem.
    async fn copy_file_assets(&self, from: &str, to: &str) -> ExecutorResult<()> {
        let _ = (from, to);
        unsupported("copy_file_assets")
    }

    /// Copy a raw resource to the filesystem.
    async fn copy_file_res(&self, name: &str, to: &str) -> ExecutorResult<()> {
        let _ = (name, to);
        unsupported("copy_file_res")
    }

    /// Export a photo-library image; returns the written path.
    async fn copy_assets_file_ios(&self, request: &AssetImageCopy) -> ExecutorResult<String> {
        let _ = request;
        unsupported("copy_assets_file_ios")
    }

    /// Export a photo-library video; returns the written path.
    async fn copy_assets_video_ios(
        &self,
        image_uri: &str,
        dest_path: &str,
    ) -> ExecutorResult<String> {
        let _ = (image_uri, dest_path);
        unsupported("copy_assets_video_ios")
    }
}
