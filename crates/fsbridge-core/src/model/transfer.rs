//! Transfer options, host requests and results.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use fsbridge_events::{DownloadBegin, DownloadProgress, DownloadResumable, JobHandle};
use fsbridge_events::{UploadBegin, UploadProgress};
use serde::{Deserialize, Serialize};

/// Callback for `DownloadBegin` events.
pub type DownloadBeginCallback = Arc<dyn Fn(&DownloadBegin) + Send + Sync>;
/// Callback for `DownloadProgress` events.
pub type DownloadProgressCallback = Arc<dyn Fn(&DownloadProgress) + Send + Sync>;
/// Callback for `DownloadResumable` events.
pub type DownloadResumableCallback = Arc<dyn Fn(&DownloadResumable) + Send + Sync>;
/// Callback for `UploadBegin` events.
pub type UploadBeginCallback = Arc<dyn Fn(&UploadBegin) + Send + Sync>;
/// Callback for `UploadProgress` events.
pub type UploadProgressCallback = Arc<dyn Fn(&UploadProgress) + Send + Sync>;

/// Kind of transfer a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Remote resource to local file.
    Download,
    /// Local files to remote endpoint.
    Upload,
}

impl TransferKind {
    /// Metric/log label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Download => "download",
            Self::Upload => "upload",
        }
    }

    /// Caller-facing operation name used in errors.
    #[must_use]
    pub const fn operation(self) -> &'static str {
        match self {
            Self::Download => "downloadFile",
            Self::Upload => "uploadFiles",
        }
    }
}

/// Caller options for a download.
///
/// Tuning values left at `None` (or zero) take the configured defaults.
#[derive(Clone, Default)]
pub struct DownloadOptions {
    /// Remote locator to fetch.
    pub from_url: String,
    /// Local destination; a `file://` prefix is stripped.
    pub to_file: String,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Continue in a background session (iOS).
    pub background: bool,
    /// Report progress only at this percent step.
    pub progress_divider: Option<u32>,
    /// Minimum interval between progress reports.
    pub progress_interval_ms: Option<u64>,
    /// Read timeout.
    pub read_timeout_ms: Option<u64>,
    /// Connection timeout.
    pub connection_timeout_ms: Option<u64>,
    /// Background session timeout.
    pub background_timeout_ms: Option<u64>,
    /// Invoked when response headers arrive.
    pub begin: Option<DownloadBeginCallback>,
    /// Invoked on each progress report.
    pub progress: Option<DownloadProgressCallback>,
    /// Invoked when the host reports the download as resumable.
    pub resumable: Option<DownloadResumableCallback>,
}

impl DownloadOptions {
    /// Options for fetching `from_url` into `to_file`.
    #[must_use]
    pub fn new(from_url: impl Into<String>, to_file: impl Into<String>) -> Self {
        Self {
            from_url: from_url.into(),
            to_file: to_file.into(),
            ..Self::default()
        }
    }

    /// Add a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.headers.insert(name.into(), value.into());
        self
    }

    /// Toggle background mode.
    #[must_use]
    pub const fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Set the progress divider.
    #[must_use]
    pub const fn progress_divider(mut self, divider: u32) -> Self {
        self.progress_divider = Some(divider);
        self
    }

    /// Set the progress interval.
    #[must_use]
    pub const fn progress_interval_ms(mut self, interval: u64) -> Self {
        self.progress_interval_ms = Some(interval);
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub const fn read_timeout_ms(mut self, timeout: u64) -> Self {
        self.read_timeout_ms = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connection_timeout_ms(mut self, timeout: u64) -> Self {
        self.connection_timeout_ms = Some(timeout);
        self
    }

    /// Set the background session timeout.
    #[must_use]
    pub const fn background_timeout_ms(mut self, timeout: u64) -> Self {
        self.background_timeout_ms = Some(timeout);
        self
    }

    /// Register the begin callback.
    #[must_use]
    pub fn on_begin(mut self, callback: impl Fn(&DownloadBegin) + Send + Sync + 'static) -> Self {
        self.begin = Some(Arc::new(callback));
        self
    }

    /// Register the progress callback.
    #[must_use]
    pub fn on_progress(
        mut self,
        callback: impl Fn(&DownloadProgress) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Register the resumable callback.
    #[must_use]
    pub fn on_resumable(
        mut self,
        callback: impl Fn(&DownloadResumable) + Send + Sync + 'static,
    ) -> Self {
        self.resumable = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DownloadOptions")
            .field("from_url", &self.from_url)
            .field("to_file", &self.to_file)
            .field("headers", &self.headers)
            .field("background", &self.background)
            .field("progress_divider", &self.progress_divider)
            .field("progress_interval_ms", &self.progress_interval_ms)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("connection_timeout_ms", &self.connection_timeout_ms)
            .field("background_timeout_ms", &self.background_timeout_ms)
            .field("begin", &self.begin.is_some())
            .field("progress", &self.progress.is_some())
            .field("resumable", &self.resumable.is_some())
            .finish()
    }
}

/// One multipart file in an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileItem {
    /// Form field name.
    pub name: String,
    /// File name reported to the server.
    pub filename: String,
    /// Local path; a `file://` prefix is stripped.
    pub filepath: String,
    /// MIME type, inferred by the host when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filetype: Option<String>,
}

impl UploadFileItem {
    /// File item without an explicit MIME type.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        filepath: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: filename.into(),
            filepath: filepath.into(),
            filetype: None,
        }
    }
}

/// Caller options for an upload.
#[derive(Clone, Default)]
pub struct UploadOptions {
    /// Remote endpoint.
    pub to_url: String,
    /// Files to send.
    pub files: Vec<UploadFileItem>,
    /// Send the first file as a raw body instead of multipart.
    pub binary_stream_only: bool,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Extra multipart form fields.
    pub fields: BTreeMap<String, String>,
    /// HTTP method; the configured default applies when absent or empty.
    pub method: Option<String>,
    /// Invoked when the request starts streaming.
    pub begin: Option<UploadBeginCallback>,
    /// Invoked on each progress report.
    pub progress: Option<UploadProgressCallback>,
}

impl UploadOptions {
    /// Options for sending `files` to `to_url`.
    #[must_use]
    pub fn new(to_url: impl Into<String>, files: Vec<UploadFileItem>) -> Self {
        Self {
            to_url: to_url.into(),
            files,
            ..Self::default()
        }
    }

    /// Add a request header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a form field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.fields.insert(name.into(), value.into());
        self
    }

    /// Override the HTTP method.
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Toggle raw-body mode.
    #[must_use]
    pub const fn binary_stream_only(mut self, enabled: bool) -> Self {
        self.binary_stream_only = enabled;
        self
    }

    /// Register the begin callback.
    #[must_use]
    pub fn on_begin(mut self, callback: impl Fn(&UploadBegin) + Send + Sync + 'static) -> Self {
        self.begin = Some(Arc::new(callback));
        self
    }

    /// Register the progress callback.
    #[must_use]
    pub fn on_progress(
        mut self,
        callback: impl Fn(&UploadProgress) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("UploadOptions")
            .field("to_url", &self.to_url)
            .field("files", &self.files)
            .field("binary_stream_only", &self.binary_stream_only)
            .field("headers", &self.headers)
            .field("fields", &self.fields)
            .field("method", &self.method)
            .field("begin", &self.begin.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Normalized download submitted to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    /// Handle allocated for the job.
    pub job_id: JobHandle,
    /// Remote locator.
    pub from_url: String,
    /// Normalized destination path.
    pub to_file: String,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Background session flag.
    pub background: bool,
    /// Progress divider.
    pub progress_divider: u32,
    /// Progress interval in milliseconds.
    #[serde(rename = "progressInterval")]
    pub progress_interval_ms: u64,
    /// Read timeout in milliseconds.
    #[serde(rename = "readTimeout")]
    pub read_timeout_ms: u64,
    /// Connection timeout in milliseconds.
    #[serde(rename = "connectionTimeout")]
    pub connection_timeout_ms: u64,
    /// Background timeout in milliseconds.
    #[serde(rename = "backgroundTimeout")]
    pub background_timeout_ms: u64,
    /// A begin callback was supplied.
    pub has_begin_callback: bool,
    /// A progress callback was supplied.
    pub has_progress_callback: bool,
    /// A resumable callback was supplied.
    pub has_resumable_callback: bool,
}

/// Normalized upload submitted to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Handle allocated for the job.
    pub job_id: JobHandle,
    /// Remote endpoint.
    pub to_url: String,
    /// Files with normalized paths.
    pub files: Vec<UploadFileItem>,
    /// Raw-body mode.
    pub binary_stream_only: bool,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Multipart form fields.
    pub fields: BTreeMap<String, String>,
    /// HTTP method.
    pub method: String,
    /// A begin callback was supplied.
    pub has_begin_callback: bool,
    /// A progress callback was supplied.
    pub has_progress_callback: bool,
}

/// Host result for a finished download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    /// Job the result belongs to.
    pub job_id: JobHandle,
    /// HTTP status code.
    pub status_code: u16,
    /// Bytes written to the destination.
    pub bytes_written: u64,
}

/// Host result for a finished upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Job the result belongs to.
    pub job_id: JobHandle,
    /// HTTP status code.
    pub status_code: u16,
    /// Response headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Response body.
    #[serde(default)]
    pub body: String,
}
