//! Option validation and request construction.
//!
//! Typed options are checked for the invariants the type system cannot hold
//! (non-empty locators). Loose JSON option bags are checked field by field,
//! rejecting the first field whose shape is wrong. Both run before a job
//! handle is allocated.

use std::collections::BTreeMap;

use fsbridge_config::TransferDefaults;
use fsbridge_events::JobHandle;
use serde_json::{Map, Value};

use crate::error::{BridgeError, BridgeResult};
use crate::model::{
    DownloadOptions, DownloadRequest, UploadFileItem, UploadOptions, UploadRequest,
};
use crate::path::normalize_file_path;

const DOWNLOAD: &str = "downloadFile";
const UPLOAD: &str = "uploadFiles";

/// Check a typed download before any side effect.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidArgument`] naming `fromUrl` or `toFile`.
pub fn validate_download(options: &DownloadOptions) -> BridgeResult<()> {
    require_non_empty(DOWNLOAD, "fromUrl", &options.from_url)?;
    require_non_empty(DOWNLOAD, "toFile", &options.to_file)
}

/// Check a typed upload before any side effect.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidArgument`] naming `toUrl` or `files`.
pub fn validate_upload(options: &UploadOptions) -> BridgeResult<()> {
    require_non_empty(UPLOAD, "toUrl", &options.to_url)?;
    if options
        .files
        .iter()
        .any(|file| file.filepath.trim().is_empty())
    {
        return Err(BridgeError::invalid(
            UPLOAD,
            "files",
            "every file needs a filepath",
        ));
    }
    Ok(())
}

/// Build the host request for a validated download.
///
/// Capability flags mirror exactly the callbacks present in `options`. Zero
/// tuning values fall back to `defaults`.
#[must_use]
pub fn download_request(
    job: JobHandle,
    options: &DownloadOptions,
    defaults: &TransferDefaults,
) -> DownloadRequest {
    DownloadRequest {
        job_id: job,
        from_url: options.from_url.clone(),
        to_file: normalize_file_path(&options.to_file).to_string(),
        headers: options.headers.clone(),
        background: options.background,
        progress_divider: or_default(options.progress_divider, defaults.progress_divider),
        progress_interval_ms: or_default(
            options.progress_interval_ms,
            defaults.progress_interval_ms,
        ),
        read_timeout_ms: or_default(options.read_timeout_ms, defaults.read_timeout_ms),
        connection_timeout_ms: or_default(
            options.connection_timeout_ms,
            defaults.connection_timeout_ms,
        ),
        background_timeout_ms: or_default(
            options.background_timeout_ms,
            defaults.background_timeout_ms,
        ),
        has_begin_callback: options.begin.is_some(),
        has_progress_callback: options.progress.is_some(),
        has_resumable_callback: options.resumable.is_some(),
    }
}

/// Build the host request for a validated upload.
#[must_use]
pub fn upload_request(
    job: JobHandle,
    options: &UploadOptions,
    defaults: &TransferDefaults,
) -> UploadRequest {
    let method = options
        .method
        .as_deref()
        .map(str::trim)
        .filter(|method| !method.is_empty())
        .unwrap_or(defaults.upload_method.as_str())
        .to_string();
    UploadRequest {
        job_id: job,
        to_url: options.to_url.clone(),
        files: options
            .files
            .iter()
            .map(|file| UploadFileItem {
                filepath: normalize_file_path(&file.filepath).to_string(),
                ..file.clone()
            })
            .collect(),
        binary_stream_only: options.binary_stream_only,
        headers: options.headers.clone(),
        fields: options.fields.clone(),
        method,
        has_begin_callback: options.begin.is_some(),
        has_progress_callback: options.progress.is_some(),
    }
}

fn or_default<T: Copy + Default + PartialEq>(value: Option<T>, default: T) -> T {
    match value {
        Some(value) if value != T::default() => value,
        _ => default,
    }
}

fn require_non_empty(
    operation: &'static str,
    field: &'static str,
    value: &str,
) -> BridgeResult<()> {
    if value.trim().is_empty() {
        return Err(BridgeError::invalid(operation, field, "must be a non-empty string"));
    }
    Ok(())
}

impl DownloadOptions {
    /// Parse a loose options bag using wire field names (`fromUrl`, `toFile`,
    /// `headers`, `background`, `progressDivider`, `progressInterval`,
    /// `readTimeout`, `connectionTimeout`, `backgroundTimeout`).
    ///
    /// Callbacks cannot travel in JSON; attach them afterwards with the
    /// `on_*` builders.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidArgument`] for the first malformed field.
    pub fn from_json(value: &Value) -> BridgeResult<Self> {
        let bag = object(DOWNLOAD, value)?;
        let options = Self {
            from_url: required_string(DOWNLOAD, bag, "fromUrl")?,
            to_file: required_string(DOWNLOAD, bag, "toFile")?,
            headers: string_map(DOWNLOAD, bag, "headers")?,
            background: optional_bool(DOWNLOAD, bag, "background")?.unwrap_or(false),
            progress_divider: optional_u64(DOWNLOAD, bag, "progressDivider")?
                .map(|divider| u32::try_from(divider).unwrap_or(u32::MAX)),
            progress_interval_ms: optional_u64(DOWNLOAD, bag, "progressInterval")?,
            read_timeout_ms: optional_u64(DOWNLOAD, bag, "readTimeout")?,
            connection_timeout_ms: optional_u64(DOWNLOAD, bag, "connectionTimeout")?,
            background_timeout_ms: optional_u64(DOWNLOAD, bag, "backgroundTimeout")?,
            ..Self::default()
        };
        validate_download(&options)?;
        Ok(options)
    }
}

impl UploadOptions {
    /// Parse a loose options bag using wire field names (`toUrl`, `files`,
    /// `binaryStreamOnly`, `headers`, `fields`, `method`).
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidArgument`] for the first malformed field.
    pub fn from_json(value: &Value) -> BridgeResult<Self> {
        let bag = object(UPLOAD, value)?;
        let to_url = required_string(UPLOAD, bag, "toUrl")?;
        let files = match bag.get("files") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| serde_json::from_value::<UploadFileItem>(item.clone()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| BridgeError::invalid(UPLOAD, "files", "entries must be file items"))?,
            _ => return Err(BridgeError::invalid(UPLOAD, "files", "must be a sequence")),
        };
        let method = match bag.get("method") {
            None | Some(Value::Null) => None,
            Some(Value::String(method)) => Some(method.clone()),
            Some(_) => return Err(BridgeError::invalid(UPLOAD, "method", "must be a string")),
        };
        let options = Self {
            to_url,
            files,
            binary_stream_only: optional_bool(UPLOAD, bag, "binaryStreamOnly")?.unwrap_or(false),
            headers: string_map(UPLOAD, bag, "headers")?,
            fields: string_map(UPLOAD, bag, "fields")?,
            method,
            ..Self::default()
        };
        validate_upload(&options)?;
        Ok(options)
    }
}

fn object<'a>(operation: &'static str, value: &'a Value) -> BridgeResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| BridgeError::invalid(operation, "options", "must be an object"))
}

fn required_string(
    operation: &'static str,
    bag: &Map<String, Value>,
    field: &'static str,
) -> BridgeResult<String> {
    match bag.get(field) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.clone()),
        _ => Err(BridgeError::invalid(operation, field, "must be a non-empty string")),
    }
}

fn optional_bool(
    operation: &'static str,
    bag: &Map<String, Value>,
    field: &'static str,
) -> BridgeResult<Option<bool>> {
    match bag.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(_) => Err(BridgeError::invalid(operation, field, "must be a boolean")),
    }
}

fn optional_u64(
    operation: &'static str,
    bag: &Map<String, Value>,
    field: &'static str,
) -> BridgeResult<Option<u64>> {
    match bag.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number.as_u64().map(Some).ok_or_else(|| {
            BridgeError::invalid(operation, field, "must be a non-negative integer")
        }),
        Some(_) => Err(BridgeError::invalid(operation, field, "must be a number")),
    }
}

fn string_map(
    operation: &'static str,
    bag: &Map<String, Value>,
    field: &'static str,
) -> BridgeResult<BTreeMap<String, String>> {
    match bag.get(field) {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(key, value)| match value {
                Value::String(text) => Ok((key.clone(), text.clone())),
                Value::Number(number) => Ok((key.clone(), number.to_string())),
                Value::Bool(flag) => Ok((key.clone(), flag.to_string())),
                _ => Err(BridgeError::invalid(
                    operation,
                    field,
                    "values must be strings",
                )),
            })
            .collect(),
        Some(_) => Err(BridgeError::invalid(operation, field, "must be a mapping")),
    }
}
