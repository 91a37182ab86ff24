//! Fake hosts and channels for exercising the bridge without a device.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use fsbridge_core::{
    AssetImageCopy, DownloadRequest, DownloadResult, EntryKind, ExecutorError, ExecutorResult,
    FileCopyOptions, FileSystemHost, FsInfo, HashAlgorithm, HostCapabilities, HostDirEntry,
    HostStat, MkdirOptions, PlatformConstants, TransferExecutor, UploadRequest, UploadResult,
};
use fsbridge_events::{
    DownloadBegin, DownloadProgress, DownloadResumable, EventChannel, EventChannelResult,
    EventHub, EventName, JobHandle, Listener, SubscriptionToken, TransferEvent, UploadBegin,
    UploadProgress,
};
use serde_json::{Map, Value};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use tokio::sync::watch;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Control call received by a [`ScriptedExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCall {
    /// `stop_download`.
    StopDownload(JobHandle),
    /// `resume_download`.
    ResumeDownload(JobHandle),
    /// `is_resumable`.
    IsResumable(JobHandle),
    /// `stop_upload`.
    StopUpload(JobHandle),
    /// `complete_handler_ios`.
    CompleteHandler(JobHandle),
}

/// What a [`ScriptedExecutor`] does for each submitted transfer.
#[derive(Debug, Clone)]
pub struct TransferScript {
    /// Status code reported in begin events and results.
    pub status_code: u16,
    /// Payload size reported for downloads and uploads.
    pub content_length: u64,
    /// Byte counts reported by successive progress events.
    pub progress: Vec<u64>,
    /// Emit `DownloadResumable` after the progress events.
    pub emit_resumable: bool,
    /// Fail every transfer with this message after emitting events.
    pub failure: Option<String>,
    /// Wait for [`ScriptedExecutor::release_held`] before completing.
    pub hold: bool,
    /// Whether the executor supports uploads.
    pub uploads: bool,
}

impl Default for TransferScript {
    fn default() -> Self {
        Self {
            status_code: 200,
            content_length: 4,
            progress: vec![2, 4],
            emit_resumable: false,
            failure: None,
            hold: false,
            uploads: true,
        }
    }
}

/// Transfer executor that emits a scripted event sequence on an [`EventHub`].
///
/// Each job yields to the runtime between events so concurrent jobs
/// interleave on the shared channel.
pub struct ScriptedExecutor {
    hub: EventHub,
    script: TransferScript,
    release: watch::Sender<bool>,
    downloads: Mutex<Vec<DownloadRequest>>,
    uploads: Mutex<Vec<UploadRequest>>,
    controls: Mutex<Vec<ControlCall>>,
}

impl ScriptedExecutor {
    /// Executor running `script` and emitting on `hub`.
    #[must_use]
    pub fn new(hub: EventHub, script: TransferScript) -> Self {
        let (release, _) = watch::channel(false);
        Self {
            hub,
            script,
            release,
            downloads: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
            controls: Mutex::new(Vec::new()),
        }
    }

    /// Let held transfers complete.
    pub fn release_held(&self) {
        self.release.send_replace(true);
    }

    /// Download requests received so far.
    #[must_use]
    pub fn downloads(&self) -> Vec<DownloadRequest> {
        lock(&self.downloads).clone()
    }

    /// Upload requests received so far.
    #[must_use]
    pub fn uploads(&self) -> Vec<UploadRequest> {
        lock(&self.uploads).clone()
    }

    /// Control calls received so far.
    #[must_use]
    pub fn controls(&self) -> Vec<ControlCall> {
        lock(&self.controls).clone()
    }

    async fn wait_if_held(&self) {
        if !self.script.hold {
            return;
        }
        let mut released = self.release.subscribe();
        let _ = released.wait_for(|released| *released).await;
    }

    fn emit(&self, event: TransferEvent) {
        let _ = self.hub.emit(event);
    }

    fn failure(&self, operation: &'static str) -> Option<ExecutorError> {
        self.script
            .failure
            .as_ref()
            .map(|message| ExecutorError::coded(operation, "EUNSPECIFIED", message.clone()))
    }

    fn record(&self, call: ControlCall) {
        lock(&self.controls).push(call);
    }
}

#[async_trait]
impl TransferExecutor for ScriptedExecutor {
    fn supports_uploads(&self) -> bool {
        self.script.uploads
    }

    async fn submit_download(&self, request: DownloadRequest) -> ExecutorResult<DownloadResult> {
        let job_id = request.job_id;
        lock(&self.downloads).push(request);
        let total = self.script.content_length;

        self.emit(TransferEvent::DownloadBegin(DownloadBegin {
            job_id,
            status_code: self.script.status_code,
            content_length: total,
            headers: BTreeMap::from([(
                "Content-Type".to_string(),
                "application/octet-stream".to_string(),
            )]),
        }));
        tokio::task::yield_now().await;
        for &bytes_written in &self.script.progress {
            self.emit(TransferEvent::DownloadProgress(DownloadProgress {
                job_id,
                content_length: total,
                bytes_written,
            }));
            tokio::task::yield_now().await;
        }
        if self.script.emit_resumable {
            self.emit(TransferEvent::DownloadResumable(DownloadResumable { job_id }));
        }
        self.wait_if_held().await;

        if let Some(err) = self.failure("submit_download") {
            return Err(err);
        }
        Ok(DownloadResult {
            job_id,
            status_code: self.script.status_code,
            bytes_written: total,
        })
    }

    async fn submit_upload(&self, request: UploadRequest) -> ExecutorResult<UploadResult> {
        let job_id = request.job_id;
        let files = request.files.len();
        lock(&self.uploads).push(request);
        let total = self.script.content_length;

        self.emit(TransferEvent::UploadBegin(UploadBegin { job_id }));
        tokio::task::yield_now().await;
        for &total_bytes_sent in &self.script.progress {
            self.emit(TransferEvent::UploadProgress(UploadProgress {
                job_id,
                total_bytes_expected_to_send: total,
                total_bytes_sent,
            }));
            tokio::task::yield_now().await;
        }
        self.wait_if_held().await;

        if let Some(err) = self.failure("submit_upload") {
            return Err(err);
        }
        Ok(UploadResult {
            job_id,
            status_code: self.script.status_code,
            headers: BTreeMap::new(),
            body: format!("received {files} file(s)"),
        })
    }

    async fn stop_download(&self, job: JobHandle) -> ExecutorResult<()> {
        self.record(ControlCall::StopDownload(job));
        Ok(())
    }

    async fn resume_download(&self, job: JobHandle) -> ExecutorResult<()> {
        self.record(ControlCall::ResumeDownload(job));
        Ok(())
    }

    async fn is_resumable(&self, job: JobHandle) -> ExecutorResult<bool> {
        self.record(ControlCall::IsResumable(job));
        Ok(self.script.emit_resumable)
    }

    async fn stop_upload(&self, job: JobHandle) -> ExecutorResult<()> {
        self.record(ControlCall::StopUpload(job));
        Ok(())
    }

    async fn complete_handler_ios(&self, job: JobHandle) -> ExecutorResult<()> {
        self.record(ControlCall::CompleteHandler(job));
        Ok(())
    }
}

/// Event channel wrapper that counts registrations and removals.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    hub: EventHub,
    added: Arc<AtomicUsize>,
    removed: Arc<AtomicUsize>,
    failed_removals: Arc<AtomicUsize>,
}

impl RecordingChannel {
    /// Wrap `hub`.
    #[must_use]
    pub fn new(hub: EventHub) -> Self {
        Self {
            hub,
            ..Self::default()
        }
    }

    /// Underlying hub, for emitting events.
    #[must_use]
    pub const fn hub(&self) -> &EventHub {
        &self.hub
    }

    /// Successful `add_listener` calls.
    #[must_use]
    pub fn added(&self) -> usize {
        self.added.load(Ordering::SeqCst)
    }

    /// Successful `remove_listener` calls.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.removed.load(Ordering::SeqCst)
    }

    /// `remove_listener` calls for unknown tokens.
    #[must_use]
    pub fn failed_removals(&self) -> usize {
        self.failed_removals.load(Ordering::SeqCst)
    }

    /// Registrations still live.
    #[must_use]
    pub fn live(&self) -> usize {
        self.hub.listener_count()
    }
}

impl EventChannel for RecordingChannel {
    fn add_listener(&self, name: EventName, listener: Listener) -> SubscriptionToken {
        let _ = self.added.fetch_add(1, Ordering::SeqCst);
        self.hub.add_listener(name, listener)
    }

    fn remove_listener(&self, token: SubscriptionToken) -> EventChannelResult<()> {
        let result = self.hub.remove_listener(token);
        let counter = if result.is_ok() {
            &self.removed
        } else {
            &self.failed_removals
        };
        let _ = counter.fetch_add(1, Ordering::SeqCst);
        result
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    contents: Vec<u8>,
    ctime: DateTime<Utc>,
    mtime: DateTime<Utc>,
    readable: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    files: HashMap<String, MemoryFile>,
    dirs: BTreeSet<String>,
    assets: HashMap<String, Vec<u8>>,
    resources: HashMap<String, Vec<u8>>,
    write_options: Vec<Map<String, Value>>,
    touches: Vec<(String, Option<DateTime<Utc>>, Option<DateTime<Utc>>)>,
    scanned: Vec<String>,
}

/// In-memory [`FileSystemHost`] speaking base64 on the wire.
#[derive(Debug)]
pub struct MemoryFileSystem {
    state: Mutex<MemoryState>,
    capabilities: HostCapabilities,
    created: DateTime<Utc>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new(HostCapabilities::default())
    }
}

impl MemoryFileSystem {
    /// Empty filesystem exposing `capabilities`.
    #[must_use]
    pub fn new(capabilities: HostCapabilities) -> Self {
        let mut state = MemoryState::default();
        let _ = state.dirs.insert("/".to_string());
        Self {
            state: Mutex::new(state),
            capabilities,
            created: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or(DateTime::UNIX_EPOCH),
        }
    }

    /// Seed a file with raw bytes, creating parent directories.
    pub fn insert_file(&self, path: &str, contents: impl Into<Vec<u8>>) {
        let mut state = lock(&self.state);
        add_parents(&mut state.dirs, path);
        let _ = state.files.insert(
            path.to_string(),
            MemoryFile {
                contents: contents.into(),
                ctime: self.created,
                mtime: self.created,
                readable: true,
            },
        );
    }

    /// Seed a bundled asset.
    pub fn insert_asset(&self, path: &str, contents: impl Into<Vec<u8>>) {
        let _ = lock(&self.state).assets.insert(path.to_string(), contents.into());
    }

    /// Seed a raw resource.
    pub fn insert_resource(&self, name: &str, contents: impl Into<Vec<u8>>) {
        let _ = lock(&self.state)
            .resources
            .insert(name.to_string(), contents.into());
    }

    /// Raw bytes stored at `path`.
    #[must_use]
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        lock(&self.state)
            .files
            .get(path)
            .map(|file| file.contents.clone())
    }

    /// Whether `path` is a directory.
    #[must_use]
    pub fn is_dir(&self, path: &str) -> bool {
        lock(&self.state).dirs.contains(path)
    }

    /// Options forwarded with each `write_file` call.
    #[must_use]
    pub fn write_options(&self) -> Vec<Map<String, Value>> {
        lock(&self.state).write_options.clone()
    }

    /// Timestamps forwarded with each `touch` call.
    #[must_use]
    pub fn touches(&self) -> Vec<(String, Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        lock(&self.state).touches.clone()
    }

    /// Paths handed to `scan_file`.
    #[must_use]
    pub fn scanned(&self) -> Vec<String> {
        lock(&self.state).scanned.clone()
    }

    /// Whether `path` is readable.
    #[must_use]
    pub fn is_readable(&self, path: &str) -> Option<bool> {
        lock(&self.state).files.get(path).map(|file| file.readable)
    }

    fn store(&self, path: &str, contents: Vec<u8>) {
        let mut state = lock(&self.state);
        add_parents(&mut state.dirs, path);
        let now = Utc::now();
        let created = self.created;
        let _ = state
            .files
            .entry(path.to_string())
            .and_modify(|file| {
                file.contents.clone_from(&contents);
                file.mtime = now;
            })
            .or_insert_with(|| MemoryFile {
                contents,
                ctime: created,
                mtime: now,
                readable: true,
            });
    }

    fn file(&self, operation: &'static str, path: &str) -> ExecutorResult<MemoryFile> {
        lock(&self.state)
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(operation, path))
    }
}

fn add_parents(dirs: &mut BTreeSet<String>, path: &str) {
    let mut current = path;
    while let Some((parent, _)) = current.rsplit_once('/') {
        let parent = if parent.is_empty() { "/" } else { parent };
        let _ = dirs.insert(parent.to_string());
        if parent == "/" {
            break;
        }
        current = parent;
    }
}

fn not_found(operation: &'static str, path: &str) -> ExecutorError {
    ExecutorError::coded(
        operation,
        "ENOENT",
        format!("no such file or directory, '{path}'"),
    )
}

fn decode(operation: &'static str, contents: &str) -> ExecutorResult<Vec<u8>> {
    STANDARD
        .decode(contents)
        .map_err(|err| ExecutorError::coded(operation, "EINVAL", err.to_string()))
}

fn entry_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn child_of(dir: &str, path: &str) -> bool {
    let prefix = if dir.ends_with('/') {
        dir.to_string()
    } else {
        format!("{dir}/")
    };
    path.strip_prefix(&prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

#[async_trait]
impl FileSystemHost for MemoryFileSystem {
    fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    fn constants(&self) -> PlatformConstants {
        PlatformConstants {
            main_bundle_path: Some("/app/Main.app".into()),
            caches_directory_path: Some("/data/caches".into()),
            document_directory_path: Some("/data/documents".into()),
            temporary_directory_path: Some("/tmp".into()),
            library_directory_path: Some("/data/library".into()),
            file_type_regular: "NSFileTypeRegular".into(),
            file_type_directory: "NSFileTypeDirectory".into(),
            file_protection_keys: BTreeMap::from([(
                "FileProtectionNone".to_string(),
                "NSFileProtectionNone".to_string(),
            )]),
            ..PlatformConstants::default()
        }
    }

    async fn mkdir(&self, path: &str, options: &MkdirOptions) -> ExecutorResult<()> {
        let _ = options;
        let mut state = lock(&self.state);
        add_parents(&mut state.dirs, path);
        let _ = state.dirs.insert(path.to_string());
        Ok(())
    }

    async fn move_file(
        &self,
        from: &str,
        to: &str,
        options: &FileCopyOptions,
    ) -> ExecutorResult<()> {
        let _ = options;
        let mut state = lock(&self.state);
        let file = state
            .files
            .remove(from)
            .ok_or_else(|| not_found("move_file", from))?;
        add_parents(&mut state.dirs, to);
        let _ = state.files.insert(to.to_string(), file);
        Ok(())
    }

    async fn copy_file(
        &self,
        from: &str,
        to: &str,
        options: &FileCopyOptions,
    ) -> ExecutorResult<()> {
        let _ = options;
        let file = self.file("copy_file", from)?;
        self.store(to, file.contents);
        Ok(())
    }

    async fn unlink(&self, path: &str) -> ExecutorResult<()> {
        let mut state = lock(&self.state);
        if state.files.remove(path).is_some() {
            return Ok(());
        }
        if !state.dirs.remove(path) {
            return Err(not_found("unlink", path));
        }
        let prefix = format!("{path}/");
        state.files.retain(|file, _| !file.starts_with(&prefix));
        state.dirs.retain(|dir| !dir.starts_with(&prefix));
        Ok(())
    }

    async fn exists(&self, path: &str) -> ExecutorResult<bool> {
        let state = lock(&self.state);
        Ok(state.files.contains_key(path) || state.dirs.contains(path))
    }

    async fn read_file(&self, path: &str) -> ExecutorResult<String> {
        let file = self.file("read_file", path)?;
        Ok(STANDARD.encode(file.contents))
    }

    async fn read(&self, path: &str, length: u64, position: u64) -> ExecutorResult<String> {
        let file = self.file("read", path)?;
        let size = file.contents.len();
        let start = usize::try_from(position).unwrap_or(usize::MAX).min(size);
        let end = if length == 0 {
            size
        } else {
            start
                .saturating_add(usize::try_from(length).unwrap_or(usize::MAX))
                .min(size)
        };
        Ok(STANDARD.encode(&file.contents[start..end]))
    }

    async fn write_file(
        &self,
        path: &str,
        contents: &str,
        options: &Map<String, Value>,
    ) -> ExecutorResult<()> {
        let bytes = decode("write_file", contents)?;
        lock(&self.state).write_options.push(options.clone());
        self.store(path, bytes);
        Ok(())
    }

    async fn append_file(&self, path: &str, contents: &str) -> ExecutorResult<()> {
        let bytes = decode("append_file", contents)?;
        let mut existing = self.contents(path).unwrap_or_default();
        existing.extend_from_slice(&bytes);
        self.store(path, existing);
        Ok(())
    }

    async fn write(
        &self,
        path: &str,
        contents: &str,
        position: Option<u64>,
    ) -> ExecutorResult<()> {
        let bytes = decode("write", contents)?;
        let mut existing = self.file("write", path)?.contents;
        match position {
            None => existing.extend_from_slice(&bytes),
            Some(position) => {
                let start = usize::try_from(position).unwrap_or(usize::MAX);
                let end = start.saturating_add(bytes.len());
                if existing.len() < end {
                    existing.resize(end, 0);
                }
                existing[start..end].copy_from_slice(&bytes);
            }
        }
        self.store(path, existing);
        Ok(())
    }

    async fn stat(&self, path: &str) -> ExecutorResult<HostStat> {
        let state = lock(&self.state);
        if let Some(file) = state.files.get(path) {
            return Ok(HostStat {
                ctime: file.ctime.timestamp(),
                mtime: file.mtime.timestamp(),
                size: file.contents.len() as u64,
                mode: if file.readable { 0o644 } else { 0o200 },
                original_filepath: path.to_string(),
                kind: EntryKind::File,
            });
        }
        if state.dirs.contains(path) {
            return Ok(HostStat {
                ctime: self.created.timestamp(),
                mtime: self.created.timestamp(),
                size: 0,
                mode: 0o755,
                original_filepath: path.to_string(),
                kind: EntryKind::Directory,
            });
        }
        Err(not_found("stat", path))
    }

    async fn read_dir(&self, path: &str) -> ExecutorResult<Vec<HostDirEntry>> {
        let state = lock(&self.state);
        if !state.dirs.contains(path) {
            return Err(not_found("read_dir", path));
        }
        let mut entries: Vec<HostDirEntry> = state
            .dirs
            .iter()
            .filter(|dir| child_of(path, dir))
            .map(|dir| HostDirEntry {
                name: entry_name(dir),
                path: dir.clone(),
                size: 0,
                ctime: 0,
                mtime: self.created.timestamp(),
                kind: EntryKind::Directory,
            })
            .collect();
        entries.extend(
            state
                .files
                .iter()
                .filter(|(file, _)| child_of(path, file))
                .map(|(file, meta)| HostDirEntry {
                    name: entry_name(file),
                    path: file.clone(),
                    size: meta.contents.len() as u64,
                    ctime: meta.ctime.timestamp(),
                    mtime: meta.mtime.timestamp(),
                    kind: EntryKind::File,
                }),
        );
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn hash(&self, path: &str, algorithm: HashAlgorithm) -> ExecutorResult<String> {
        let contents = self.file("hash", path)?.contents;
        let digest = match algorithm {
            HashAlgorithm::Sha224 => Sha224::digest(&contents).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(&contents).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(&contents).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(&contents).to_vec(),
            HashAlgorithm::Md5 | HashAlgorithm::Sha1 => {
                return Err(ExecutorError::coded(
                    "hash",
                    "EINVAL",
                    format!("{algorithm} is not available in memory"),
                ));
            }
        };
        Ok(hex::encode(digest))
    }

    async fn touch(
        &self,
        path: &str,
        mtime: Option<DateTime<Utc>>,
        ctime: Option<DateTime<Utc>>,
    ) -> ExecutorResult<()> {
        let mut state = lock(&self.state);
        let file = state
            .files
            .get_mut(path)
            .ok_or_else(|| not_found("touch", path))?;
        if let Some(mtime) = mtime {
            file.mtime = mtime;
        }
        if let Some(ctime) = ctime {
            file.ctime = ctime;
        }
        state.touches.push((path.to_string(), mtime, ctime));
        Ok(())
    }

    async fn get_fs_info(&self) -> ExecutorResult<FsInfo> {
        let used: usize = lock(&self.state)
            .files
            .values()
            .map(|file| file.contents.len())
            .sum();
        let total = 1_u64 << 30;
        Ok(FsInfo {
            total_space: total,
            free_space: total.saturating_sub(used as u64),
        })
    }

    async fn set_readable(
        &self,
        path: &str,
        readable: bool,
        owner_only: bool,
    ) -> ExecutorResult<bool> {
        let _ = owner_only;
        let mut state = lock(&self.state);
        let file = state
            .files
            .get_mut(path)
            .ok_or_else(|| not_found("set_readable", path))?;
        file.readable = readable;
        Ok(true)
    }

    async fn scan_file(&self, path: &str) -> ExecutorResult<Vec<String>> {
        lock(&self.state).scanned.push(path.to_string());
        Ok(vec![path.to_string()])
    }

    async fn get_all_external_files_dirs(&self) -> ExecutorResult<Vec<String>> {
        Ok(vec!["/storage/emulated/0/Android/data/app/files".to_string()])
    }

    async fn path_for_bundle(&self, name: &str) -> ExecutorResult<String> {
        Ok(format!("/app/Main.app/{name}.bundle"))
    }

    async fn path_for_group(&self, name: &str) -> ExecutorResult<String> {
        Ok(format!("/groups/{name}"))
    }

    async fn read_dir_assets(&self, path: &str) -> ExecutorResult<Vec<HostDirEntry>> {
        let state = lock(&self.state);
        let mut entries: Vec<HostDirEntry> = state
            .assets
            .iter()
            .filter(|(asset, _)| {
                (path.is_empty() && !asset.contains('/')) || child_of(path, asset)
            })
            .map(|(asset, contents)| HostDirEntry {
                name: entry_name(asset),
                path: asset.clone(),
                size: contents.len() as u64,
                ctime: 0,
                mtime: 0,
                kind: EntryKind::File,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn exists_assets(&self, path: &str) -> ExecutorResult<bool> {
        Ok(lock(&self.state).assets.contains_key(path))
    }

    async fn exists_res(&self, name: &str) -> ExecutorResult<bool> {
        Ok(lock(&self.state).resources.contains_key(name))
    }

    async fn read_file_assets(&self, path: &str) -> ExecutorResult<String> {
        lock(&self.state)
            .assets
            .get(path)
            .map(|contents| STANDARD.encode(contents))
            .ok_or_else(|| not_found("read_file_assets", path))
    }

    async fn read_file_res(&self, name: &str) -> ExecutorResult<String> {
        lock(&self.state)
            .resources
            .get(name)
            .map(|contents| STANDARD.encode(contents))
            .ok_or_else(|| not_found("read_file_res", name))
    }

    async fn copy_file_assets(&self, from: &str, to: &str) -> ExecutorResult<()> {
        let contents = lock(&self.state)
            .assets
            .get(from)
            .cloned()
            .ok_or_else(|| not_found("copy_file_assets", from))?;
        self.store(to, contents);
        Ok(())
    }

    async fn copy_file_res(&self, name: &str, to: &str) -> ExecutorResult<()> {
        let contents = lock(&self.state)
            .resources
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("copy_file_res", name))?;
        self.store(to, contents);
        Ok(())
    }

    async fn copy_assets_file_ios(&self, request: &AssetImageCopy) -> ExecutorResult<String> {
        let marker = format!(
            "{}@{}x{}:{:?}",
            request.image_uri, request.width, request.height, request.resize_mode
        );
        self.store(&request.dest_path, marker.into_bytes());
        Ok(request.dest_path.clone())
    }

    async fn copy_assets_video_ios(
        &self,
        image_uri: &str,
        dest_path: &str,
    ) -> ExecutorResult<String> {
        self.store(dest_path, image_uri.as_bytes().to_vec());
        Ok(dest_path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[tokio::test]
    async fn memory_fs_speaks_base64() -> Result<(), Box<dyn Error>> {
        let fs = MemoryFileSystem::default();
        fs.write_file("/docs/a.txt", "aGVsbG8=", &Map::new()).await?;
        assert_eq!(fs.contents("/docs/a.txt"), Some(b"hello".to_vec()));
        assert!(fs.is_dir("/docs"));
        assert_eq!(fs.read_file("/docs/a.txt").await?, "aGVsbG8=");
        assert_eq!(fs.read("/docs/a.txt", 2, 1).await?, STANDARD.encode("el"));
        Ok(())
    }

    #[tokio::test]
    async fn positional_write_extends_the_file() -> Result<(), Box<dyn Error>> {
        let fs = MemoryFileSystem::default();
        fs.insert_file("/a", b"abc".to_vec());
        fs.write("/a", &STANDARD.encode("XY"), Some(2)).await?;
        assert_eq!(fs.contents("/a"), Some(b"abXY".to_vec()));
        fs.write("/a", &STANDARD.encode("!"), None).await?;
        assert_eq!(fs.contents("/a"), Some(b"abXY!".to_vec()));
        Ok(())
    }

    #[tokio::test]
    async fn read_dir_lists_direct_children() -> Result<(), Box<dyn Error>> {
        let fs = MemoryFileSystem::default();
        fs.insert_file("/d/one", b"1".to_vec());
        fs.insert_file("/d/sub/two", b"22".to_vec());
        let names: Vec<String> = fs
            .read_dir("/d")
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["one".to_string(), "sub".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn hash_uses_real_digests() -> Result<(), Box<dyn Error>> {
        let fs = MemoryFileSystem::default();
        fs.insert_file("/h", b"abc".to_vec());
        assert_eq!(
            fs.hash("/h", HashAlgorithm::Sha256).await?,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let err = fs
            .hash("/h", HashAlgorithm::Md5)
            .await
            .err()
            .ok_or("md5 should be unavailable")?;
        assert_eq!(err.code(), Some("EINVAL"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_files_report_enoent() {
        let fs = MemoryFileSystem::default();
        let err = fs.stat("/nope").await.err();
        assert_eq!(err.as_ref().and_then(ExecutorError::code), Some("ENOENT"));
    }

    #[test]
    fn recording_channel_counts_registrations() {
        let channel = RecordingChannel::new(EventHub::new());
        let listener: Listener = Arc::new(|_: &TransferEvent| {});
        let token = channel.add_listener(EventName::DownloadBegin, listener);
        assert_eq!(channel.live(), 1);
        assert!(channel.remove_listener(token).is_ok());
        assert!(channel.remove_listener(token).is_err());
        assert_eq!(
            (channel.added(), channel.removed(), channel.failed_removals()),
            (1, 1, 1)
        );
    }
}
