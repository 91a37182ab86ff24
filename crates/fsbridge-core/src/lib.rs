#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Core of the filesystem bridge: transfer jobs and content transcoding.
//!
//! Layout: `codec.rs` (encoding selectors and base64 transcoding), `path.rs`
//! (`file://` normalization), `jobs.rs` (job handle allocation), `router.rs`
//! (job-scoped subscriptions), `table.rs` (job lifecycle), `validate.rs`
//! (option checks and request building), `controller.rs` (transfer jobs),
//! `service/` (host traits), `model/` (domain types), `error.rs`.

pub mod codec;
pub mod controller;
pub mod error;
pub mod jobs;
pub mod model;
pub mod path;
pub mod router;
pub mod service;
pub mod table;
pub mod validate;

pub use codec::{
    CodecError, CodecResult, Encoding, EncodingOrOptions, FileOptions, ResolvedOptions,
};
pub use controller::{DownloadJob, JobOutcome, TransferController, TransferJob, UploadJob};
pub use error::{BridgeError, BridgeResult, ExecutorError, ExecutorResult};
pub use jobs::JobIdAllocator;
pub use model::{
    AssetImageCopy, DownloadOptions, DownloadRequest, DownloadResult, EntryKind, FileCopyOptions,
    FsInfo, HashAlgorithm, HostDirEntry, HostStat, MkdirOptions, PlatformConstants, ReadDirItem,
    ResizeMode, StatResult, TransferKind, UploadFileItem, UploadOptions, UploadRequest,
    UploadResult,
};
pub use path::normalize_file_path;
pub use router::{EventHandler, SubscriptionRouter, SubscriptionSet};
pub use service::{FileSystemHost, HostCapabilities, TransferExecutor};
pub use table::{JobState, JobTable};
