//! Domain models shared by the controller, the host traits and the facade.

mod fs;
mod transfer;

pub use fs::{
    AssetImageCopy, EntryKind, FileCopyOptions, FsInfo, HashAlgorithm, HostDirEntry, HostStat,
    MkdirOptions, PlatformConstants, ReadDirItem, ResizeMode, StatResult, UnknownHashAlgorithm,
    host_time, known_time,
};
pub use transfer::{
    DownloadBeginCallback, DownloadOptions, DownloadProgressCallback, DownloadRequest,
    DownloadResult, DownloadResumableCallback, TransferKind, UploadBeginCallback, UploadFileItem,
    UploadOptions, UploadProgressCallback, UploadRequest, UploadResult,
};
