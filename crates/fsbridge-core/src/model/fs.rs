//! Filesystem pass-through models.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Options for `mkdir`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MkdirOptions {
    /// Exclude the directory from iCloud backups (iOS).
    #[serde(rename = "NSURLIsExcludedFromBackup", skip_serializing_if = "Option::is_none")]
    pub excluded_from_backup: Option<bool>,
    /// Data protection class (iOS).
    #[serde(rename = "NSFileProtectionKey", skip_serializing_if = "Option::is_none")]
    pub file_protection_key: Option<String>,
}

/// Options for `move_file` and `copy_file`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCopyOptions {
    /// Data protection class applied to the destination (iOS).
    #[serde(rename = "NSFileProtectionKey", skip_serializing_if = "Option::is_none")]
    pub file_protection_key: Option<String>,
}

/// Entry type as resolved by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything else (links, devices, unknown).
    #[default]
    Other,
}

/// Raw `stat` record reported by the host. Times are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostStat {
    /// Creation time.
    pub ctime: i64,
    /// Modification time.
    pub mtime: i64,
    /// Size in bytes.
    pub size: u64,
    /// Unix mode bits.
    pub mode: u32,
    /// Path the host resolved (content URIs resolve to real paths).
    pub original_filepath: String,
    /// Entry type.
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// `stat` result surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatResult {
    /// Path exactly as the caller passed it.
    pub path: String,
    /// Creation time.
    pub ctime: DateTime<Utc>,
    /// Modification time.
    pub mtime: DateTime<Utc>,
    /// Size in bytes.
    pub size: u64,
    /// Unix mode bits.
    pub mode: u32,
    /// Path the host resolved.
    pub original_filepath: String,
    /// Entry type.
    pub kind: EntryKind,
}

impl StatResult {
    /// Whether the entry is a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Whether the entry is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Raw directory entry reported by the host. Zero times mean "unknown".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostDirEntry {
    /// Entry name.
    pub name: String,
    /// Absolute entry path.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation time, Unix seconds.
    #[serde(default)]
    pub ctime: i64,
    /// Modification time, Unix seconds.
    #[serde(default)]
    pub mtime: i64,
    /// Entry type.
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Directory entry surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadDirItem {
    /// Creation time when the host knows it.
    pub ctime: Option<DateTime<Utc>>,
    /// Modification time when the host knows it.
    pub mtime: Option<DateTime<Utc>>,
    /// Entry name.
    pub name: String,
    /// Absolute entry path.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Entry type.
    pub kind: EntryKind,
}

impl ReadDirItem {
    /// Whether the entry is a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Whether the entry is a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

impl From<HostDirEntry> for ReadDirItem {
    fn from(entry: HostDirEntry) -> Self {
        Self {
            ctime: known_time(entry.ctime),
            mtime: known_time(entry.mtime),
            name: entry.name,
            path: entry.path,
            size: entry.size,
            kind: entry.kind,
        }
    }
}

/// Convert host seconds to a timestamp, treating zero as unknown.
#[must_use]
pub fn known_time(seconds: i64) -> Option<DateTime<Utc>> {
    if seconds == 0 {
        return None;
    }
    DateTime::from_timestamp(seconds, 0)
}

/// Convert host seconds to a timestamp, clamping out-of-range values to the epoch.
#[must_use]
pub fn host_time(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Digest algorithms accepted by `hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5.
    Md5,
    /// SHA-1.
    Sha1,
    /// SHA-224.
    Sha224,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms.
    pub const ALL: [Self; 6] = [
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
    ];

    /// Wire name of the algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl Display for HashAlgorithm {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown hash algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownHashAlgorithm {
    /// Value that failed to parse.
    pub value: String,
}

impl Display for UnknownHashAlgorithm {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("unknown hash algorithm")
    }
}

impl std::error::Error for UnknownHashAlgorithm {}

impl FromStr for HashAlgorithm {
    type Err = UnknownHashAlgorithm;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.as_str() == value)
            .ok_or_else(|| UnknownHashAlgorithm {
                value: value.to_string(),
            })
    }
}

/// Storage totals reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsInfo {
    /// Total bytes on the data volume.
    pub total_space: u64,
    /// Free bytes on the data volume.
    pub free_space: u64,
}

/// How `copy_assets_file_ios` fits the image into the target size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Fit inside the box, keeping aspect ratio.
    #[default]
    Contain,
    /// Fill the box, keeping aspect ratio.
    Cover,
    /// Fill the box, ignoring aspect ratio.
    Stretch,
}

/// Photo-library image export request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetImageCopy {
    /// Photo-library URI (`ph://...`).
    pub image_uri: String,
    /// Destination path.
    pub dest_path: String,
    /// Target width in points; zero keeps the original.
    pub width: u32,
    /// Target height in points; zero keeps the original.
    pub height: u32,
    /// Screen scale factor.
    pub scale: f64,
    /// JPEG compression quality, `0.0..=1.0`.
    pub compression: f64,
    /// Resize behavior.
    pub resize_mode: ResizeMode,
}

impl AssetImageCopy {
    /// Export at `width` x `height` with scale 1.0, compression 1.0 and `contain`.
    #[must_use]
    pub fn new(
        image_uri: impl Into<String>,
        dest_path: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            image_uri: image_uri.into(),
            dest_path: dest_path.into(),
            width,
            height,
            scale: 1.0,
            compression: 1.0,
            resize_mode: ResizeMode::Contain,
        }
    }
}

/// Static platform lookups served by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlatformConstants {
    /// Application bundle directory (iOS).
    pub main_bundle_path: Option<String>,
    /// Cache directory.
    pub caches_directory_path: Option<String>,
    /// External cache directory (Android).
    pub external_caches_directory_path: Option<String>,
    /// Documents directory.
    pub document_directory_path: Option<String>,
    /// Downloads directory (Android).
    pub download_directory_path: Option<String>,
    /// App-specific external directory (Android).
    pub external_directory_path: Option<String>,
    /// Shared external storage root (Android).
    pub external_storage_directory_path: Option<String>,
    /// Temporary directory.
    pub temporary_directory_path: Option<String>,
    /// Library directory (iOS).
    pub library_directory_path: Option<String>,
    /// Pictures directory (Android).
    pub pictures_directory_path: Option<String>,
    /// Marker the host uses for regular files.
    pub file_type_regular: String,
    /// Marker the host uses for directories.
    pub file_type_directory: String,
    /// Data protection keys (iOS).
    #[serde(default)]
    pub file_protection_keys: BTreeMap<String, String>,
}
