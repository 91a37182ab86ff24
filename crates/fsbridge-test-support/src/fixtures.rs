//! Callback recorders and sample transfer options.

use std::sync::{Arc, Mutex, PoisonError};

use fsbridge_core::{DownloadOptions, UploadFileItem, UploadOptions};

/// Shared, ordered record of payloads handed to a callback.
#[derive(Debug)]
pub struct EventLog<T> {
    entries: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for EventLog<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<T> Default for EventLog<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + 'static> EventLog<T> {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry`.
    pub fn push(&self, entry: T) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Callback that appends every payload it receives.
    #[must_use]
    pub fn recorder(&self) -> impl Fn(&T) + Send + Sync + 'static {
        let log = self.clone();
        move |entry: &T| log.push(entry.clone())
    }

    /// Snapshot of the recorded payloads, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<T> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Download of `https://example.test/<name>` into the documents directory.
#[must_use]
pub fn sample_download(name: &str) -> DownloadOptions {
    DownloadOptions::new(
        format!("https://example.test/{name}"),
        format!("file:///data/documents/{name}"),
    )
}

/// Single-file multipart upload to `https://example.test/upload`.
#[must_use]
pub fn sample_upload(filepath: &str) -> UploadOptions {
    UploadOptions::new(
        "https://example.test/upload",
        vec![UploadFileItem::new("file", "payload.bin", filepath)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_arrival_order() {
        let log = EventLog::<u32>::new();
        let record = log.recorder();
        record(&3);
        record(&1);
        log.push(2);
        assert_eq!(log.entries(), vec![3, 1, 2]);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn sample_download_uses_file_scheme_destination() {
        let options = sample_download("y.bin");
        assert_eq!(options.from_url, "https://example.test/y.bin");
        assert!(options.to_file.starts_with("file://"));
    }

    #[test]
    fn sample_upload_has_one_file() {
        let options = sample_upload("/tmp/a.bin");
        assert_eq!(options.files.len(), 1);
        assert_eq!(options.files[0].filepath, "/tmp/a.bin");
    }
}
