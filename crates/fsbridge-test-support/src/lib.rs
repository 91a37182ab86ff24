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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (callback recorders, sample options), mocks.rs (fake hosts and channels).

pub mod fixtures;
pub mod mocks;

pub use fixtures::{EventLog, sample_download, sample_upload};
pub use mocks::{ControlCall, MemoryFileSystem, RecordingChannel, ScriptedExecutor, TransferScript};
