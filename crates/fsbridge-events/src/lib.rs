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

//! Transfer event channel shared by host executors and the bridge.
//!
//! Layout: `payloads.rs` (job handle, event payloads), `topics.rs`
//! (event names), `hub.rs` (`EventChannel` trait and the in-process `EventHub`),
//! `error.rs` (channel errors).

pub mod error;
pub mod hub;
pub mod payloads;
pub mod topics;

pub use error::{EventChannelError, EventChannelResult};
pub use hub::{EventChannel, EventHub, Listener, SubscriptionToken};
pub use payloads::{
    DownloadBegin, DownloadProgress, DownloadResumable, JobHandle, TransferEvent, UploadBegin,
    UploadProgress,
};
pub use topics::{EventName, UnknownEventName};
