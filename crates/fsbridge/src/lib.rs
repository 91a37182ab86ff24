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

//! Filesystem bridge facade.
//!
//! Layout: `bridge.rs` (filesystem pass-through and transfers), `bootstrap.rs`
//! (configuration, logging and service wiring), `error.rs` (bootstrap errors).

pub mod bootstrap;
pub mod bridge;
pub mod error;

pub use bootstrap::{BridgeRuntime, bootstrap};
pub use bridge::FsBridge;
pub use error::{BootstrapError, BootstrapResult};
pub use fsbridge_core::{
    BridgeError, BridgeResult, Encoding, EncodingOrOptions, FileOptions, HashAlgorithm,
    HostCapabilities,
};
pub use fsbridge_events::{EventHub, JobHandle, TransferEvent};
