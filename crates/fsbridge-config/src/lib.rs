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

//! Layered configuration for the bridge.
//!
//! Layout: `model.rs` (typed config models), `defaults.rs` (built-in values),
//! `validate.rs` (validation/parsing helpers), `loader.rs` (`ConfigLoader`).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use model::{BridgeConfig, LoggingSettings, TransferDefaults};
pub use validate::{KNOWN_ENCODINGS, validate};
