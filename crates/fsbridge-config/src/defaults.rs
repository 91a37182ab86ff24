//! Default values for bridge configuration.
//!
//! # Design
//! - Keep transfer tuning defaults in one place so the controller and the
//!   configuration documents agree.

/// Read timeout applied to downloads when the caller omits one (ms).
pub const READ_TIMEOUT_MS: u64 = 15_000;
/// Connection timeout applied to downloads when the caller omits one (ms).
pub const CONNECTION_TIMEOUT_MS: u64 = 5_000;
/// Background session timeout applied to downloads when the caller omits one (ms).
pub const BACKGROUND_TIMEOUT_MS: u64 = 3_600_000;
/// Progress divider; zero emits on every unit of progress.
pub const PROGRESS_DIVIDER: u32 = 0;
/// Progress interval; zero disables time-based throttling.
pub const PROGRESS_INTERVAL_MS: u64 = 0;
/// HTTP method used for uploads when the caller omits one.
pub const UPLOAD_METHOD: &str = "POST";
/// Encoding applied to read/write calls without an explicit selector.
pub const DEFAULT_ENCODING: &str = "utf8";
/// Log level used when neither configuration nor `RUST_LOG` provide one.
pub const LOG_LEVEL: &str = "info";
