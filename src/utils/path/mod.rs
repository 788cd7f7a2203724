//! Path utilities.
//!
//! Pure functions for path manipulation.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_import`, `watch_key`)

pub mod fs;

pub use fs::{normalize_path, resolve_import, watch_key};
