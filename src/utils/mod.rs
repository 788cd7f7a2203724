//! Utility modules shared across the shell runtime.

pub mod path;
