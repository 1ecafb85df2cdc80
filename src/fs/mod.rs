//! Filesystem utilities.
//!
//! Provides the [`FilePath`](file_path::FilePath) value type for alias resolution,
//! path completion, directory creation, and safe current-directory management.

pub mod file_path;

pub use file_path::{FilePath, FilePathError};
