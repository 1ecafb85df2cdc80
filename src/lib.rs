//! Core path resolution for the RStudio desktop.
//!
//! This crate resolves abstract, possibly-aliased filesystem locations (home-relative
//! paths, environment variable placeholders, and XDG-style base directory variables)
//! into concrete filesystem paths, and keeps the process current directory valid even
//! when the directory it started in disappears out from under it.

pub mod config_files;
pub mod fs;
pub mod os;
