//! Configuration directory resolution and current-user identity.
//!
//! Provides helpers for locating RStudio configuration and data directories,
//! including XDG Base Directory support.
//!
//! ```rust,no_run
//! # use rstudio_core::config_files::xdg::XdgDirs;
//! let dirs = XdgDirs::new();
//!
//! let config_dir = dirs.user_config_dir(None, None);
//! ```

use std::{env::home_dir, path::PathBuf};

use crate::fs::FilePath;
use crate::os::env::getenv;

pub mod xdg;

/// Wrapper around [`std::env::home_dir`].
pub fn home() -> Option<PathBuf> {
    home_dir()
}

/// The current user's home directory as a [`FilePath`].
///
/// Empty when the home directory cannot be determined or is not valid UTF-8.
pub fn user_home_path() -> FilePath {
    home()
        .and_then(|path| path.to_str().map(FilePath::new))
        .unwrap_or_default()
}

/// The current user's login name, or the empty string when undeterminable.
#[cfg(windows)]
pub fn username() -> String {
    getenv("USERNAME")
}

/// The current user's login name, or the empty string when undeterminable.
#[cfg(not(windows))]
pub fn username() -> String {
    let user = getenv("USER");
    if user.is_empty() { getenv("LOGNAME") } else { user }
}
