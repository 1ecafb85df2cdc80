//! The [`FilePath`] value type.
//!
//! A `FilePath` wraps a possibly-empty path string and offers alias resolution,
//! path completion, existence checks, directory creation, and safe management of
//! the process current directory. Operations that resolve or complete a path
//! return a new value; the only process-wide side effect is the explicit
//! make-current operation.

use std::fs::create_dir_all;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::config_files::user_home_path;

/// Errors reported by the fallible [`FilePath`] operations.
///
/// A missing path is not an error anywhere in this module; it is reported as
/// `false` from the existence checks. These variants carry the underlying OS
/// failure for operations that mutate or probe the filesystem.
#[derive(Debug, Error)]
pub enum FilePathError {
    /// Recursive directory creation failed.
    #[error("could not create directory `{path}`")]
    CreateDirectory {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Changing the process current directory failed.
    #[error("could not change current directory to `{path}`")]
    SetCurrentDirectory {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A permission probe could not be carried out at all.
    #[error("could not access `{path}`")]
    Access {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// An immutable, string-backed filesystem location.
///
/// The backing string may be empty (meaning "unset"), relative, or absolute.
///
/// # Examples
/// ```rust
/// use rstudio_core::fs::FilePath;
///
/// let path = FilePath::new("hello/world");
/// assert_eq!(path.get_absolute_path(), "hello/world");
/// assert!(FilePath::default().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePath {
    path: String,
}

impl FilePath {
    /// Wrap a path string.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// Whether the backing string is empty.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// The backing representation of this path.
    ///
    /// This is the canonicalized external form, not necessarily filesystem-absolute:
    /// a `FilePath` constructed from a relative string keeps that relative string.
    pub fn get_absolute_path(&self) -> &str {
        &self.path
    }

    /// Whether this path exists on disk.
    ///
    /// An empty path is never checked against the filesystem and reports `false`.
    /// Any I/O error during the check is logged and reported as `false`.
    pub fn exists(&self) -> bool {
        Self::exists_at(&self.path)
    }

    /// Whether an arbitrary path string exists on disk. Same contract as
    /// [`exists`](Self::exists).
    pub fn exists_at(path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        match Path::new(path).try_exists() {
            Ok(exists) => exists,
            Err(error) => {
                log::error!("could not stat `{path}`: {error}");
                false
            }
        }
    }

    /// Resolve the `~` alias within a path against the given home directory.
    ///
    /// An empty string or exactly `"~"` resolves to `user_home` itself, and a
    /// `~/...` prefix is replaced by the home directory. Anything else is taken as
    /// an absolute path or a path relative to a safe current directory (see
    /// [`safe_current_path`](Self::safe_current_path)) and completed against it.
    pub fn resolve_aliased_path(aliased: &str, user_home: &FilePath) -> FilePath {
        if aliased.is_empty() || aliased == "~" {
            return user_home.clone();
        }
        if aliased.starts_with("~/") {
            // Strip the `~` and keep the leading slash.
            return FilePath::new(format!(
                "{}{}",
                user_home.get_absolute_path(),
                &aliased[1..]
            ));
        }
        Self::safe_current_path(user_home).complete_path(aliased)
    }

    /// Get the process current directory, recovering when it no longer exists.
    ///
    /// Falls back in order: the directory reported by the OS (provided it still
    /// exists on disk), then `revert_to` if that exists, then the current user's
    /// home directory. Whichever fallback is selected becomes the process current
    /// directory; a failure to change into it is logged, and the selected path is
    /// returned regardless.
    pub fn safe_current_path(revert_to: &FilePath) -> FilePath {
        match std::env::current_dir() {
            Ok(cwd) => {
                // The OS can keep reporting a directory that was deleted after
                // the process started; only trust it while it is still on disk.
                if cwd.exists() {
                    match cwd.to_str() {
                        Some(path) => return FilePath::new(path),
                        None => {
                            log::error!(
                                "current directory `{}` is not valid UTF-8",
                                cwd.display()
                            );
                        }
                    }
                }
            }
            Err(error) => log::error!("could not read current directory: {error}"),
        }

        let safe_path = if revert_to.exists() {
            revert_to.clone()
        } else {
            user_home_path()
        };
        if let Err(error) = safe_path.make_current_path(false) {
            log::error!("{error}");
        }
        safe_path
    }

    /// Make this path the process current directory.
    ///
    /// With `auto_create`, the directory is created first (recursively, if absent)
    /// and a creation failure is propagated without attempting the change.
    pub fn make_current_path(&self, auto_create: bool) -> Result<(), FilePathError> {
        if auto_create {
            self.ensure_directory()?;
        }
        std::env::set_current_dir(&self.path).map_err(|source| {
            FilePathError::SetCurrentDirectory {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Create this directory unless it already exists.
    pub fn ensure_directory(&self) -> Result<(), FilePathError> {
        if self.exists() {
            return Ok(());
        }
        self.create_directory("")
    }

    /// Create a directory, including missing intermediate segments.
    ///
    /// With an empty `child_relative_path`, the directory denoted by this path
    /// itself is created. Otherwise the child is resolved against this path,
    /// unless the child is absolute, in which case it wins outright and this path
    /// is ignored. Creating an already-existing directory is success.
    pub fn create_directory(&self, child_relative_path: &str) -> Result<(), FilePathError> {
        let target = if child_relative_path.is_empty() {
            PathBuf::from(&self.path)
        } else {
            let child = Path::new(child_relative_path);
            if child.is_absolute() {
                child.to_path_buf()
            } else {
                Path::new(&self.path).join(child)
            }
        };
        match create_dir_all(&target) {
            Err(source) if source.kind() != io::ErrorKind::AlreadyExists => {
                Err(FilePathError::CreateDirectory {
                    path: target.display().to_string(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }

    /// Complete `other` against this path.
    ///
    /// An absolute `other` is returned as-is, ignoring this path entirely.
    /// Otherwise the two are joined and `.`/`..` segments are resolved lexically,
    /// without touching the filesystem. If resolution fails (a `..` escaping the
    /// root, a non-UTF-8 result), the failure is logged and this path is returned
    /// unchanged rather than crashing path computation.
    pub fn complete_path(&self, other: &str) -> FilePath {
        if Path::new(other).is_absolute() {
            return FilePath::new(other);
        }
        let joined = Path::new(&self.path).join(other);
        match resolve_components(&joined) {
            Ok(resolved) => match resolved.to_str() {
                Some(path) => FilePath::new(path),
                None => {
                    log::error!(
                        "completed path `{}` is not valid UTF-8; keeping `{}`",
                        resolved.display(),
                        self.path
                    );
                    self.clone()
                }
            },
            Err(reason) => {
                log::error!(
                    "could not complete `{other}` against `{}`: {reason}",
                    self.path
                );
                self.clone()
            }
        }
    }

    /// Complete a child against this path.
    ///
    /// Like [`complete_path`](Self::complete_path), except the argument must be
    /// relative: an absolute child is a caller error, logged, with this path
    /// returned unchanged.
    pub fn complete_child_path(&self, child_relative_path: &str) -> FilePath {
        if Path::new(child_relative_path).is_absolute() {
            log::error!(
                "child path `{child_relative_path}` is not relative to `{}`",
                self.path
            );
            return self.clone();
        }
        self.complete_path(child_relative_path)
    }

    /// Whether the current user may write to this path.
    ///
    /// Checks against the effective uid via `access(2)`. A denied permission is
    /// `Ok(false)`; a probe that cannot be carried out at all is an error.
    #[cfg(unix)]
    pub fn is_writeable(&self) -> Result<bool, FilePathError> {
        use std::ffi::CString;

        let c_path = CString::new(self.path.as_bytes()).map_err(|_| FilePathError::Access {
            path: self.path.clone(),
            source: io::Error::from(io::ErrorKind::InvalidInput),
        })?;
        // SAFETY: `c_path` is a valid NUL-terminated string for the duration of
        // the call; `access` does not retain the pointer.
        if unsafe { libc::access(c_path.as_ptr(), libc::W_OK) } == 0 {
            return Ok(true);
        }
        let error = io::Error::last_os_error();
        match error.raw_os_error() {
            Some(libc::EACCES) | Some(libc::EROFS) => Ok(false),
            _ => Err(FilePathError::Access {
                path: self.path.clone(),
                source: error,
            }),
        }
    }

    /// Whether the current user may write to this path.
    #[cfg(not(unix))]
    pub fn is_writeable(&self) -> Result<bool, FilePathError> {
        let metadata =
            std::fs::metadata(&self.path).map_err(|source| FilePathError::Access {
                path: self.path.clone(),
                source,
            })?;
        Ok(!metadata.permissions().readonly())
    }
}

/// Resolve `.` and `..` components lexically.
///
/// `..` pops the previously collected component; popping past the start (or past
/// the root for an absolute path) is an error rather than a silent truncation.
fn resolve_components(path: &Path) -> Result<PathBuf, &'static str> {
    let mut resolved = PathBuf::new();
    let mut has_root = false;
    for component in path.components() {
        match component {
            Component::RootDir => {
                resolved.push(component);
                has_root = true;
            }
            Component::Prefix(prefix) => {
                resolved.push(prefix.as_os_str());
                has_root = true;
            }
            Component::Normal(name) => resolved.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err("too many `..` components");
                }
            }
        }
    }
    if has_root && resolved.as_os_str().is_empty() {
        resolved.push(Component::RootDir);
    }
    Ok(resolved)
}
