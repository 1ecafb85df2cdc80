//! XDG Base Directory resolution for RStudio configuration and data.
//!
//! Returns system and user paths for RStudio configuration and data, roughly in
//! accordance with the FreeDesktop XDG Base Directory Specification, with
//! platform-specific fallbacks for Windows.
//!
//! All of these can be configured with environment variables. The values of
//! those variables can include the special variables `$USER` (the user's name),
//! `$HOME` (the user's home directory), `$HOSTNAME` (the system host name), and
//! `~` (the user's home directory). They resolve against the current user by
//! default; to resolve against a different user, supply a name and home
//! directory through the optional arguments.

use std::cell::OnceCell;

use crate::config_files::{user_home_path, username};
use crate::fs::FilePath;
use crate::os::env::{self, EnvVar};

/// Directory created under roots that are not already final.
#[cfg(windows)]
const APP_FOLDER: &str = "RStudio";
#[cfg(not(windows))]
const APP_FOLDER: &str = "rstudio";

/// Separator between the entries of an `XDG_*_DIRS` search path.
const SEARCH_PATH_SEPARATOR: char = ':';

/// Environment variables honored by the resolvers, in forwarding order.
const XDG_FORWARD_VARS: [&str; 8] = [
    "RSTUDIO_CONFIG_HOME",
    "RSTUDIO_CONFIG_DIR",
    "RSTUDIO_DATA_HOME",
    "RSTUDIO_DATA_DIR",
    "XDG_CONFIG_HOME",
    "XDG_CONFIG_DIRS",
    "XDG_DATA_HOME",
    "XDG_DATA_DIRS",
];

/// Windows known folders used as platform defaults.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum WinFolderId {
    RoamingAppData,
    LocalAppData,
    ProgramData,
}

/// Environment-variable rendition of the Windows `SHGetKnownFolderPath` API.
///
/// Empty when the corresponding variable is unset (and always on platforms that
/// do not populate these variables).
fn known_folder_path(folder_id: WinFolderId) -> String {
    let name = match folder_id {
        WinFolderId::RoamingAppData => "APPDATA",
        WinFolderId::LocalAppData => "LOCALAPPDATA",
        WinFolderId::ProgramData => "ProgramData",
    };
    env::getenv(name)
}

#[cfg(unix)]
fn system_hostname() -> String {
    let mut buf = [0u8; 256];
    // SAFETY: `buf` outlives the call and its length is passed alongside it.
    if unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) } != 0 {
        log::error!(
            "could not look up hostname: {}",
            std::io::Error::last_os_error()
        );
        return String::new();
    }
    let len = buf.iter().position(|&byte| byte == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

#[cfg(not(unix))]
fn system_hostname() -> String {
    env::getenv("COMPUTERNAME")
}

/// Resolver for the RStudio configuration and data directories.
///
/// Construct once and share by reference; the system hostname used during
/// variable expansion is looked up lazily and cached for the resolver's
/// lifetime.
#[derive(Debug, Default)]
pub struct XdgDirs {
    hostname: OnceCell<String>,
}

impl XdgDirs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hostname used for `$HOSTNAME` expansion: a manually specified `HOSTNAME`
    /// environment variable wins over the cached system lookup.
    fn hostname(&self) -> String {
        let hostname = env::getenv("HOSTNAME");
        if !hostname.is_empty() {
            return hostname;
        }
        self.hostname.get_or_init(system_hostname).clone()
    }

    /// Resolve an XDG directory based on the environment and the given user.
    ///
    /// `rstudio_env_var` names the final directory and is given precedence;
    /// `xdg_env_var` names a root under which the application folder is created.
    /// With neither set, the Windows known folder (or, failing that, and always
    /// on POSIX, `default_dir`) serves as the root.
    fn resolve_xdg_dir(
        &self,
        rstudio_env_var: &str,
        xdg_env_var: &str,
        windows_folder_id: WinFolderId,
        default_dir: &str,
        user: Option<&str>,
        home_dir: Option<&FilePath>,
    ) -> FilePath {
        let mut final_path = true;
        let mut env_value = env::getenv(rstudio_env_var);
        if env_value.is_empty() {
            // Only the RStudio-specific variable specifies the final path; any
            // other source is a root that still needs our own subfolder.
            final_path = false;
            env_value = env::getenv(xdg_env_var);
        }

        let xdg_home = if env_value.is_empty() {
            // No root specified in the environment; generate one.
            let mut fallback = String::new();
            if cfg!(windows) {
                fallback = known_folder_path(windows_folder_id);
                if fallback.is_empty() {
                    log::error!("unable to retrieve app settings path ({windows_folder_id:?})");
                }
            }
            if fallback.is_empty() {
                // The POSIX default, also the fallback on Windows when the app
                // settings path could not be read.
                fallback = default_dir.to_string();
            }
            fallback
        } else {
            env_value
        };

        let effective_home = match home_dir {
            Some(path) => path.clone(),
            None => user_home_path(),
        };
        let environment = vec![
            EnvVar::new("HOME", effective_home.get_absolute_path()),
            EnvVar::new("USER", user.map_or_else(username, str::to_string)),
            EnvVar::new("HOSTNAME", self.hostname()),
        ];
        let expanded = env::expand_env_vars(&environment, &xdg_home);
        let resolved = FilePath::resolve_aliased_path(&expanded, &effective_home);

        if final_path {
            return resolved;
        }
        resolved.complete_path(APP_FOLDER)
    }

    /// The RStudio user config directory.
    ///
    /// On POSIX this is `~/.config/rstudio`, or `XDG_CONFIG_HOME`; on Windows,
    /// the roaming app-data folder. `RSTUDIO_CONFIG_HOME` overrides all of these
    /// with a final path.
    pub fn user_config_dir(&self, user: Option<&str>, home_dir: Option<&FilePath>) -> FilePath {
        self.resolve_xdg_dir(
            "RSTUDIO_CONFIG_HOME",
            "XDG_CONFIG_HOME",
            WinFolderId::RoamingAppData,
            "~/.config",
            user,
            home_dir,
        )
    }

    /// The RStudio user data directory.
    ///
    /// On POSIX this is `~/.local/share/rstudio`, or `XDG_DATA_HOME`; on Windows,
    /// the local app-data folder. `RSTUDIO_DATA_HOME` overrides all of these with
    /// a final path.
    pub fn user_data_dir(&self, user: Option<&str>, home_dir: Option<&FilePath>) -> FilePath {
        self.resolve_xdg_dir(
            "RSTUDIO_DATA_HOME",
            "XDG_DATA_HOME",
            WinFolderId::LocalAppData,
            "~/.local/share",
            user,
            home_dir,
        )
    }

    /// The RStudio system config directory.
    ///
    /// On POSIX this is `/etc/rstudio`, or `XDG_CONFIG_DIRS`; on Windows, the
    /// program-data folder. `RSTUDIO_CONFIG_DIR` overrides all of these with a
    /// final path.
    pub fn system_config_dir(&self) -> FilePath {
        if !cfg!(windows) && env::getenv("RSTUDIO_CONFIG_DIR").is_empty() {
            // POSIX allows multiple config roots. We have to select one, so
            // take the first that already contains our folder.
            let found = scan_search_path(|dir| {
                let resolved = FilePath::new(dir).complete_path(APP_FOLDER);
                resolved.exists().then_some(resolved)
            });
            if let Some(dir) = found {
                return dir;
            }
        }
        self.resolve_xdg_dir(
            "RSTUDIO_CONFIG_DIR",
            "XDG_CONFIG_DIRS",
            WinFolderId::ProgramData,
            "/etc",
            None,
            None,
        )
    }

    /// Locate a system configuration file.
    ///
    /// Checks each directory of the `XDG_CONFIG_DIRS` search path for the file
    /// and returns the first match. When no candidate exists, returns the path
    /// under [`system_config_dir`](Self::system_config_dir) where the file was
    /// expected, whether or not anything is there.
    pub fn system_config_file(&self, filename: &str) -> FilePath {
        if !cfg!(windows) && env::getenv("RSTUDIO_CONFIG_DIR").is_empty() {
            let found = scan_search_path(|dir| {
                let resolved = FilePath::new(dir)
                    .complete_path(APP_FOLDER)
                    .complete_child_path(filename);
                resolved.exists().then_some(resolved)
            });
            if let Some(file) = found {
                return file;
            }
        }
        self.system_config_dir().complete_child_path(filename)
    }

    /// Verify that the user config and data directories are usable.
    ///
    /// Purely diagnostic: an existing directory that is unwritable (or whose
    /// writability cannot be determined) is reported as a warning, and nothing
    /// is corrected. Invoke once during startup. Does nothing on Windows.
    pub fn verify_user_dirs(&self, user: Option<&str>, home_dir: Option<&FilePath>) {
        #[cfg(unix)]
        for dir in [
            self.user_config_dir(user, home_dir),
            self.user_data_dir(user, home_dir),
        ] {
            if !dir.exists() {
                continue;
            }
            match dir.is_writeable() {
                Ok(true) => {}
                Ok(false) => log::warn!(
                    "missing write permissions to {}; some features may not work correctly",
                    dir.get_absolute_path()
                ),
                Err(error) => {
                    log::warn!(
                        "could not access {} to check write permissions; some features may not work correctly",
                        dir.get_absolute_path()
                    );
                    log::error!("{error}");
                }
            }
        }
        #[cfg(not(unix))]
        let _ = (user, home_dir);
    }
}

/// Run `candidate` over each entry of the `XDG_CONFIG_DIRS` search path and
/// return its first result.
///
/// The variable is only treated as a search path when it actually contains a
/// separator; a single-entry value flows through the generic resolver instead.
fn scan_search_path<F>(mut candidate: F) -> Option<FilePath>
where
    F: FnMut(&str) -> Option<FilePath>,
{
    let dirs = env::getenv("XDG_CONFIG_DIRS");
    if !dirs.contains(SEARCH_PATH_SEPARATOR) {
        return None;
    }
    dirs.split(SEARCH_PATH_SEPARATOR)
        .find_map(|dir| candidate(dir))
}

/// Forward the XDG environment variables honored by the resolvers into a target
/// environment.
///
/// Forwarding keeps a consistent view of configuration across RStudio
/// processes, so a differing value already in the target is overwritten, with a
/// warning. An empty value is never forwarded over a previously set one.
pub fn forward_xdg_env_vars(environment: &mut Vec<EnvVar>) {
    for name in XDG_FORWARD_VARS {
        let value = env::getenv(name);
        if value.is_empty() {
            continue;
        }
        let old_value = env::get_var(environment, name);
        if !old_value.is_empty() && old_value != value {
            log::warn!("overriding {name}: '{old_value}' => '{value}'");
        }
        env::set_var(environment, name, &value);
    }
}
