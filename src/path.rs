// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for the macOS user that a command runs
//! for, e.g., home directory, library directory, where Prefer keeps its
//! configuration files, and where the user's Dock property list lives.
//!
//! Every existence check made while resolving applications goes through
//! [`FileProbe`], so resolution logic can be exercised without a real
//! `/Applications` directory.

use std::{
    collections::HashSet,
    io,
    path::{Component, Path, PathBuf},
};
use tracing::debug;

/// Directory that holds user home directories on macOS.
pub const USERS_DIR: &str = "/Users";

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// The macOS user a command operates on.
///
/// Commands may run as root on behalf of another user through `--user`. In
/// that case every user relative path is derived from `/Users/<name>` rather
/// than the home directory of the calling process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacUser {
    name: String,
    home: PathBuf,
}

impl MacUser {
    /// Construct user with explicit name and home directory.
    pub fn new(name: impl Into<String>, home: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            home: home.into(),
        }
    }

    /// User by account name, homed under `/Users`.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let home = Path::new(USERS_DIR).join(&name);
        Self { name, home }
    }

    /// User running the current process.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`] if home directory path cannot be determined.
    pub fn current() -> Result<Self> {
        let home = home_dir()?;
        let name = std::env::var("USER")
            .ok()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                home.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .ok_or(NoWayHome)?;

        Ok(Self { name, home })
    }

    /// Select named user if given, current user otherwise.
    ///
    /// # Errors
    ///
    /// - Return [`NoWayHome`] if home directory path cannot be determined.
    pub fn from_option(name: Option<String>) -> Result<Self> {
        match name {
            Some(name) => Ok(Self::named(name)),
            None => Self::current(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// `~/Library`
    pub fn library_dir(&self) -> PathBuf {
        self.home.join("Library")
    }

    /// `~/Library/Preferences`
    pub fn preferences_dir(&self) -> PathBuf {
        self.library_dir().join("Preferences")
    }

    /// Directory Prefer stores its configuration files and backups in.
    pub fn prefer_dir(&self) -> PathBuf {
        self.preferences_dir().join("Prefer")
    }

    /// Default configuration file path for a command, e.g., `dock.yml`.
    pub fn config_path(&self, name: &str, ext: &str) -> PathBuf {
        self.prefer_dir().join(format!("{name}.{ext}"))
    }

    /// Property list backing the user's Dock.
    pub fn dock_plist(&self) -> PathBuf {
        self.preferences_dir().join("com.apple.dock.plist")
    }

    /// Expand leading tilde to this user's home directory.
    pub fn expand_tilde(&self, input: &str) -> String {
        shellexpand::tilde_with_context(input, || Some(self.home.to_string_lossy())).into_owned()
    }
}

/// Filesystem existence checks.
pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool {
        self.exists(path) && !self.is_dir(path)
    }
}

/// Probe the host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFs;

impl FileProbe for HostFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// In-memory filesystem for exercising resolution logic.
///
/// Registering a path also registers all of its ancestors as directories.
#[derive(Debug, Default, Clone)]
pub struct FakeFs {
    dirs: HashSet<PathBuf>,
    files: HashSet<PathBuf>,
}

impl FakeFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.insert_ancestors(&path);
        self.dirs.insert(path);
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.insert_ancestors(&path);
        self.files.insert(path);
        self
    }

    fn insert_ancestors(&mut self, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if !ancestor.as_os_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
    }
}

impl FileProbe for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        self.is_dir(path) || self.files.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }
}

/// Recursively delete a directory that is provably disposable.
///
/// Only directories strictly inside `/tmp`, the process temporary directory, or
/// the given user home may be removed. Paths with relative or parent components
/// are rejected outright. Missing directories are left alone.
///
/// # Errors
///
/// - Return [`GuardError::Refused`] if path is outside of the allowed roots.
/// - Return [`GuardError::Remove`] if removal itself fails.
pub fn remove_dir_guarded(path: &Path, home: &Path) -> Result<(), GuardError> {
    if !is_disposable(path, home) {
        return Err(GuardError::Refused {
            path: path.to_path_buf(),
        });
    }

    if !path.is_dir() {
        return Ok(());
    }

    debug!("remove directory {:?}", path.display());
    std::fs::remove_dir_all(path).map_err(|source| GuardError::Remove {
        source,
        path: path.to_path_buf(),
    })
}

fn is_disposable(path: &Path, home: &Path) -> bool {
    let plain = path.is_absolute()
        && path
            .components()
            .all(|c| matches!(c, Component::RootDir | Component::Normal(_)));
    if !plain {
        return false;
    }

    let temp = std::env::temp_dir();
    let disposable = [Path::new("/tmp"), temp.as_path(), home]
        .into_iter()
        .filter(|root| root.is_absolute() && root.parent().is_some())
        .any(|root| path.starts_with(root) && path != root);
    disposable
}

/// Give `path` the same owner and group as `reference`.
///
/// Commands commonly run as root on behalf of another user. Files they write
/// into that user's home must still belong to that user.
#[cfg(unix)]
pub fn match_owner(path: &Path, reference: &Path) -> io::Result<()> {
    use std::os::unix::fs::{chown, MetadataExt};

    let meta = std::fs::metadata(reference)?;
    chown(path, Some(meta.uid()), Some(meta.gid()))
}

#[cfg(not(unix))]
pub fn match_owner(_path: &Path, _reference: &Path) -> io::Result<()> {
    Ok(())
}

/// Refusal to delete a directory outside of the disposable roots.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("directory {:?} cannot be deleted by prefer", path.display())]
    Refused { path: PathBuf },

    #[error("failed to remove directory {:?}", path.display())]
    Remove {
        #[source]
        source: io::Error,
        path: PathBuf,
    },
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
