// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Backup and transfer of Creative Cloud preferences.
//!
//! Backups copy every existing preference path of a release into a temporary
//! directory with `rsync`, and compress that directory into a timestamped zip
//! archive under `~/Library/Preferences/Prefer/CC/<app>[/<year>]`.
//!
//! Transfers copy preferences of one release year into another. Every path is
//! rewritten by replacing the base version, name, and year of the source
//! release with those of the destination release. Destination preferences are
//! backed up first.

use crate::{
    adobe::{AdobeError, CreativeCloudApp, Result},
    path::{match_owner, remove_dir_guarded, FileProbe, MacUser},
    syscall::{Invocation, Syscall},
};

use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::{debug, info, instrument};

/// Oldest release year preferences can be transferred between.
pub const OLDEST_TRANSFER_YEAR: i32 = 2015;

static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(2[0-9]{3})").expect("valid regex"));

/// Application argument split into catalog key and release year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppArgument {
    pub key: String,
    pub year: Option<i32>,
}

impl AppArgument {
    /// Sanitize free form application argument.
    ///
    /// `Adobe After Effects CC 2019` becomes key `after-effects` with year
    /// `2019`.
    pub fn parse(input: &str) -> Self {
        let year = YEAR
            .captures(input)
            .and_then(|captures| captures[1].parse::<i32>().ok());
        let without_year = YEAR.replace(input, "");
        let key = without_year
            .to_lowercase()
            .split_whitespace()
            .filter(|word| *word != "adobe" && *word != "cc")
            .collect::<Vec<_>>()
            .join("-");

        Self { key, year }
    }
}

/// Validate release years of a transfer.
///
/// # Errors
///
/// - Return [`AdobeError::MissingYear`] if a year is absent.
/// - Return [`AdobeError::InvalidYear`] if a year is not a number, or older
///   than [`OLDEST_TRANSFER_YEAR`].
/// - Return [`AdobeError::SameYear`] if both years are the same.
pub fn validate_years(from: Option<&str>, to: Option<&str>) -> Result<(i32, i32)> {
    let from = parse_year("from", from)?;
    let to = parse_year("to", to)?;
    if from == to {
        return Err(AdobeError::SameYear);
    }

    Ok((from, to))
}

fn parse_year(flag: &'static str, value: Option<&str>) -> Result<i32> {
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(AdobeError::MissingYear { flag })?;

    value
        .parse::<i32>()
        .ok()
        .filter(|year| *year >= OLDEST_TRANSFER_YEAR)
        .ok_or_else(|| AdobeError::InvalidYear {
            flag,
            value: value.to_string(),
            min: OLDEST_TRANSFER_YEAR,
        })
}

/// Backup directory of an application release.
pub fn backup_dir(user: &MacUser, key: &str, year: Option<i32>) -> PathBuf {
    let dir = user.prefer_dir().join("CC").join(key);
    match year {
        Some(year) => dir.join(year.to_string()),
        None => dir,
    }
}

/// Timestamp used in backup archive names.
pub fn backup_stamp() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M").to_string()
}

/// Outcome of a preference transfer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Archive holding destination preferences from before the transfer.
    pub backup: Option<PathBuf>,

    /// Source and destination of every copied preference.
    pub copied: Vec<(PathBuf, PathBuf)>,
}

/// Backup and transfer preferences of one user.
#[derive(Debug)]
pub struct PreferenceManager<'a, S, P>
where
    S: Syscall + ?Sized,
    P: FileProbe + ?Sized,
{
    user: &'a MacUser,
    syscall: &'a S,
    probe: &'a P,
}

impl<'a, S, P> PreferenceManager<'a, S, P>
where
    S: Syscall + ?Sized,
    P: FileProbe + ?Sized,
{
    pub fn new(user: &'a MacUser, syscall: &'a S, probe: &'a P) -> Self {
        Self { user, syscall, probe }
    }

    /// Backup preferences of release into `dest`.
    ///
    /// Returns path of the zip archive, or `None` if the release has no
    /// existing preferences to back up.
    ///
    /// # Errors
    ///
    /// - Return [`AdobeError::BackupDestination`] if `dest/tmp` is a file.
    /// - Return [`AdobeError::Syscall`] if `rsync` or `zip` fail.
    /// - Return [`AdobeError::MissingArchive`] if no archive was produced.
    /// - Return [`AdobeError::Guard`] if temporary directory cannot be removed.
    #[instrument(skip(self, app, dest), level = "debug")]
    pub fn backup(&self, app: &CreativeCloudApp, dest: &Path, stamp: &str) -> Result<Option<PathBuf>> {
        let existing = app
            .preferences()
            .into_iter()
            .map(|pref| self.user.home().join(pref))
            .filter(|path| self.probe.exists(path))
            .collect::<Vec<_>>();
        if existing.is_empty() {
            info!("no preferences to back up for {}", app.key());
            return Ok(None);
        }

        let tmp = dest.join("tmp");
        if tmp.exists() && !tmp.is_dir() {
            return Err(AdobeError::BackupDestination { path: tmp });
        }
        mkdirp::mkdirp(&tmp).map_err(|source| AdobeError::Io {
            source,
            action: "create",
            path: tmp.clone(),
        })?;

        for path in &existing {
            debug!("back up {:?}", path.display());
            let call = Invocation::new("rsync")
                .args(["-aP", "--ignore-times"])
                .arg(path)
                .arg(format!("{}/", tmp.display()));
            self.syscall.call_checked(&call)?;
        }

        let archive = dest.join(format!("backup-{stamp}.zip"));
        let call = Invocation::new("zip")
            .arg("-r")
            .arg(&archive)
            .arg(".")
            .current_dir(&tmp);
        self.syscall.call_checked(&call)?;
        if !self.probe.exists(&archive) {
            return Err(AdobeError::MissingArchive { path: archive });
        }

        remove_dir_guarded(&tmp, self.user.home())?;
        info!("backed up preferences to {:?}", archive.display());

        Ok(Some(archive))
    }

    /// Transfer preferences from one release year to another.
    ///
    /// # Errors
    ///
    /// - Return [`AdobeError::NoPreferences`] if source has no preference paths.
    /// - Return [`AdobeError::NoBaseVersion`] if a base version is unknown.
    /// - Return [`AdobeError::YearMismatch`] if only one release has a year.
    /// - Return [`AdobeError::NoName`] if a name cannot be determined.
    /// - Return any error of [`PreferenceManager::backup`], or of copying.
    #[instrument(skip(self, src, dst), level = "debug")]
    pub fn transfer(&self, src: &CreativeCloudApp, dst: &CreativeCloudApp, stamp: &str) -> Result<TransferReport> {
        let src_display = src.full_name(false).unwrap_or_else(|| src.key().to_string());
        let prefs = src.preferences();
        if prefs.is_empty() {
            return Err(AdobeError::NoPreferences { name: src_display });
        }

        let name = src.name(false).unwrap_or(src.key()).to_string();
        let (Some(src_version), Some(dst_version)) = (src.base_version(), dst.base_version()) else {
            return Err(AdobeError::NoBaseVersion { name });
        };

        if src.year().is_some() != dst.year().is_some() {
            return Err(AdobeError::YearMismatch { name });
        }

        let (Some(src_name), Some(dst_name)) = (src.name(false), dst.name(false)) else {
            return Err(AdobeError::NoName);
        };

        let mut replacements = vec![
            (src_version.to_string(), dst_version.to_string()),
            (src_name.to_string(), dst_name.to_string()),
        ];
        if let (Some(from), Some(to)) = (src.year(), dst.year()) {
            replacements.push((from.to_string(), to.to_string()));
        }

        let backup = self.backup(dst, &backup_dir(self.user, dst.key(), dst.year()), stamp)?;

        let mut report = TransferReport {
            backup,
            copied: Vec::new(),
        };
        for pref in prefs {
            let src_path = self.user.home().join(&pref);
            let dst_path = self.user.home().join(substitute(&pref, &replacements));
            if !self.probe.exists(&src_path) || src_path == dst_path {
                debug!("skip preference {pref:?}");
                continue;
            }

            self.copy(&src_path, &dst_path)?;
            report.copied.push((src_path, dst_path));
        }
        info!(
            "copied {} preferences from {src_display} to {}",
            report.copied.len(),
            dst.full_name(false).unwrap_or_default()
        );

        Ok(report)
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<()> {
        if self.probe.is_dir(src) {
            mkdirp::mkdirp(dst).map_err(|source| AdobeError::Io {
                source,
                action: "create",
                path: dst.to_path_buf(),
            })?;

            let call = Invocation::new("rsync")
                .args(["-aP", "--ignore-times"])
                .arg(format!("{}/", src.display()))
                .arg(format!("{}/", dst.display()));
            self.syscall.call_checked(&call)?;

            return Ok(());
        }

        if dst.is_file() {
            std::fs::remove_file(dst).map_err(|source| AdobeError::Io {
                source,
                action: "remove",
                path: dst.to_path_buf(),
            })?;
        }

        if let Some(parent) = dst.parent() {
            mkdirp::mkdirp(parent).map_err(|source| AdobeError::Io {
                source,
                action: "create",
                path: parent.to_path_buf(),
            })?;
        }

        std::fs::copy(src, dst).map_err(|source| AdobeError::Io {
            source,
            action: "copy",
            path: src.to_path_buf(),
        })?;

        match_owner(dst, src).map_err(|source| AdobeError::Io {
            source,
            action: "set ownership of",
            path: dst.to_path_buf(),
        })
    }
}

/// Apply replacements in order, each to the result of the previous one.
pub fn substitute(input: &str, replacements: &[(String, String)]) -> String {
    replacements
        .iter()
        .fold(input.to_string(), |acc, (search, replace)| acc.replace(search, replace))
}
