// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Adobe Creative Cloud applications.
//!
//! Everything prefer knows about a Creative Cloud application comes from an
//! embedded catalog, keyed by lowercase dashed application keys, e.g.,
//! `photoshop` or `after-effects`. Each catalog entry lists the SAP code, the
//! display names the application was shipped under (newest naming first), an
//! install path template, the base version of every release year, and the user
//! preference paths worth backing up.
//!
//! A [`CreativeCloudApp`] binds a catalog entry to an optional release year,
//! and resolves where that release is installed exactly once, at construction.

pub mod prefs;

use crate::{
    locate::OLDEST_ADOBE_YEAR,
    path::FileProbe,
    syscall::{Invocation, Syscall},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const EMBEDDED_CATALOG: &str = include_str!("../resources/cc.json");

/// Info.plist locations of an installed release.
const INSTALL_TEMPLATES: &[&str] = &[
    "/Applications/Adobe {name} {year}/Adobe {name} {year}.app/Contents/Info.plist",
    "/Applications/Adobe {name} {year}/Adobe {name}.app/Contents/Info.plist",
    "/Applications/Adobe {name}/Adobe {name}.app/Contents/Info.plist",
];

const UNINSTALL_TEMPLATE: &str = "/Library/Application\\ Support/Adobe/Adobe\\ Desktop\\ Common/HDBox/Setup --uninstall=1 --sapCode={sap} --baseVersion={version} --deleteUserPreferences=false --platform=osx10-64";

/// Releases before this year still carry the "CC" suffix in their name.
const CC_SUFFIX_DROPPED: i32 = 2020;

/// Catalog entry of one Creative Cloud application.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Product code used by Adobe's uninstall tooling.
    pub sap: String,

    /// Candidate display names, newest naming first.
    pub names: Vec<String>,

    /// Install path template relative to `/Applications`.
    pub path: String,

    /// Base version to release year, or to name for yearless applications.
    #[serde(default)]
    pub base_versions: IndexMap<String, String>,

    /// Preference path templates relative to the user's home directory.
    #[serde(default)]
    pub preferences: Vec<String>,
}

/// Catalog of known Creative Cloud applications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    apps: IndexMap<String, CatalogEntry>,
}

impl Catalog {
    /// Catalog shipped inside the prefer binary.
    ///
    /// # Errors
    ///
    /// - Return [`AdobeError::Catalog`] if embedded catalog is malformed.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Parse catalog from JSON data.
    ///
    /// # Errors
    ///
    /// - Return [`AdobeError::Catalog`] if data is malformed.
    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }

    /// Lookup entry by application key, e.g., `After Effects` or
    /// `after-effects`.
    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.apps.get(&normalize_app_key(key))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }
}

/// Normalize application key to lowercase with dashes for spaces.
pub fn normalize_app_key(key: &str) -> String {
    key.trim().to_lowercase().replace(' ', "-")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Install {
    name: String,
    path: PathBuf,
}

/// Creative Cloud application bound to a release year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreativeCloudApp {
    key: String,
    year: Option<i32>,
    entry: CatalogEntry,
    estimated_name: String,
    install: Option<Install>,
}

impl CreativeCloudApp {
    /// Locate application release.
    ///
    /// The installed name and path are resolved through Info.plist templates
    /// for every candidate name first. Failing that, the estimated install path
    /// from the catalog is used if it exists. Otherwise the application is
    /// left unresolved, and only catalog derived information is available.
    ///
    /// # Errors
    ///
    /// - Return [`AdobeError::UnknownApp`] if catalog has no such application.
    pub fn locate<P>(catalog: &Catalog, key: &str, year: Option<i32>, probe: &P) -> Result<Self>
    where
        P: FileProbe + ?Sized,
    {
        let key = normalize_app_key(key);
        let entry = catalog
            .get(&key)
            .cloned()
            .ok_or_else(|| AdobeError::UnknownApp { key: key.clone() })?;

        let estimated_name = estimated_name(&entry, year);
        let install = installed(&entry, year, probe).or_else(|| {
            let path = Path::new("/Applications").join(fill(&entry.path, &estimated_name, year));
            probe.is_dir(&path).then(|| Install {
                name: estimated_name.clone(),
                path,
            })
        });
        debug!("locate {key} {year:?}: {install:?}");

        Ok(Self {
            key,
            year,
            entry,
            estimated_name,
            install,
        })
    }

    /// Locate newest installed release when no year is given.
    ///
    /// Yearless installs win. Otherwise release years are searched from
    /// `current_year + 1` down to the oldest supported year. If nothing is
    /// installed at all, an unresolved yearless application is returned.
    ///
    /// # Errors
    ///
    /// - Return [`AdobeError::UnknownApp`] if catalog has no such application.
    pub fn locate_latest<P>(catalog: &Catalog, key: &str, probe: &P, current_year: i32) -> Result<Self>
    where
        P: FileProbe + ?Sized,
    {
        let yearless = Self::locate(catalog, key, None, probe)?;
        if yearless.is_installed() || !yearless.entry.path.contains("{year}") {
            return Ok(yearless);
        }

        for year in (OLDEST_ADOBE_YEAR..=current_year + 1).rev() {
            let app = Self::locate(catalog, key, Some(year), probe)?;
            if app.is_installed() {
                return Ok(app);
            }
        }

        Ok(yearless)
    }

    /// Catalog key, e.g., `after-effects`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn sap(&self) -> &str {
        &self.entry.sap
    }

    pub fn is_installed(&self) -> bool {
        self.install.is_some()
    }

    /// Install path, if installed.
    pub fn path(&self) -> Option<&Path> {
        self.install.as_ref().map(|install| install.path.as_path())
    }

    /// Display name, e.g., `Photoshop`.
    ///
    /// With `only_installed`, uninstalled applications have no name. Otherwise
    /// the estimated name for the release year is given.
    pub fn name(&self, only_installed: bool) -> Option<&str> {
        match &self.install {
            Some(install) => Some(&install.name),
            None if !only_installed => Some(&self.estimated_name),
            None => None,
        }
    }

    /// Display name with release year, e.g., `Photoshop 2023`.
    pub fn full_name(&self, only_installed: bool) -> Option<String> {
        let name = self.name(only_installed)?;
        let full = match self.year {
            Some(year) => format!("{name} {year}"),
            None => name.to_string(),
        };

        Some(full)
    }

    /// Base version of release, matched by year, or by name when yearless.
    pub fn base_version(&self) -> Option<&str> {
        let criteria = match self.year {
            Some(year) => year.to_string(),
            None => self.name(false)?.to_string(),
        };

        self.entry
            .base_versions
            .iter()
            .filter(|(_, value)| **value == criteria)
            .map(|(version, _)| version.as_str())
            .last()
    }

    /// Preference paths relative to the user's home directory.
    pub fn preferences(&self) -> Vec<String> {
        let name = self.name(false).unwrap_or_default();
        let version = self.base_version().unwrap_or_default();
        self.entry
            .preferences
            .iter()
            .map(|template| fill(template, name, self.year).replace("{version}", version))
            .collect()
    }

    /// Shell command that uninstalls this release.
    pub fn uninstall(&self) -> String {
        UNINSTALL_TEMPLATE
            .replace("{sap}", self.sap())
            .replace("{version}", self.base_version().unwrap_or_default())
    }

    /// Bundle version of installed release, read through `defaults`.
    ///
    /// # Errors
    ///
    /// - Return [`AdobeError::Syscall`] if `defaults` cannot be run.
    pub fn version<S>(&self, syscall: &S) -> Result<Option<String>>
    where
        S: Syscall + ?Sized,
    {
        let Some(path) = self.path() else {
            return Ok(None);
        };

        let call = Invocation::new("defaults")
            .arg("read")
            .arg(path.join("Contents").join("Info.plist"))
            .arg("CFBundleVersion");
        let output = syscall.call(&call)?;
        let version = output.stdout.trim();
        if !output.success() || version.is_empty() {
            return Ok(None);
        }

        Ok(Some(version.to_string()))
    }

    /// Information report as printed by `adobe:info`.
    ///
    /// # Errors
    ///
    /// - Return [`AdobeError::Syscall`] if `defaults` cannot be run.
    pub fn report<S>(&self, syscall: &S) -> Result<AppReport>
    where
        S: Syscall + ?Sized,
    {
        Ok(AppReport {
            name: self.name(true).map(str::to_string),
            full_name: self.full_name(true),
            sap: self.sap().to_string(),
            preferences: self.preferences(),
            path: self.path().map(Path::to_path_buf),
            year: self.year,
            base_version: self.base_version().map(str::to_string),
            version: self.version(syscall)?,
            uninstall: self.uninstall(),
        })
    }
}

fn estimated_name(entry: &CatalogEntry, year: Option<i32>) -> String {
    let legacy = year.is_none_or(|year| year < CC_SUFFIX_DROPPED);
    let name = if legacy {
        entry.names.get(1).or(entry.names.first())
    } else {
        entry.names.first()
    };

    name.cloned().unwrap_or_default()
}

fn installed<P>(entry: &CatalogEntry, year: Option<i32>, probe: &P) -> Option<Install>
where
    P: FileProbe + ?Sized,
{
    entry.names.iter().find_map(|name| {
        INSTALL_TEMPLATES.iter().find_map(|template| {
            let plist = PathBuf::from(fill(template, name, year));
            if !probe.exists(&plist) {
                return None;
            }

            let path = plist.parent()?.parent()?.to_path_buf();
            Some(Install {
                name: name.clone(),
                path,
            })
        })
    })
}

// INVARIANT: Yearless releases drop the separator in front of {year}.
fn fill(template: &str, name: &str, year: Option<i32>) -> String {
    let filled = template.replace("{name}", name);
    match year {
        Some(year) => filled.replace("{year}", &year.to_string()),
        None => filled.replace(" {year}", "").replace("{year}", ""),
    }
}

/// Information about one release, serialized as JSON by `adobe:info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppReport {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub sap: String,
    pub preferences: Vec<String>,
    pub path: Option<PathBuf>,
    pub year: Option<i32>,
    #[serde(rename = "baseVersion")]
    pub base_version: Option<String>,
    pub version: Option<String>,
    pub uninstall: String,
}

/// Creative Cloud error types.
#[derive(Debug, thiserror::Error)]
pub enum AdobeError {
    /// Catalog has no entry for application.
    #[error("unknown Creative Cloud application {key:?}")]
    UnknownApp { key: String },

    /// Application release is not installed.
    #[error("could not locate {name}")]
    NotInstalled { name: String },

    /// Catalog data is malformed.
    #[error(transparent)]
    Catalog(#[from] serde_json::Error),

    /// Backup destination exists, but is not a directory.
    #[error("could not create backup destination directory {:?}", path.display())]
    BackupDestination { path: PathBuf },

    /// Compressing a backup did not produce an archive.
    #[error("could not compress the backup after copying into {:?}", path.display())]
    MissingArchive { path: PathBuf },

    /// Year given for a transfer is not a valid release year.
    #[error("you must use a year of at least {min} for --{flag}, got {value:?}")]
    InvalidYear {
        flag: &'static str,
        value: String,
        min: i32,
    },

    /// Year missing for a transfer.
    #[error("you must use --{flag} to indicate the year to copy preferences {flag}")]
    MissingYear { flag: &'static str },

    /// Transfer source and destination years are the same.
    #[error("you must indicate a different year for --from and --to")]
    SameYear,

    /// Source release has no preference paths.
    #[error("could not locate preferences for {name}")]
    NoPreferences { name: String },

    /// Base version of a release is unknown.
    #[error("could not verify versions for {name}")]
    NoBaseVersion { name: String },

    /// Only one of the releases carries a year.
    #[error("could not verify years for {name}")]
    YearMismatch { name: String },

    /// Name of a release cannot be determined.
    #[error("could not verify names for these applications")]
    NoName,

    /// Filesystem operation on preferences fails.
    #[error("failed to {action} {:?}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        action: &'static str,
        path: PathBuf,
    },

    /// Refusal or failure to remove temporary backup directory.
    #[error(transparent)]
    Guard(#[from] crate::path::GuardError),

    /// External command fails.
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = AdobeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        path::FakeFs,
        syscall::{FakeSyscall, SyscallOutput},
    };
    use pretty_assertions::assert_eq;

    fn catalog() -> Catalog {
        Catalog::embedded().unwrap()
    }

    #[test]
    fn embedded_catalog_parses() {
        let catalog = catalog();

        assert!(catalog.get("photoshop").is_some());
        assert_eq!(catalog.get("After Effects").map(|entry| entry.sap.as_str()), Some("AEFT"));
        assert!(catalog.get("paint").is_none());
    }

    #[test]
    fn unknown_app_is_rejected() {
        let result = CreativeCloudApp::locate(&catalog(), "paint", None, &FakeFs::new());
        assert!(matches!(result, Err(AdobeError::UnknownApp { .. })));
    }

    #[test]
    fn installed_release_resolves_name_and_path() -> anyhow::Result<()> {
        let fs = FakeFs::new()
            .with_file("/Applications/Adobe Photoshop CC 2019/Adobe Photoshop CC 2019.app/Contents/Info.plist");
        let app = CreativeCloudApp::locate(&catalog(), "photoshop", Some(2019), &fs)?;

        assert_eq!(app.name(true), Some("Photoshop CC"));
        assert_eq!(app.full_name(true), Some("Photoshop CC 2019".into()));
        assert_eq!(
            app.path(),
            Some(Path::new("/Applications/Adobe Photoshop CC 2019/Adobe Photoshop CC 2019.app"))
        );
        assert_eq!(app.base_version(), Some("20.0"));
        assert_eq!(
            app.preferences(),
            [
                "Library/Preferences/Adobe Photoshop CC 2019 Settings",
                "Library/Application Support/Adobe/Adobe Photoshop CC 2019",
            ]
        );

        Ok(())
    }

    #[test]
    fn estimated_path_is_used_when_directory_exists() -> anyhow::Result<()> {
        let fs = FakeFs::new().with_dir("/Applications/Adobe Illustrator 2023/Adobe Illustrator.app");
        let app = CreativeCloudApp::locate(&catalog(), "illustrator", Some(2023), &fs)?;

        assert!(app.is_installed());
        assert_eq!(app.name(true), Some("Illustrator"));

        Ok(())
    }

    #[test]
    fn uninstalled_release_only_has_estimates() -> anyhow::Result<()> {
        let app = CreativeCloudApp::locate(&catalog(), "indesign", Some(2018), &FakeFs::new())?;

        assert!(!app.is_installed());
        assert_eq!(app.name(true), None);
        assert_eq!(app.name(false), Some("InDesign CC"));
        assert_eq!(app.full_name(false), Some("InDesign CC 2018".into()));
        assert_eq!(app.preferences()[0], "Library/Preferences/Adobe InDesign/Version 13.0");
        assert_eq!(
            app.uninstall(),
            "/Library/Application\\ Support/Adobe/Adobe\\ Desktop\\ Common/HDBox/Setup --uninstall=1 --sapCode=IDSN --baseVersion=13.0 --deleteUserPreferences=false --platform=osx10-64"
        );

        Ok(())
    }

    #[test]
    fn yearless_base_version_matches_name() -> anyhow::Result<()> {
        let fs = FakeFs::new().with_file("/Applications/Adobe XD/Adobe XD.app/Contents/Info.plist");
        let app = CreativeCloudApp::locate(&catalog(), "xd", None, &fs)?;

        assert_eq!(app.full_name(true), Some("XD".into()));
        assert_eq!(app.base_version(), Some("57.0"));

        Ok(())
    }

    #[test]
    fn locate_latest_finds_newest_release() -> anyhow::Result<()> {
        let fs = FakeFs::new()
            .with_file("/Applications/Adobe Bridge 2022/Adobe Bridge 2022.app/Contents/Info.plist")
            .with_file("/Applications/Adobe Bridge 2024/Adobe Bridge 2024.app/Contents/Info.plist");
        let app = CreativeCloudApp::locate_latest(&catalog(), "bridge", &fs, 2025)?;

        assert_eq!(app.year(), Some(2024));
        assert_eq!(app.base_version(), Some("14.0"));

        Ok(())
    }

    #[test]
    fn report_reads_bundle_version() -> anyhow::Result<()> {
        let fs = FakeFs::new()
            .with_file("/Applications/Adobe Photoshop 2024/Adobe Photoshop 2024.app/Contents/Info.plist");
        let syscall = FakeSyscall::new().respond_to("defaults", SyscallOutput::ok("25.11.0\n"));
        let app = CreativeCloudApp::locate(&catalog(), "photoshop", Some(2024), &fs)?;

        let report = app.report(&syscall)?;
        let json = serde_json::to_value(&report)?;

        assert_eq!(report.version.as_deref(), Some("25.11.0"));
        assert_eq!(json["baseVersion"], "25.0");
        assert_eq!(json["full_name"], "Photoshop 2024");
        assert_eq!(
            syscall.calls()[0].arg_strings(),
            [
                "read",
                "/Applications/Adobe Photoshop 2024/Adobe Photoshop 2024.app/Contents/Info.plist",
                "CFBundleVersion",
            ]
        );

        Ok(())
    }
}
