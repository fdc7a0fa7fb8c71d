// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Application locators.
//!
//! A __locator__ is a static lookup table that maps short keys, e.g.,
//! `photoshop` or `screen_sharing`, to applications installed on the system.
//! Each locator can tell whether it handles a key, find the newest installed
//! path for a key, and reverse an application name or path back into a key.
//!
//! Locators are tried in the order of [`Locator::ALL`]. The first one that
//! claims a key or name wins.
//!
//! # Adobe Applications
//!
//! Creative Cloud applications carry their release year in their install path,
//! e.g., `/Applications/Adobe Photoshop 2023/Adobe Photoshop 2023.app`. The
//! newest install is found by walking years downward from next year to
//! [`OLDEST_ADOBE_YEAR`]. Acrobat and Distiller do not follow that scheme, and
//! are found through a fixed list of known install paths instead.

use crate::path::{FileProbe, MacUser};

use chrono::Datelike;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::debug;

/// Oldest release year searched for Creative Cloud applications.
pub const OLDEST_ADOBE_YEAR: i32 = 2014;

const ADOBE_APPS: &[(&str, &str)] = &[
    ("photoshop", "Photoshop"),
    ("indesign", "InDesign"),
    ("illustrator", "Illustrator"),
    ("bridge", "Bridge"),
    ("acrobat", "Acrobat"),
    ("after_effects", "After Effects"),
    ("dimension", "Dimension"),
    ("premiere_pro", "Premiere Pro"),
    ("xd", "XD"),
    ("lightroom", "Lightroom"),
    ("distiller", "Distiller"),
];

const UTILITY_APPS: &[(&str, &str)] = &[
    ("screen_sharing", "Screen Sharing"),
    ("dvd_player", "DVD Player"),
    ("directory_utility", "Directory Utility"),
    ("archive_utility", "Archive Utility"),
    ("folder_actions", "Folder Actions Setup"),
    ("network_utility", "Network Utility"),
    ("raid", "RAID Utility"),
    ("storage", "Storage Management"),
    ("wireless_diagnostics", "Wireless Diagnostics"),
    ("image_utility", "System Image Utility"),
];

const UTILITY_DIR: &str = "/System/Library/CoreServices/Applications";

const ACROBAT_PATHS: &[&str] = &[
    "/Applications/Adobe Acrobat DC/Adobe Acrobat.app",
    "/Applications/Adobe Acrobat XI Pro/Adobe Acrobat Pro.app",
    "/Applications/Adobe Acrobat Reader DC.app",
    "/Applications/Adobe Acrobat.app",
];

const DISTILLER_PATHS: &[&str] = &[
    "/Applications/Adobe Acrobat DC/Acrobat Distiller.app",
    "/Applications/Adobe Acrobat XI Pro/Acrobat Distiller.app",
];

/// Info.plist locations of a yearly Creative Cloud release.
const ADOBE_YEAR_TEMPLATES: &[&str] = &[
    "/Applications/Adobe {name} {year}/Adobe {name} {year}.app/Contents/Info.plist",
    "/Applications/Adobe {name} CC {year}/Adobe {name} CC {year}.app/Contents/Info.plist",
    "/Applications/Adobe {name} {year}/Adobe {name}.app/Contents/Info.plist",
];

/// Info.plist location of a Creative Cloud application without a year.
const ADOBE_YEARLESS_TEMPLATE: &str = "/Applications/Adobe {name}/Adobe {name}.app/Contents/Info.plist";

static ADOBE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Adobe\s([A-Za-z\s]+)([0-9]+)").expect("valid regex"));

static UTILITY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/System/Library/CoreServices/Applications/([A-Za-z\s]+)").expect("valid regex")
});

/// Lookup table of known applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Adobe Creative Cloud applications, Acrobat, and Distiller.
    Adobe,

    /// Utilities bundled with macOS under CoreServices.
    Utility,
}

impl Locator {
    /// All locators in the order they are consulted.
    pub const ALL: [Locator; 2] = [Locator::Adobe, Locator::Utility];

    fn table(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Adobe => ADOBE_APPS,
            Self::Utility => UTILITY_APPS,
        }
    }

    /// Application name for a key this locator handles.
    pub fn name_of(&self, key: &str) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(known, _)| *known == key)
            .map(|(_, name)| *name)
    }

    /// Check if locator knows about key.
    pub fn handles(&self, key: &str) -> bool {
        self.name_of(key).is_some()
    }

    /// Newest installed application path for key.
    ///
    /// Searches Creative Cloud releases from `current_year + 1` down to
    /// [`OLDEST_ADOBE_YEAR`]. Returns `None` if nothing is installed, or if the
    /// key is not handled by this locator.
    pub fn latest<P>(&self, key: &str, probe: &P, current_year: i32) -> Option<PathBuf>
    where
        P: FileProbe + ?Sized,
    {
        let name = self.name_of(key)?;
        match self {
            Self::Adobe => match name {
                "Acrobat" => first_existing(ACROBAT_PATHS, probe),
                "Distiller" => first_existing(DISTILLER_PATHS, probe),
                _ => latest_adobe(name, probe, current_year),
            },
            Self::Utility => Some(Path::new(UTILITY_DIR).join(format!("{name}.app"))),
        }
    }

    /// Reverse application name or path into a key.
    pub fn reverse(&self, name: &str) -> Option<&'static str> {
        match self {
            Self::Adobe => {
                if name.contains("Acrobat Distiller") {
                    return Some("distiller");
                }

                if name.contains("Adobe Acrobat") {
                    return Some("acrobat");
                }

                let captures = ADOBE_NAME.captures(name)?;
                let long = captures[1].replace("CC", "");
                self.key_of(long.trim())
            }
            Self::Utility => {
                let captures = UTILITY_NAME.captures(name)?;
                self.key_of(&captures[1])
            }
        }
    }

    fn key_of(&self, name: &str) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(_, known)| *known == name)
            .map(|(key, _)| *key)
    }
}

/// Reverse name through every locator in order.
pub fn reverse_lookup(name: &str) -> Option<&'static str> {
    Locator::ALL
        .iter()
        .find_map(|locator| locator.reverse(name))
}

/// Installed path of a Creative Cloud application for one release year.
pub fn adobe_app_for_year<P>(name: &str, year: i32, probe: &P) -> Option<PathBuf>
where
    P: FileProbe + ?Sized,
{
    let year = year.to_string();
    ADOBE_YEAR_TEMPLATES
        .iter()
        .map(|template| template.replace("{name}", name).replace("{year}", &year))
        .find(|plist| probe.exists(Path::new(plist)))
        .and_then(|plist| bundle_of_info_plist(Path::new(&plist)))
}

fn latest_adobe<P>(name: &str, probe: &P, current_year: i32) -> Option<PathBuf>
where
    P: FileProbe + ?Sized,
{
    for year in (OLDEST_ADOBE_YEAR..=current_year + 1).rev() {
        if let Some(path) = adobe_app_for_year(name, year, probe) {
            debug!("found Adobe {name} {year} at {:?}", path.display());
            return Some(path);
        }
    }

    let plist = ADOBE_YEARLESS_TEMPLATE.replace("{name}", name);
    if probe.exists(Path::new(&plist)) {
        return bundle_of_info_plist(Path::new(&plist));
    }

    None
}

fn first_existing<P>(candidates: &[&str], probe: &P) -> Option<PathBuf>
where
    P: FileProbe + ?Sized,
{
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| probe.is_dir(path))
}

// INVARIANT: "<bundle>.app/Contents/Info.plist" maps back to "<bundle>.app".
fn bundle_of_info_plist(plist: &Path) -> Option<PathBuf> {
    plist.parent()?.parent().map(Path::to_path_buf)
}

/// Resolve short application references into live paths.
///
/// Resolution never fails. When nothing better is known a best guess path is
/// returned, and the caller checks whether it exists.
#[derive(Debug)]
pub struct AppResolver<'a, P>
where
    P: FileProbe + ?Sized,
{
    user: &'a MacUser,
    probe: &'a P,
    current_year: i32,
}

impl<'a, P> AppResolver<'a, P>
where
    P: FileProbe + ?Sized,
{
    /// Construct resolver for user, searching up to next calendar year.
    pub fn new(user: &'a MacUser, probe: &'a P) -> Self {
        Self {
            user,
            probe,
            current_year: chrono::Local::now().year(),
        }
    }

    /// Pin year that release searches are relative to.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    pub fn user(&self) -> &MacUser {
        self.user
    }

    pub fn probe(&self) -> &P {
        self.probe
    }

    /// Resolve reference into a path.
    ///
    /// 1. Expand `~` to user's home.
    /// 2. Absolute paths, and names ending in `.app` are taken as is. An
    ///    absolute path without extension that does not exist, but names an
    ///    existing bundle once `.app` is appended, resolves to that bundle.
    /// 3. Keys claimed by a locator resolve to newest installed release.
    /// 4. Otherwise `~/Applications/<name>.app` if it exists, or
    ///    `/Applications/<name>.app`.
    pub fn resolve(&self, reference: &str) -> String {
        let expanded = self.user.expand_tilde(reference);
        if expanded.starts_with('/') {
            let path = Path::new(&expanded);
            if !self.probe.exists(path) && path.extension().is_none() {
                let bundle = PathBuf::from(format!("{}.app", expanded.trim_end_matches('/')));
                if self.probe.is_dir(&bundle) {
                    return bundle.to_string_lossy().into_owned();
                }
            }

            return expanded;
        }

        if expanded.ends_with(".app") {
            return expanded;
        }

        for locator in Locator::ALL {
            if locator.handles(&expanded) {
                if let Some(path) = locator.latest(&expanded, self.probe, self.current_year) {
                    return path.to_string_lossy().into_owned();
                }
            }
        }

        let user_app = self
            .user
            .home()
            .join("Applications")
            .join(format!("{expanded}.app"));
        if self.probe.is_dir(&user_app) {
            return user_app.to_string_lossy().into_owned();
        }

        format!("/Applications/{expanded}.app")
    }
}
