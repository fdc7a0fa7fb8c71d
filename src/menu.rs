// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Menu bar extras.
//!
//! Menu extras live as `<Name>.menu` bundles under CoreServices. Adding one
//! registers it in the user's `com.apple.systemuiserver` domain, marks its
//! status item visible, and opens it as that user.
//!
//! Names are matched loosely. When no bundle has the exact name, a case
//! insensitive match is taken as is, and otherwise close names are offered as
//! alternatives.

use crate::{
    path::{match_owner, FileProbe, MacUser},
    syscall::{Invocation, Syscall},
};

use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// Directory holding menu extra bundles.
pub const MENU_EXTRAS_DIR: &str = "/System/Library/CoreServices/Menu Extras";

const SYSTEM_UI_SERVER: &str = "com.apple.systemuiserver";
const THRESHOLD: usize = 1000;

/// Menu extra bundle that exists on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuExtra {
    pub name: String,
    pub path: PathBuf,
}

impl MenuExtra {
    /// Key of defaults entry controlling visibility of this menu extra.
    pub fn status_key(&self) -> String {
        format!("NSStatusItem Visible com.apple.menuextra.{}", self.name.to_lowercase())
    }
}

/// Result of looking for alternatives to a menu name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alternatives {
    /// Name matches a bundle apart from case.
    Exact(String),

    /// Close names in natural order, possibly none.
    Similar(Vec<String>),
}

/// Directory of menu extra bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuExtras {
    dir: PathBuf,
}

impl Default for MenuExtras {
    fn default() -> Self {
        Self::new(MENU_EXTRAS_DIR)
    }
}

impl MenuExtras {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Bundle path for menu name.
    pub fn menu_path(&self, menu: &str) -> PathBuf {
        self.dir.join(format!("{menu}.menu"))
    }

    /// Find menu extra by name.
    ///
    /// # Errors
    ///
    /// - Return [`MenuError::NotFound`] if no bundle has that name, listing
    ///   close alternatives when there are any.
    /// - Return [`MenuError::Pattern`] if the directory cannot be globbed.
    pub fn find<P>(&self, menu: &str, probe: &P) -> Result<MenuExtra>
    where
        P: FileProbe + ?Sized,
    {
        let path = self.menu_path(menu);
        if probe.exists(&path) {
            return Ok(MenuExtra {
                name: menu.to_string(),
                path,
            });
        }

        match self.alternatives(menu)? {
            Alternatives::Exact(name) => {
                debug!("use {name:?} for {menu:?}");
                let path = self.menu_path(&name);
                Ok(MenuExtra { name, path })
            }
            Alternatives::Similar(alternatives) => Err(MenuError::NotFound {
                menu: menu.to_string(),
                alternatives,
            }),
        }
    }

    /// Look for bundles with names close to menu.
    ///
    /// Names containing the menu (ignoring case) always qualify. Other names
    /// qualify when within a Levenshtein distance of a third of the menu's
    /// length, or when their bundle path contains the menu.
    ///
    /// # Errors
    ///
    /// - Return [`MenuError::Pattern`] if the directory cannot be globbed.
    pub fn alternatives(&self, menu: &str) -> Result<Alternatives> {
        let pattern = format!("{}/*.menu", glob::Pattern::escape(&self.dir.to_string_lossy()));
        let needle = menu.to_lowercase();

        let mut scored: Vec<(String, usize)> = Vec::new();
        for file in glob::glob(&pattern)?.filter_map(std::result::Result::ok) {
            let Some(base) = file.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
                continue;
            };

            if base.to_lowercase() == needle {
                return Ok(Alternatives::Exact(base));
            }

            if base.to_lowercase().contains(&needle) {
                scored.push((base, 1));
                continue;
            }

            let distance = strsim::levenshtein(menu, &base);
            let close = distance * 3 <= menu.len();
            let in_path = !menu.is_empty() && file.to_string_lossy().contains(menu);
            if close || in_path {
                scored.push((base, distance));
            }
        }

        let mut names = scored
            .into_iter()
            .filter(|(_, score)| *score < 2 * THRESHOLD)
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        names.sort_by_key(|name| name.to_lowercase());

        Ok(Alternatives::Similar(names))
    }
}

/// Register and launch menu extras for one user.
#[derive(Debug)]
pub struct MenuInstaller<'a, S, P>
where
    S: Syscall + ?Sized,
    P: FileProbe + ?Sized,
{
    user: &'a MacUser,
    syscall: &'a S,
    probe: &'a P,
}

impl<'a, S, P> MenuInstaller<'a, S, P>
where
    S: Syscall + ?Sized,
    P: FileProbe + ?Sized,
{
    pub fn new(user: &'a MacUser, syscall: &'a S, probe: &'a P) -> Self {
        Self { user, syscall, probe }
    }

    /// User defaults domain of the menu bar, without `.plist`.
    pub fn domain(&self) -> PathBuf {
        self.user.preferences_dir().join(SYSTEM_UI_SERVER)
    }

    /// Register menu extra, make it visible, and launch it.
    ///
    /// # Errors
    ///
    /// - Return [`MenuError::Syscall`] if `defaults`, `id`, or `launchctl`
    ///   fail.
    /// - Return [`MenuError::MissingDomain`] if writing defaults did not
    ///   produce the domain property list.
    /// - Return [`MenuError::InvalidUid`] if user id cannot be determined.
    #[instrument(skip(self), level = "debug")]
    pub fn add(&self, extra: &MenuExtra) -> Result<()> {
        let file = extra.path.to_string_lossy().into_owned();
        self.write_default("menuExtras", &["-array-add", file.as_str()])?;
        self.write_default(&extra.status_key(), &["-bool", "true"])?;

        let uid = self.uid()?;
        let call = Invocation::new("launchctl")
            .args(["asuser", uid.as_str(), "open"])
            .arg(&extra.path);
        self.syscall.call_checked(&call)?;
        info!("added menu extra {}", extra.name);

        Ok(())
    }

    fn write_default(&self, key: &str, value: &[&str]) -> Result<()> {
        let domain = self.domain();
        let call = Invocation::new("defaults")
            .arg("write")
            .arg(&domain)
            .arg(key)
            .args(value.iter().copied());
        self.syscall.call_checked(&call)?;

        let plist = domain.with_extension("plist");
        if !self.probe.exists(&plist) {
            return Err(MenuError::MissingDomain { path: plist });
        }

        if let Err(error) = match_owner(&plist, &self.user.library_dir()) {
            warn!("cannot hand {:?} to {}: {error}", plist.display(), self.user.name());
        }

        Ok(())
    }

    fn uid(&self) -> Result<String> {
        let output = self
            .syscall
            .call_checked(&Invocation::new("id").args(["-u", self.user.name()]))?;
        let uid = output.stdout.trim();
        if uid.is_empty() || !uid.chars().all(|c| c.is_ascii_digit()) {
            return Err(MenuError::InvalidUid {
                output: uid.to_string(),
            });
        }

        Ok(uid.to_string())
    }
}

fn not_found_message(menu: &str, alternatives: &[String]) -> String {
    if alternatives.is_empty() {
        format!("the menu {menu:?} was not found")
    } else {
        format!(
            "the menu {menu:?} was not found, did you mean one of: {}?",
            alternatives.join(", ")
        )
    }
}

/// Menu extra error types.
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    /// No bundle with that name exists.
    #[error("{}", not_found_message(.menu, .alternatives))]
    NotFound {
        menu: String,
        alternatives: Vec<String>,
    },

    /// Defaults domain property list was not produced.
    #[error("setting default for domain failed, {:?} does not exist", path.display())]
    MissingDomain { path: PathBuf },

    /// `id` printed something other than a user id.
    #[error("cannot determine user id from {output:?}")]
    InvalidUid { output: String },

    /// Menu extra directory cannot be globbed.
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    /// External command fails.
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = MenuError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        path::{FakeFs, HostFs},
        syscall::{FakeSyscall, SyscallOutput},
    };
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const MENUS: &[&str] = &["Battery", "Bluetooth", "Clock", "Displays", "TextInput", "Volume", "VPN"];

    fn touch_menus(dir: &Path, names: &[&str]) -> std::io::Result<()> {
        for name in names {
            std::fs::create_dir_all(dir.join(format!("{name}.menu")))?;
        }

        Ok(())
    }

    #[test]
    fn exact_case_insensitive_match() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch_menus(dir.path(), MENUS)?;
        let extras = MenuExtras::new(dir.path());

        assert_eq!(extras.alternatives("battery")?, Alternatives::Exact("Battery".into()));

        let extra = extras.find("vpn", &FakeFs::new())?;
        assert_eq!(extra.name, "VPN");
        assert_eq!(extra.path, dir.path().join("VPN.menu"));

        Ok(())
    }

    #[test]
    fn containment_and_distance_alternatives() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch_menus(dir.path(), MENUS)?;
        let extras = MenuExtras::new(dir.path());

        assert_eq!(
            extras.alternatives("Blue")?,
            Alternatives::Similar(vec!["Bluetooth".into()])
        );
        assert_eq!(
            extras.alternatives("Volumr")?,
            Alternatives::Similar(vec!["Volume".into()])
        );
        assert_eq!(
            extras.alternatives("PLAY")?,
            Alternatives::Similar(vec!["Displays".into()])
        );

        Ok(())
    }

    #[test]
    fn unknown_menu_lists_nothing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        touch_menus(dir.path(), MENUS)?;
        let extras = MenuExtras::new(dir.path());

        let error = extras.find("Weather", &HostFs).unwrap_err();
        assert_eq!(error.to_string(), r#"the menu "Weather" was not found"#);

        let error = extras.find("Blue", &HostFs).unwrap_err();
        assert_eq!(
            error.to_string(),
            r#"the menu "Blue" was not found, did you mean one of: Bluetooth?"#
        );

        Ok(())
    }

    #[test]
    fn add_writes_defaults_and_launches() -> anyhow::Result<()> {
        let user = MacUser::named("alice");
        let fs = FakeFs::new().with_file("/Users/alice/Library/Preferences/com.apple.systemuiserver.plist");
        let syscall = FakeSyscall::new().respond_to("id", SyscallOutput::ok("501\n"));
        let installer = MenuInstaller::new(&user, &syscall, &fs);
        let extra = MenuExtra {
            name: "Battery".into(),
            path: PathBuf::from("/System/Library/CoreServices/Menu Extras/Battery.menu"),
        };

        installer.add(&extra)?;

        let defaults = syscall.calls_to("defaults");
        assert_eq!(
            defaults[0].arg_strings(),
            [
                "write",
                "/Users/alice/Library/Preferences/com.apple.systemuiserver",
                "menuExtras",
                "-array-add",
                "/System/Library/CoreServices/Menu Extras/Battery.menu",
            ]
        );
        assert_eq!(
            defaults[1].arg_strings(),
            [
                "write",
                "/Users/alice/Library/Preferences/com.apple.systemuiserver",
                "NSStatusItem Visible com.apple.menuextra.battery",
                "-bool",
                "true",
            ]
        );
        assert_eq!(
            syscall.calls_to("launchctl")[0].arg_strings(),
            ["asuser", "501", "open", "/System/Library/CoreServices/Menu Extras/Battery.menu"]
        );

        Ok(())
    }

    #[test]
    fn add_requires_domain_plist() {
        let user = MacUser::named("alice");
        let syscall = FakeSyscall::new();
        let fs = FakeFs::new();
        let installer = MenuInstaller::new(&user, &syscall, &fs);
        let extra = MenuExtra {
            name: "Clock".into(),
            path: PathBuf::from("/System/Library/CoreServices/Menu Extras/Clock.menu"),
        };

        assert!(matches!(installer.add(&extra), Err(MenuError::MissingDomain { .. })));
        assert!(syscall.calls_to("launchctl").is_empty());
    }
}
