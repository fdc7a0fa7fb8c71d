// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::DockFixture;

use prefer::{
    config::{ConfigLayout, DefaultAppsConfig, DockConfig},
    dock::export::export_dock,
};

use anyhow::Result;
use pretty_assertions::assert_eq;
use simple_test_case::test_case;

#[test_case("dock.yml"; "yaml")]
#[test_case("dock.json"; "json")]
#[test_case("dock.toml"; "toml")]
#[test]
fn dumped_dock_survives_every_format(name: &str) {
    let plist = DockFixture::new()
        .app("file:///Applications/Safari.app/")
        .app_spacer()
        .app("file:///Applications/Mail.app/")
        .other("file:///Users/alice/notes.txt")
        .folder("file:///Users/alice/Downloads/", 1, 2, 1)
        .build();
    let config = export_dock(&plist).unwrap();
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("Prefer").join(name);

    config.save(&path).unwrap();
    let loaded = DockConfig::load(&path).unwrap();

    assert_eq!(loaded, config);
    assert_eq!(loaded.keys().collect::<Vec<_>>(), ["group0", "group1", "group2"]);
}

#[test]
fn default_apps_keep_order_across_formats() -> Result<()> {
    let root = tempfile::tempdir()?;
    let mut apps = DefaultAppsConfig::new();
    apps.set("txt", "BBEdit");
    apps.set("pdf", "acrobat");
    apps.set("png", "Preview");

    let yaml = root.path().join("apps.yml");
    let json = root.path().join("apps.json");
    apps.save(&yaml)?;
    DefaultAppsConfig::load(&yaml)?.save(&json)?;

    let loaded = DefaultAppsConfig::load(&json)?;
    assert_eq!(
        loaded.iter().collect::<Vec<_>>(),
        [("txt", "BBEdit"), ("pdf", "acrobat"), ("png", "Preview")]
    );

    Ok(())
}
