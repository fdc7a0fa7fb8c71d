// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::DockFixture;

use prefer::{
    config::{ConfigFormat, ConfigLayout, DockConfig, GroupEntry, GroupMember},
    dock::{
        export::export_dock,
        import::{import_dock, DockWriter, ImportReport},
    },
    locate::AppResolver,
    path::{FakeFs, MacUser},
    syscall::{FakeSyscall, Invocation},
};

use anyhow::Result;
use indicatif::ProgressBar;
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::time::Duration;

const PLIST: &str = "/Users/alice/Library/Preferences/com.apple.dock.plist";

fn replay(config: &DockConfig, fs: &FakeFs, syscall: &FakeSyscall) -> Result<ImportReport> {
    let user = MacUser::named("alice");
    let resolver = AppResolver::new(&user, fs).with_current_year(2025);
    let writer = DockWriter::new(syscall).with_delays(Duration::ZERO, Duration::ZERO);

    Ok(import_dock(config, &resolver, &writer, &ProgressBar::hidden())?)
}

fn is_spacer(call: &Invocation) -> bool {
    call.arg_strings().iter().any(|arg| arg == "small-spacer")
}

#[test]
fn exported_dock_replays_in_order() -> Result<()> {
    let plist = DockFixture::new()
        .app("file:///Applications/Safari.app/")
        .app_spacer()
        .app("file:///Applications/Mail.app/")
        .app("file:///Applications/Notes.app/")
        .app_spacer()
        .app("file:///Applications/Calendar.app/")
        .build();
    let fs = FakeFs::new()
        .with_dir("/Applications/Safari.app")
        .with_dir("/Applications/Mail.app")
        .with_dir("/Applications/Notes.app")
        .with_dir("/Applications/Calendar.app");
    let syscall = FakeSyscall::new();

    let config = export_dock(&plist)?;
    let report = replay(&config, &fs, &syscall)?;

    assert_eq!(
        report.added,
        [
            "/Applications/Safari.app",
            "/Applications/Mail.app",
            "/Applications/Notes.app",
            "/Applications/Calendar.app",
        ]
    );
    assert!(report.missing.is_empty());

    let calls = syscall.calls_to("dockutil");
    assert_eq!(calls.len(), 8);
    assert_eq!(calls[0].arg_strings(), ["--remove", "all", "--no-restart", PLIST]);

    let spacers = calls[1..]
        .iter()
        .enumerate()
        .filter(|(_, call)| is_spacer(call))
        .map(|(index, _)| index)
        .collect::<Vec<_>>();
    assert_eq!(spacers, [0, 2, 5]);

    let adds = calls[1..]
        .iter()
        .filter(|call| !is_spacer(call))
        .map(|call| call.arg_strings()[1].clone())
        .collect::<Vec<_>>();
    assert_eq!(adds, report.added);

    assert_eq!(
        calls[7].arg_strings(),
        ["--add", "/Applications/Calendar.app", "--section", "apps", PLIST]
    );

    Ok(())
}

#[test]
fn others_continue_group_numbering() -> Result<()> {
    let plist = DockFixture::new()
        .app("file:///Applications/Safari.app/")
        .app_spacer()
        .app_spacer()
        .app("file:///Applications/Mail.app/")
        .folder("file:///Users/alice/Downloads/", 0, 3, 2)
        .build();
    let fs = FakeFs::new()
        .with_dir("/Applications/Safari.app")
        .with_dir("/Applications/Mail.app")
        .with_dir("/Users/alice/Downloads");
    let syscall = FakeSyscall::new();

    let config = export_dock(&plist)?;
    assert_eq!(config.keys().collect::<Vec<_>>(), ["group0", "group2", "group3"]);

    replay(&config, &fs, &syscall)?;
    let folder = syscall
        .calls_to("dockutil")
        .into_iter()
        .find(|call| call.arg_strings()[1] == "/Users/alice/Downloads/")
        .map(|call| call.arg_strings());
    assert_eq!(
        folder,
        Some(vec![
            "--add".to_string(),
            "/Users/alice/Downloads/".into(),
            "--section".into(),
            "others".into(),
            "--view".into(),
            "list".into(),
            "--display".into(),
            "stack".into(),
            "--sort".into(),
            "dateadded".into(),
            PLIST.into(),
        ])
    );

    Ok(())
}

#[test]
fn missing_targets_are_reported_not_added() -> Result<()> {
    let config = DockConfig::parse(
        indoc! {r#"
            group0:
              - Safari
              - Ghost
            group1: https://example.com
        "#},
        ConfigFormat::Yaml,
    )?;
    let fs = FakeFs::new().with_dir("/Applications/Safari.app");
    let syscall = FakeSyscall::new();

    let report = replay(&config, &fs, &syscall)?;

    assert_eq!(report.added, ["/Applications/Safari.app", "https://example.com"]);
    assert_eq!(report.missing, ["/Applications/Ghost.app"]);
    assert!(syscall
        .calls_to("dockutil")
        .iter()
        .all(|call| !call.arg_strings().contains(&"/Applications/Ghost.app".to_string())));

    Ok(())
}

#[test]
fn exported_groups_hold_short_names() -> Result<()> {
    let plist = DockFixture::new()
        .app("file:///Applications/Adobe%20Photoshop%202024/Adobe%20Photoshop%202024.app/")
        .app("file:///Users/alice/Applications/Foo.app/")
        .app("file:///Applications/Quirky.app/")
        .build();

    let config = export_dock(&plist)?;

    assert_eq!(
        config.get("group0"),
        Some(&GroupEntry::Group(vec![
            GroupMember::Link("photoshop".into()),
            GroupMember::Link("~/Applications/Foo".into()),
            GroupMember::Link("Quirky".into()),
        ]))
    );

    Ok(())
}

#[test]
fn user_apps_and_adobe_apps_survive_round_trip() -> Result<()> {
    let plist = DockFixture::new()
        .app("file:///Users/alice/Applications/Foo.app/")
        .app("file:///Applications/Adobe%20Photoshop%202024/Adobe%20Photoshop%202024.app/")
        .build();
    let fs = FakeFs::new()
        .with_dir("/Users/alice/Applications/Foo.app")
        .with_file("/Applications/Adobe Photoshop 2024/Adobe Photoshop 2024.app/Contents/Info.plist");
    let syscall = FakeSyscall::new();

    let config = export_dock(&plist)?;
    let report = replay(&config, &fs, &syscall)?;

    assert_eq!(
        report.added,
        [
            "/Users/alice/Applications/Foo.app",
            "/Applications/Adobe Photoshop 2024/Adobe Photoshop 2024.app",
        ]
    );
    assert!(report.missing.is_empty());

    Ok(())
}
