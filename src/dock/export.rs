// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Export Dock property list into grouped configuration.
//!
//! Tiles are walked in order, and every `small-spacer-tile` opens a new group.
//! Groups of the `persistent-others` section are numbered after the last group
//! of the `persistent-apps` section, so group keys never collide.

use crate::{
    config::{DockConfig, GroupEntry, GroupMember, ItemRecord},
    dock::{link::canonicalize_url, DisplayAs, DockError, Result, Section, SortBy, SpacerKind, ViewAs},
};

use indexmap::IndexMap;
use plist::{Dictionary, Value};
use std::path::Path;
use tracing::{debug, instrument};

/// Read Dock property list in binary or XML form.
///
/// # Errors
///
/// - Return [`DockError::ReadPlist`] if file cannot be read or parsed.
pub fn read_plist(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    debug!("read dock property list {:?}", path.display());
    Value::from_file(path).map_err(|source| DockError::ReadPlist {
        source,
        path: path.to_path_buf(),
    })
}

/// Export parsed Dock property list into grouped configuration.
///
/// Missing sections are treated as empty. Tiles of unknown type, or without a
/// URL, are skipped.
///
/// # Errors
///
/// - Return [`DockError::NotADictionary`] if root of property list is not a
///   dictionary.
#[instrument(skip(plist), level = "debug")]
pub fn export_dock(plist: &Value) -> Result<DockConfig> {
    let root = plist.as_dictionary().ok_or(DockError::NotADictionary)?;

    let mut config = DockConfig::new();
    let mut next = 0;
    for section in [Section::Apps, Section::Others] {
        let tiles = root
            .get(section.persistent_key())
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let (groups, last) = export_section(tiles, section, next);
        for (index, members) in groups {
            config.insert(format!("group{index}"), GroupEntry::Group(members));
        }

        // INVARIANT: A section without tiles holds no groups to skip past.
        if !tiles.is_empty() {
            next = last + 1;
        }
    }

    debug!("exported {} groups", config.len());
    Ok(config)
}

fn export_section(
    tiles: &[Value],
    section: Section,
    start: usize,
) -> (IndexMap<usize, Vec<GroupMember>>, usize) {
    let mut groups: IndexMap<usize, Vec<GroupMember>> = IndexMap::new();
    let mut index = start;

    for tile in tiles.iter().filter_map(Value::as_dictionary) {
        let Some(tile_type) = tile.get("tile-type").and_then(Value::as_string) else {
            continue;
        };

        if tile_type == SpacerKind::Small.tile_type() {
            index += 1;
            continue;
        }

        let member = match tile_type {
            "file-tile" => file_tile(tile, section),
            "directory-tile" => directory_tile(tile, section),
            _ => None,
        };

        match member {
            Some(member) => groups.entry(index).or_default().push(member),
            None => debug!("skip {tile_type} in {section}"),
        }
    }

    (groups, index)
}

fn tile_url(tile: &Dictionary) -> Option<String> {
    let url = tile
        .get("tile-data")?
        .as_dictionary()?
        .get("file-data")?
        .as_dictionary()?
        .get("_CFURLString")?
        .as_string()?;

    Some(canonicalize_url(url))
}

fn file_tile(tile: &Dictionary, section: Section) -> Option<GroupMember> {
    let link = tile_url(tile)?;
    let member = match section {
        Section::Apps => GroupMember::Link(link),
        Section::Others => GroupMember::Item(ItemRecord {
            section: Some(section),
            ..ItemRecord::new(link)
        }),
    };

    Some(member)
}

fn directory_tile(tile: &Dictionary, section: Section) -> Option<GroupMember> {
    let link = tile_url(tile)?;
    let data = tile.get("tile-data")?.as_dictionary()?;
    let code = |key: &str| data.get(key).and_then(integer);

    Some(GroupMember::Item(ItemRecord {
        section: Some(section),
        display: Some(DisplayAs::from_tile_code(code("displayas"))),
        view: Some(ViewAs::from_tile_code(code("showas"))),
        sort: Some(SortBy::from_tile_code(code("arrangement"))),
        ..ItemRecord::new(link)
    }))
}

fn integer(value: &Value) -> Option<i64> {
    value
        .as_signed_integer()
        .or_else(|| value.as_unsigned_integer().and_then(|code| i64::try_from(code).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::{formatdoc, indoc};
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    fn parse(xml: &str) -> Value {
        Value::from_reader_xml(xml.as_bytes()).unwrap()
    }

    fn file_tile_xml(url: &str) -> String {
        formatdoc!(
            r#"
                <dict>
                    <key>tile-data</key>
                    <dict>
                        <key>file-data</key>
                        <dict>
                            <key>_CFURLString</key>
                            <string>{}</string>
                        </dict>
                    </dict>
                    <key>tile-type</key>
                    <string>file-tile</string>
                </dict>
            "#,
            url
        )
    }

    fn spacer_xml() -> &'static str {
        indoc! {r#"
            <dict>
                <key>tile-data</key>
                <dict/>
                <key>tile-type</key>
                <string>small-spacer-tile</string>
            </dict>
        "#}
    }

    fn dock_xml(apps: &[String], others: &[String]) -> String {
        formatdoc!(
            r#"
                <?xml version="1.0" encoding="UTF-8"?>
                <plist version="1.0">
                <dict>
                    <key>persistent-apps</key>
                    <array>{}</array>
                    <key>persistent-others</key>
                    <array>{}</array>
                </dict>
                </plist>
            "#,
            apps.concat(),
            others.concat()
        )
    }

    #[test]
    fn spacers_open_new_groups() -> anyhow::Result<()> {
        let apps = vec![
            file_tile_xml("file:///Applications/Safari.app/"),
            spacer_xml().to_string(),
            file_tile_xml("file:///Applications/Mail.app/"),
            file_tile_xml("file:///Users/alice/Applications/Foo.app/"),
            spacer_xml().to_string(),
            file_tile_xml("file:///Applications/Notes.app/"),
        ];
        let others = vec![file_tile_xml("file:///Users/alice/notes.txt")];

        let config = export_dock(&parse(&dock_xml(&apps, &others)))?;

        assert_eq!(
            config.keys().collect::<Vec<_>>(),
            ["group0", "group1", "group2", "group3"]
        );
        assert_eq!(
            config.get("group1"),
            Some(&GroupEntry::Group(vec![
                GroupMember::Link("Mail".into()),
                GroupMember::Link("~/Applications/Foo".into()),
            ]))
        );
        assert_eq!(
            config.get("group3"),
            Some(&GroupEntry::Group(vec![GroupMember::Item(ItemRecord {
                section: Some(Section::Others),
                ..ItemRecord::new("/Users/alice/notes.txt")
            })]))
        );

        Ok(())
    }

    #[test]
    fn empty_groups_are_absent() -> anyhow::Result<()> {
        let apps = vec![
            spacer_xml().to_string(),
            file_tile_xml("file:///Applications/Safari.app/"),
            spacer_xml().to_string(),
        ];
        let others = vec![
            spacer_xml().to_string(),
            file_tile_xml("file:///Users/alice/Downloads/"),
        ];

        let config = export_dock(&parse(&dock_xml(&apps, &others)))?;

        assert_eq!(config.keys().collect::<Vec<_>>(), ["group1", "group4"]);

        Ok(())
    }

    #[test]
    fn others_start_at_zero_without_apps() -> anyhow::Result<()> {
        let others = vec![
            file_tile_xml("file:///Users/alice/notes.txt"),
            spacer_xml().to_string(),
            file_tile_xml("file:///Users/alice/todo.txt"),
        ];

        let config = export_dock(&parse(&dock_xml(&[], &others)))?;

        assert_eq!(config.keys().collect::<Vec<_>>(), ["group0", "group1"]);

        Ok(())
    }

    #[test]
    fn missing_sections_and_urls_are_tolerated() -> anyhow::Result<()> {
        let plist = parse(indoc! {r#"
            <?xml version="1.0" encoding="UTF-8"?>
            <plist version="1.0">
            <dict>
                <key>persistent-apps</key>
                <array>
                    <dict>
                        <key>tile-data</key>
                        <dict/>
                        <key>tile-type</key>
                        <string>file-tile</string>
                    </dict>
                    <dict>
                        <key>tile-type</key>
                        <string>recents-tile</string>
                    </dict>
                </array>
            </dict>
            </plist>
        "#});

        assert!(export_dock(&plist)?.is_empty());

        Ok(())
    }

    #[test]
    fn root_must_be_dictionary() {
        let plist = Value::Array(Vec::new());
        assert!(matches!(export_dock(&plist), Err(DockError::NotADictionary)));
    }

    fn directory_tile_xml(fields: &str) -> String {
        formatdoc!(
            r#"
                <dict>
                    <key>tile-data</key>
                    <dict>
                        {}
                        <key>file-data</key>
                        <dict>
                            <key>_CFURLString</key>
                            <string>file:///Users/alice/Downloads/</string>
                        </dict>
                    </dict>
                    <key>tile-type</key>
                    <string>directory-tile</string>
                </dict>
            "#,
            fields
        )
    }

    #[test_case("", DisplayAs::Folder, ViewAs::Auto, SortBy::Kind; "absent fields")]
    #[test_case(
        "<key>displayas</key><integer>0</integer><key>showas</key><integer>1</integer><key>arrangement</key><integer>1</integer>",
        DisplayAs::Stack, ViewAs::Fan, SortBy::Name;
        "stack fan name"
    )]
    #[test_case(
        "<key>displayas</key><integer>1</integer><key>showas</key><integer>2</integer><key>arrangement</key><integer>2</integer>",
        DisplayAs::Folder, ViewAs::Grid, SortBy::DateAdded;
        "folder grid dateadded"
    )]
    #[test_case(
        "<key>showas</key><integer>3</integer><key>arrangement</key><integer>3</integer>",
        DisplayAs::Folder, ViewAs::List, SortBy::DateModified;
        "list datemodified"
    )]
    #[test_case(
        "<key>showas</key><integer>4</integer><key>arrangement</key><integer>4</integer>",
        DisplayAs::Folder, ViewAs::Auto, SortBy::DateCreated;
        "auto datecreated"
    )]
    #[test_case(
        "<key>displayas</key><integer>7</integer><key>arrangement</key><integer>5</integer>",
        DisplayAs::Folder, ViewAs::Auto, SortBy::Kind;
        "unknown codes"
    )]
    #[test]
    fn decode_directory_tile(fields: &str, display: DisplayAs, view: ViewAs, sort: SortBy) {
        let others = vec![directory_tile_xml(fields)];
        let config = export_dock(&parse(&dock_xml(&[], &others))).unwrap();

        let expect = ItemRecord {
            section: Some(Section::Others),
            display: Some(display),
            view: Some(view),
            sort: Some(sort),
            ..ItemRecord::new("/Users/alice/Downloads/")
        };
        assert_eq!(
            config.get("group1"),
            Some(&GroupEntry::Group(vec![GroupMember::Item(expect)]))
        );
    }
}
