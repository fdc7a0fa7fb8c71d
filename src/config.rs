// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for configuration files that prefer reads and writes to
//! simplify the process of serialization and deserialization. Two layouts
//! exist: the grouped Dock configuration produced by `dock:dump` and consumed by
//! `dock:import`, and the extension to application mapping used by
//! `defaults:app`.
//!
//! # Formats
//!
//! Configuration files may be YAML, JSON, or TOML. The format is picked from
//! the file extension. Key order is always preserved, because group order is
//! Dock order.
//!
//! # Grouped Dock Configuration
//!
//! ```yaml
//! group0:
//! - photoshop
//! - ~/Applications/Foo
//! group1:
//! - link: /Users/alice/Downloads
//!   section: others
//!   display: stack
//! group2: Safari
//! ```
//!
//! A group holding a list is a section, and is preceded by a spacer when
//! imported. A group holding a single link or record is a standalone entry.

use crate::dock::{DisplayAs, Section, SortBy, ViewAs};

use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Default extension for configuration files that prefer creates.
    pub const DEFAULT_EXTENSION: &'static str = "yml";

    /// Determine format from file extension.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::UnsupportedFormat`] for unknown extensions.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "yml" | "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.as_ref().to_path_buf(),
            }),
        }
    }
}

/// Shared read and write behaviour of configuration layouts.
pub trait ConfigLayout: Serialize + DeserializeOwned + Sized {
    /// Deserialize layout from string data in given format.
    fn parse(data: &str, format: ConfigFormat) -> Result<Self> {
        let layout = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(data)?,
            ConfigFormat::Json => serde_json::from_str(data)?,
            ConfigFormat::Toml => toml::from_str(data)?,
        };

        Ok(layout)
    }

    /// Serialize layout to string data in given format.
    fn render(&self, format: ConfigFormat) -> Result<String> {
        let data = match format {
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => render_toml(self)?,
        };

        Ok(data)
    }

    /// Read layout from file, with format picked from its extension.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::UnsupportedFormat`] for unknown extensions.
    /// - Return [`ConfigError::Read`] if file cannot be read.
    /// - Return deserialization errors if the file content is malformed.
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        debug!("load configuration {:?}", path.display());
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            source,
            path: path.to_path_buf(),
        })?;

        Self::parse(&data, format)
    }

    /// Write layout to file, creating parent directories when needed.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::UnsupportedFormat`] for unknown extensions.
    /// - Return [`ConfigError::Write`] if file cannot be written.
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = self.render(ConfigFormat::from_path(path)?)?;
        let write_error = |source| ConfigError::Write {
            source,
            path: path.to_path_buf(),
        };

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            mkdirp::mkdirp(parent).map_err(write_error)?;
        }

        debug!("save configuration {:?}", path.display());
        std::fs::write(path, data).map_err(write_error)
    }
}

/// Grouped Dock configuration.
///
/// Ordered mapping of group key to entry. Produced by exporting a Dock
/// property list, edited by the user, and replayed on import.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DockConfig {
    groups: IndexMap<String, GroupEntry>,
}

impl DockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert entry under group key, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, entry: GroupEntry) {
        self.groups.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&GroupEntry> {
        self.groups.get(key)
    }

    /// Iterate groups in Dock order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &GroupEntry)> {
        self.groups.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Append all groups of other configuration.
    pub fn extend(&mut self, other: DockConfig) {
        self.groups.extend(other.groups);
    }
}

impl ConfigLayout for DockConfig {}

/// One top-level entry of the grouped Dock configuration.
// INVARIANT: Group must be tried before Item, records also accept sequences.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GroupEntry {
    /// Bare link with default display settings.
    Link(String),

    /// Section of members preceded by a spacer.
    Group(Vec<GroupMember>),

    /// Record with explicit display settings.
    Item(ItemRecord),
}

/// Member of a section.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum GroupMember {
    Link(String),
    Item(ItemRecord),
}

impl GroupMember {
    /// Link of member regardless of its form.
    pub fn link(&self) -> &str {
        match self {
            Self::Link(link) => link,
            Self::Item(record) => &record.link,
        }
    }
}

impl From<GroupMember> for GroupEntry {
    fn from(member: GroupMember) -> Self {
        match member {
            GroupMember::Link(link) => Self::Link(link),
            GroupMember::Item(record) => Self::Item(record),
        }
    }
}

/// Dock item record with explicit display settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct ItemRecord {
    /// Path, application bundle, or URL.
    pub link: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayAs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewAs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortBy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ItemRecord {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Default::default()
        }
    }
}

/// File extension to default application mapping.
///
/// Applications may be short locator keys, application names, or paths.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DefaultAppsConfig {
    apps: IndexMap<String, String>,
}

impl DefaultAppsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set application for extension. Extensions are stored lowercase without
    /// a leading dot.
    pub fn set(&mut self, extension: &str, app: impl Into<String>) {
        self.apps.insert(normalize_extension(extension), app.into());
    }

    pub fn get(&self, extension: &str) -> Option<&str> {
        self.apps
            .get(&normalize_extension(extension))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.apps.iter().map(|(ext, app)| (ext.as_str(), app.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl ConfigLayout for DefaultAppsConfig {}

/// Render top-level entries as `key = <inline value>` lines.
///
/// Plain TOML output moves tables after plain values, which would reorder
/// groups. Inline values keep every entry where it was.
fn render_toml<T: Serialize + ?Sized>(layout: &T) -> Result<String> {
    let toml::Value::Table(table) = toml::Value::try_from(layout)? else {
        return Ok(toml::to_string_pretty(layout)?);
    };

    let mut data = String::new();
    for (key, value) in &table {
        data.push_str(&format!("{} = {value}\n", toml_key(key)));
    }

    Ok(data)
}

fn toml_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        toml::Value::String(key.to_string()).to_string()
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Extension does not name a supported format.
    #[error("unsupported configuration format for {:?}, expected yml, yaml, json, or toml", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Configuration file cannot be read.
    #[error("failed to read configuration file {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration file cannot be written.
    #[error("failed to write configuration file {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDeserialize(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Friendly result alias :3
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
