// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dock model.
//!
//! A __user dock__ is the ordered sequence of entries shown in a user's Dock.
//! Entries are either items (applications, folders, files, or URLs), or
//! spacers that visually separate groups of items.
//!
//! # Transform
//!
//! The Dock is persisted by macOS as a property list. Prefer reads that
//! property list into a grouped configuration (see [`export`]), and replays a
//! grouped configuration through `dockutil` (see [`import`]). A spacer in the
//! property list marks the start of a new group, and every group in the
//! configuration is preceded by a spacer when replayed.

pub mod export;
pub mod import;
pub mod link;

use crate::path::MacUser;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::PathBuf,
};

/// Dock section an item lives in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// Left of the divider.
    #[default]
    Apps,

    /// Right of the divider.
    Others,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apps => "apps",
            Self::Others => "others",
        }
    }

    /// Property list key holding tiles of this section.
    pub fn persistent_key(&self) -> &'static str {
        match self {
            Self::Apps => "persistent-apps",
            Self::Others => "persistent-others",
        }
    }
}

/// How a folder is shown in the Dock.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayAs {
    #[default]
    Folder,
    Stack,
}

impl DisplayAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Stack => "stack",
        }
    }

    /// Decode `displayas` tile field. Absent or unknown codes are folders.
    pub fn from_tile_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::Stack,
            _ => Self::Folder,
        }
    }
}

/// How the content of a folder is presented when opened.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewAs {
    #[default]
    Auto,
    Fan,
    Grid,
    List,
}

impl ViewAs {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Fan => "fan",
            Self::Grid => "grid",
            Self::List => "list",
        }
    }

    /// Decode `showas` tile field.
    pub fn from_tile_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => Self::Fan,
            Some(2) => Self::Grid,
            Some(3) => Self::List,
            _ => Self::Auto,
        }
    }
}

/// Sort order of folder content.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    DateAdded,
    DateModified,
    DateCreated,
    Kind,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::DateAdded => "dateadded",
            Self::DateModified => "datemodified",
            Self::DateCreated => "datecreated",
            Self::Kind => "kind",
        }
    }

    /// Decode `arrangement` tile field. Absent or unknown codes sort by kind.
    pub fn from_tile_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => Self::Name,
            Some(2) => Self::DateAdded,
            Some(3) => Self::DateModified,
            Some(4) => Self::DateCreated,
            _ => Self::Kind,
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(
            impl Display for $ty {
                fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
                    fmt.write_str(self.as_str())
                }
            }
        )+
    };
}

display_as_str!(Section, DisplayAs, ViewAs, SortBy);

/// Dock item.
///
/// Link is never empty. Section is fixed once constructed, display settings
/// can be adjusted through the `with_*` builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockItem {
    link: String,
    section: Section,
    display: DisplayAs,
    view: ViewAs,
    sort: SortBy,
    label: Option<String>,
}

impl DockItem {
    /// Construct item for link in section with default display settings.
    ///
    /// # Errors
    ///
    /// - Return [`DockError::EmptyLink`] if link is empty.
    pub fn new(link: impl Into<String>, section: Section) -> Result<Self> {
        let link = link.into();
        if link.trim().is_empty() {
            return Err(DockError::EmptyLink);
        }

        Ok(Self {
            link,
            section,
            display: DisplayAs::default(),
            view: ViewAs::default(),
            sort: SortBy::default(),
            label: None,
        })
    }

    pub fn with_display(mut self, display: DisplayAs) -> Self {
        self.display = display;
        self
    }

    pub fn with_view(mut self, view: ViewAs) -> Self {
        self.view = view;
        self
    }

    pub fn with_sort(mut self, sort: SortBy) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label.filter(|label| !label.is_empty());
        self
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn display(&self) -> DisplayAs {
        self.display
    }

    pub fn view(&self) -> ViewAs {
        self.view
    }

    pub fn sort(&self) -> SortBy {
        self.sort
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Kind of spacer between groups of Dock items.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SpacerKind {
    #[default]
    Small,
}

impl SpacerKind {
    /// Tile type as `dockutil` expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small-spacer",
        }
    }

    /// Tile type as stored in the Dock property list.
    pub fn tile_type(&self) -> &'static str {
        match self {
            Self::Small => "small-spacer-tile",
        }
    }
}

/// One entry of a user dock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockEntry {
    Item(DockItem),
    Spacer(SpacerKind),
}

/// Ordered Dock entries bound to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDock {
    user: MacUser,
    entries: Vec<DockEntry>,
}

impl UserDock {
    pub fn new(user: MacUser) -> Self {
        Self {
            user,
            entries: Vec::new(),
        }
    }

    pub fn user(&self) -> &MacUser {
        &self.user
    }

    /// Property list this dock is written to.
    pub fn plist_path(&self) -> PathBuf {
        self.user.dock_plist()
    }

    pub fn add_spacer(&mut self, kind: SpacerKind) {
        self.entries.push(DockEntry::Spacer(kind));
    }

    pub fn add_item(&mut self, item: DockItem) {
        self.entries.push(DockEntry::Item(item));
    }

    /// Entries in Dock order.
    pub fn entries(&self) -> &[DockEntry] {
        &self.entries
    }

    /// Items only, in Dock order.
    pub fn items(&self) -> impl Iterator<Item = &DockItem> {
        self.entries.iter().filter_map(|entry| match entry {
            DockEntry::Item(item) => Some(item),
            DockEntry::Spacer(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Dock error types.
#[derive(Debug, thiserror::Error)]
pub enum DockError {
    /// Dock item was given an empty link.
    #[error("dock item link cannot be empty")]
    EmptyLink,

    /// Dock property list cannot be read or parsed.
    #[error("failed to read dock property list {:?}", path.display())]
    ReadPlist {
        #[source]
        source: plist::Error,
        path: PathBuf,
    },

    /// Dock property list root is not a dictionary.
    #[error("dock property list root must be a dictionary")]
    NotADictionary,

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),

    /// Running `dockutil` fails.
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = DockError> = std::result::Result<T, E>;
