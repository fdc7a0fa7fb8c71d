// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Manage macOS user preferences.
//!
//! The centerpiece is the Dock. A user's Dock property list can be dumped into
//! a small grouped configuration file, edited by hand, and replayed back onto
//! any user's Dock through `dockutil`. Groups of the configuration become
//! spacers on the Dock, and applications can be referenced by short names like
//! `photoshop` that are resolved against whatever release is installed.
//!
//! Around that live a few smaller tools:
//!
//! - Creative Cloud application lookup, preference backup, and preference
//!   transfer between release years.
//! - Default applications for file extensions.
//! - Menu bar extras.
//!
//! Every external command goes through [`syscall::Syscall`], and every
//! existence check through [`path::FileProbe`], so all of it can be exercised
//! against fakes.

pub mod adobe;
pub mod config;
pub mod defaults;
pub mod dock;
pub mod locate;
pub mod menu;
pub mod path;
pub mod syscall;
