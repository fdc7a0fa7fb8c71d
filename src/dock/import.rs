// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Replay grouped configuration into a user's Dock through `dockutil`.
//!
//! Import happens in three stages:
//!
//! 1. Build a [`UserDock`] from the grouped configuration. Short links are
//!    resolved into live paths here.
//! 2. Plan the `dockutil` invocations that rebuild that dock. Items whose
//!    target does not exist are left out, and reported as missing.
//! 3. Clear the live Dock, and run the planned invocations in order.
//!
//! Only the final invocation restarts the Dock. Every other invocation passes
//! `--no-restart`.

use crate::{
    config::{DockConfig, GroupEntry, GroupMember, ItemRecord},
    dock::{
        link::{is_folder, is_url},
        DockEntry, DockItem, Result, Section, SpacerKind, UserDock,
    },
    locate::AppResolver,
    path::FileProbe,
    syscall::{Invocation, Syscall},
};

use indicatif::{ProgressBar, ProgressStyle};
use std::{path::Path, thread, time::Duration};
use tracing::{debug, info, instrument};

const DOCKUTIL: &str = "dockutil";
const NO_RESTART: &str = "--no-restart";

/// Build user dock from grouped configuration.
///
/// Every list group is preceded by a small spacer. Bare links are resolved
/// through `resolver`. Records keep their link, but short forms and `~` are
/// resolved too. URLs are never resolved.
///
/// # Errors
///
/// - Return [`DockError::EmptyLink`](crate::dock::DockError::EmptyLink) if any
///   entry has an empty link.
pub fn build_dock<P>(config: &DockConfig, resolver: &AppResolver<'_, P>) -> Result<UserDock>
where
    P: FileProbe + ?Sized,
{
    let mut dock = UserDock::new(resolver.user().clone());
    for (key, entry) in config.iter() {
        debug!("build {key}");
        match entry {
            GroupEntry::Group(members) => {
                dock.add_spacer(SpacerKind::Small);
                for member in members {
                    dock.add_item(member_item(member, resolver)?);
                }
            }
            GroupEntry::Link(link) => dock.add_item(link_item(link, resolver)?),
            GroupEntry::Item(record) => dock.add_item(record_item(record, resolver)?),
        }
    }

    Ok(dock)
}

fn member_item<P>(member: &GroupMember, resolver: &AppResolver<'_, P>) -> Result<DockItem>
where
    P: FileProbe + ?Sized,
{
    match member {
        GroupMember::Link(link) => link_item(link, resolver),
        GroupMember::Item(record) => record_item(record, resolver),
    }
}

fn link_item<P>(link: &str, resolver: &AppResolver<'_, P>) -> Result<DockItem>
where
    P: FileProbe + ?Sized,
{
    DockItem::new(resolve(link, resolver), Section::Apps)
}

fn record_item<P>(record: &ItemRecord, resolver: &AppResolver<'_, P>) -> Result<DockItem>
where
    P: FileProbe + ?Sized,
{
    let item = DockItem::new(resolve(&record.link, resolver), record.section.unwrap_or_default())?
        .with_display(record.display.unwrap_or_default())
        .with_view(record.view.unwrap_or_default())
        .with_sort(record.sort.unwrap_or_default())
        .with_label(record.label.clone());

    Ok(item)
}

fn resolve<P>(link: &str, resolver: &AppResolver<'_, P>) -> String
where
    P: FileProbe + ?Sized,
{
    if link.trim().is_empty() || is_url(link) {
        return link.to_string();
    }

    resolver.resolve(link)
}

/// Ordered `dockutil` invocations that rebuild a dock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockPlan {
    /// Removes every entry of the live Dock.
    pub clear: Invocation,

    /// Additions in Dock order.
    pub steps: Vec<PlanStep>,

    /// Links left out because their target does not exist.
    pub missing: Vec<String>,
}

/// One planned addition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    /// Link added by this step, `None` for spacers.
    pub link: Option<String>,
    pub invocation: Invocation,
}

impl PlanStep {
    /// Short description for progress output.
    pub fn label(&self) -> &str {
        self.link.as_deref().unwrap_or("spacer")
    }
}

impl DockPlan {
    /// Plan invocations for user dock.
    ///
    /// Non-URL items whose target does not exist are skipped. Every invocation
    /// but the last one issued carries `--no-restart`.
    pub fn new<P>(dock: &UserDock, probe: &P) -> Self
    where
        P: FileProbe + ?Sized,
    {
        let plist = dock.plist_path();
        let clear = Invocation::new(DOCKUTIL)
            .args(["--remove", "all", NO_RESTART])
            .arg(plist.as_os_str());

        let mut missing = Vec::new();
        let mut drafts = Vec::new();
        for entry in dock.entries() {
            match entry {
                DockEntry::Spacer(kind) => drafts.push((None, spacer_args(*kind))),
                DockEntry::Item(item) => {
                    if !is_url(item.link()) && !probe.exists(Path::new(item.link())) {
                        missing.push(item.link().to_string());
                        continue;
                    }
                    drafts.push((Some(item.link().to_string()), item_args(item, probe)));
                }
            }
        }

        let last = drafts.len().saturating_sub(1);
        let steps = drafts
            .into_iter()
            .enumerate()
            .map(|(index, (link, args))| {
                let mut invocation = Invocation::new(DOCKUTIL).args(args);
                if index != last {
                    invocation = invocation.arg(NO_RESTART);
                }

                PlanStep {
                    link,
                    invocation: invocation.arg(plist.as_os_str()),
                }
            })
            .collect();

        Self {
            clear,
            steps,
            missing,
        }
    }
}

fn spacer_args(kind: SpacerKind) -> Vec<String> {
    vec![
        "--add".into(),
        String::new(),
        "--type".into(),
        kind.as_str().into(),
        "--section".into(),
        Section::Apps.as_str().into(),
    ]
}

fn item_args<P>(item: &DockItem, probe: &P) -> Vec<String>
where
    P: FileProbe + ?Sized,
{
    let mut args = vec![
        "--add".into(),
        item.link().to_string(),
        "--section".into(),
        item.section().as_str().into(),
    ];

    if is_folder(item.link(), probe) {
        args.extend([
            "--view".into(),
            item.view().as_str().into(),
            "--display".into(),
            item.display().as_str().into(),
            "--sort".into(),
            item.sort().as_str().into(),
        ]);
    } else if is_url(item.link()) {
        if let Some(label) = item.label() {
            args.extend(["--label".into(), label.to_string()]);
        }
    }

    args
}

/// Outcome of an import.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Links added, in Dock order.
    pub added: Vec<String>,

    /// Links skipped because their target does not exist.
    pub missing: Vec<String>,
}

/// Run dock plans through `dockutil`.
#[derive(Debug)]
pub struct DockWriter<'a, S>
where
    S: Syscall + ?Sized,
{
    syscall: &'a S,
    clear_delay: Duration,
    add_delay: Duration,
}

impl<'a, S> DockWriter<'a, S>
where
    S: Syscall + ?Sized,
{
    /// Writer that lets the Dock settle for 1 second after clearing, and for
    /// 2 seconds after every addition.
    pub fn new(syscall: &'a S) -> Self {
        Self {
            syscall,
            clear_delay: Duration::from_secs(1),
            add_delay: Duration::from_secs(2),
        }
    }

    /// Override settle delays.
    pub fn with_delays(mut self, clear: Duration, add: Duration) -> Self {
        self.clear_delay = clear;
        self.add_delay = add;
        self
    }

    /// Clear the live Dock, and run every planned addition.
    ///
    /// # Errors
    ///
    /// - Return [`DockError::Syscall`](crate::dock::DockError::Syscall) if
    ///   clearing or any addition fails.
    /// - Return [`DockError::IndicatifStyleTemplate`](crate::dock::DockError::IndicatifStyleTemplate)
    ///   if the progress bar style is invalid.
    #[instrument(skip(self, plan, bar), level = "debug")]
    pub fn apply(&self, plan: &DockPlan, bar: &ProgressBar) -> Result<ImportReport> {
        let style = ProgressStyle::with_template("{elapsed_precise:.green}  {msg:<50}  [{wide_bar:.yellow/blue}]")?
            .progress_chars("-Cco.");
        bar.set_style(style);
        bar.set_length(plan.steps.len() as u64);

        bar.set_message("clearing dock");
        self.syscall.call_checked(&plan.clear)?;
        settle(self.clear_delay);

        let mut report = ImportReport {
            added: Vec::new(),
            missing: plan.missing.clone(),
        };
        for step in &plan.steps {
            bar.set_message(step.label().to_string());
            self.syscall.call_checked(&step.invocation)?;
            settle(self.add_delay);
            bar.inc(1);

            if let Some(link) = &step.link {
                report.added.push(link.clone());
            }
        }

        bar.finish_and_clear();
        info!("added {} dock items", report.added.len());

        Ok(report)
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Build, plan, and replay grouped configuration in one go.
///
/// Nothing is changed on the live Dock if the configuration is invalid.
///
/// # Errors
///
/// - Return [`DockError::EmptyLink`](crate::dock::DockError::EmptyLink) if any
///   entry has an empty link.
/// - Return [`DockError::Syscall`](crate::dock::DockError::Syscall) if a
///   `dockutil` invocation fails.
pub fn import_dock<P, S>(
    config: &DockConfig,
    resolver: &AppResolver<'_, P>,
    writer: &DockWriter<'_, S>,
    bar: &ProgressBar,
) -> Result<ImportReport>
where
    P: FileProbe + ?Sized,
    S: Syscall + ?Sized,
{
    let dock = build_dock(config, resolver)?;
    let plan = DockPlan::new(&dock, resolver.probe());
    debug!(
        "planned {} additions, {} missing",
        plan.steps.len(),
        plan.missing.len()
    );

    writer.apply(&plan, bar)
}
