// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use prefer::{
    adobe::{
        prefs::{backup_dir, backup_stamp, validate_years, AppArgument, PreferenceManager},
        AdobeError, Catalog, CreativeCloudApp,
    },
    config::{ConfigFormat, ConfigLayout, DefaultAppsConfig, DockConfig},
    defaults::{merge_option, DefaultAppSetter},
    dock::{
        export::{export_dock, read_plist},
        import::{import_dock, DockWriter},
    },
    locate::AppResolver,
    menu::{MenuExtras, MenuInstaller},
    path::{match_owner, HostFs, MacUser},
    syscall::HostSyscall,
};

use anyhow::{anyhow, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use inquire::Text;
use std::{
    io::IsTerminal,
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  prefer [options] <command> [<args>]",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// User to run the command for, defaults to current user.
    #[arg(global = true, short, long, value_name = "name")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let user = MacUser::from_option(self.user)?;
        match self.command {
            Command::DockDump(opts) => run_dock_dump(&user, opts),
            Command::DockImport(opts) => run_dock_import(&user, opts),
            Command::AdobeInfo(opts) => run_adobe_info(opts),
            Command::AdobeBackup(opts) => run_adobe_backup(&user, opts),
            Command::AdobeTransfer(opts) => run_adobe_transfer(&user, opts),
            Command::DefaultsApp(opts) => run_defaults_app(&user, opts),
            Command::MenuAdd(opts) => run_menu_add(&user, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Dump Dock of user into grouped configuration file.
    #[command(name = "dock:dump", override_usage = "prefer dock:dump [options]")]
    DockDump(DockDumpOptions),

    /// Replace Dock of user with items of grouped configuration file.
    #[command(name = "dock:import", override_usage = "prefer dock:import [options]")]
    DockImport(DockImportOptions),

    /// Print information about installed Creative Cloud application as JSON.
    #[command(name = "adobe:info", override_usage = "prefer adobe:info [options] <application> [<year>]")]
    AdobeInfo(AdobeOptions),

    /// Back up preferences of Creative Cloud application.
    #[command(name = "adobe:backup", override_usage = "prefer adobe:backup [options] <application> [<year>]")]
    AdobeBackup(AdobeOptions),

    /// Transfer preferences of Creative Cloud application between years.
    #[command(
        name = "adobe:transfer",
        override_usage = "prefer adobe:transfer [options] [<application>] --from <year> --to <year>"
    )]
    AdobeTransfer(AdobeTransferOptions),

    /// Set default applications for file extensions.
    #[command(name = "defaults:app", override_usage = "prefer defaults:app [options]")]
    DefaultsApp(DefaultsAppOptions),

    /// Add menu extra to menu bar.
    #[command(name = "menu:add", override_usage = "prefer menu:add [options] <menu>")]
    MenuAdd(MenuAddOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DockDumpOptions {
    /// Dock property list to read instead of the user's.
    #[arg(long = "in", value_name = "file")]
    pub input: Option<PathBuf>,

    /// Configuration file to write, yml, json, or toml.
    #[arg(long = "out", value_name = "file")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DockImportOptions {
    /// Configuration file to take Dock items from.
    #[arg(long = "in", value_name = "file")]
    pub input: Option<PathBuf>,

    /// Configuration file to copy the read configuration into.
    #[arg(long = "out", value_name = "file")]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct AdobeOptions {
    /// Application name, e.g., photoshop or after-effects.
    #[arg(required = true, value_name = "application")]
    pub application: String,

    /// Release year, newest installed release if absent.
    #[arg(value_name = "year")]
    pub year: Option<i32>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct AdobeTransferOptions {
    /// Application name, optionally with the source year.
    #[arg(value_name = "application")]
    pub application: Option<String>,

    /// Year to copy preferences from.
    #[arg(long, value_name = "year")]
    pub from: Option<String>,

    /// Year to copy preferences to.
    #[arg(long, value_name = "year")]
    pub to: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DefaultsAppOptions {
    /// Configuration file mapping extensions to applications.
    #[arg(long = "in", value_name = "file")]
    pub input: Option<PathBuf>,

    /// Configuration file to write the merged configuration into.
    #[arg(long = "out", value_name = "file")]
    pub output: Option<PathBuf>,

    /// Extension to set the default application for.
    #[arg(short, long, value_name = "ext")]
    pub extension: Option<String>,

    /// Application to use for the extension.
    #[arg(short, long, value_name = "app")]
    pub app: Option<String>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct MenuAddOptions {
    /// Name of menu extra, e.g., Bluetooth.
    #[arg(required = true, value_name = "menu")]
    pub menu: String,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_dock_dump(user: &MacUser, opts: DockDumpOptions) -> Result<()> {
    let input = opts.input.unwrap_or_else(|| user.dock_plist());
    let output = opts
        .output
        .unwrap_or_else(|| user.config_path("dock", ConfigFormat::DEFAULT_EXTENSION));

    let config = export_dock(&read_plist(&input)?)?;
    if config.is_empty() {
        warn!("no dock items found in {:?}, nothing written", input.display());
        return Ok(());
    }

    save_config(user, &config, &output)?;
    info!("dumped {} dock groups into {:?}", config.len(), output.display());

    Ok(())
}

fn run_dock_import(user: &MacUser, opts: DockImportOptions) -> Result<()> {
    let input = match opts.input {
        Some(input) => input,
        None => {
            let fallback = user.config_path("dock", ConfigFormat::DEFAULT_EXTENSION);
            if fallback.exists() || !std::io::stdin().is_terminal() {
                fallback
            } else {
                PathBuf::from(Text::new("What is the path to the configuration file?").prompt()?)
            }
        }
    };

    let config = DockConfig::load(&input)?;
    let output = opts.output.unwrap_or_else(|| output_path(user, "dock", &input));
    if output != input {
        save_config(user, &config, &output)?;
    }

    let fs = HostFs;
    let syscall = HostSyscall;
    let resolver = AppResolver::new(user, &fs);
    let writer = DockWriter::new(&syscall);
    let bar = ProgressBar::new(0);
    let report = import_dock(&config, &resolver, &writer, &bar)?;
    for missing in &report.missing {
        warn!("could not find {missing}, it was not added to the dock");
    }

    Ok(())
}

fn run_adobe_info(opts: AdobeOptions) -> Result<()> {
    let app = locate_adobe_app(&opts.application, opts.year)?;
    if app.is_installed() {
        let report = app.report(&HostSyscall)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{{}}");
    }

    Ok(())
}

fn run_adobe_backup(user: &MacUser, opts: AdobeOptions) -> Result<()> {
    let app = locate_adobe_app(&opts.application, opts.year)?;
    if !app.is_installed() {
        let name = app.full_name(false).unwrap_or_else(|| app.key().to_string());
        return Err(AdobeError::NotInstalled { name }.into());
    }

    let fs = HostFs;
    let syscall = HostSyscall;
    let manager = PreferenceManager::new(user, &syscall, &fs);
    let dest = backup_dir(user, app.key(), opts.year);
    match manager.backup(&app, &dest, &backup_stamp())? {
        Some(archive) => info!("backed up preferences into {:?}", archive.display()),
        None => warn!("no preferences found to back up"),
    }

    Ok(())
}

fn run_adobe_transfer(user: &MacUser, opts: AdobeTransferOptions) -> Result<()> {
    let interactive = std::io::stdin().is_terminal();
    let application = match opts.application {
        Some(application) => application,
        None if interactive => Text::new("What Adobe application should we transfer preferences for?").prompt()?,
        None => return Err(anyhow!("no application given to transfer preferences for")),
    };
    let argument = AppArgument::parse(&application);

    let from = match opts.from {
        Some(from) => Some(from),
        None if interactive => {
            let default = argument.year.map(|year| year.to_string()).unwrap_or_default();
            Some(
                Text::new("What year should we copy preferences FROM?")
                    .with_default(&default)
                    .prompt()?,
            )
        }
        None => argument.year.map(|year| year.to_string()),
    };
    let to = match opts.to {
        Some(to) => Some(to),
        None if interactive => Some(Text::new("What year should we copy preferences TO?").prompt()?),
        None => None,
    };
    let (from, to) = validate_years(from.as_deref(), to.as_deref())?;

    let fs = HostFs;
    let syscall = HostSyscall;
    let catalog = Catalog::embedded()?;
    let src = CreativeCloudApp::locate(&catalog, &argument.key, Some(from), &fs)?;
    let dst = CreativeCloudApp::locate(&catalog, &argument.key, Some(to), &fs)?;
    let manager = PreferenceManager::new(user, &syscall, &fs);
    let report = manager.transfer(&src, &dst, &backup_stamp())?;
    info!(
        "transferred {} preferences from {from} to {to}",
        report.copied.len()
    );

    Ok(())
}

fn run_defaults_app(user: &MacUser, opts: DefaultsAppOptions) -> Result<()> {
    let input = opts
        .input
        .unwrap_or_else(|| user.config_path("apps", ConfigFormat::DEFAULT_EXTENSION));
    let mut config = if input.exists() {
        DefaultAppsConfig::load(&input)?
    } else if opts.extension.is_some() && opts.app.is_some() {
        DefaultAppsConfig::new()
    } else {
        return Err(anyhow!("no configuration found at {:?}", input.display()));
    };
    merge_option(&mut config, opts.extension.as_deref(), opts.app.as_deref())?;

    let output = opts.output.unwrap_or_else(|| output_path(user, "apps", &input));
    save_config(user, &config, &output)?;

    let fs = HostFs;
    let syscall = HostSyscall;
    let resolver = AppResolver::new(user, &fs);
    let setter = DefaultAppSetter::new(&resolver, &syscall);
    let associations = setter.apply(&config)?;
    info!("set default applications for {} extensions", associations.len());

    Ok(())
}

fn run_menu_add(user: &MacUser, opts: MenuAddOptions) -> Result<()> {
    let fs = HostFs;
    let syscall = HostSyscall;
    let extra = MenuExtras::default().find(&opts.menu, &fs)?;
    MenuInstaller::new(user, &syscall, &fs).add(&extra)?;

    Ok(())
}

fn locate_adobe_app(application: &str, year: Option<i32>) -> Result<CreativeCloudApp> {
    let fs = HostFs;
    let catalog = Catalog::embedded()?;
    let app = match year {
        Some(year) => CreativeCloudApp::locate(&catalog, application, Some(year), &fs)?,
        None => {
            let current_year = chrono::Local::now().year();
            CreativeCloudApp::locate_latest(&catalog, application, &fs, current_year)?
        }
    };

    Ok(app)
}

/// Default output configuration path, matching extension of input.
fn output_path(user: &MacUser, name: &str, input: &Path) -> PathBuf {
    let ext = input
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_else(|| ConfigFormat::DEFAULT_EXTENSION.into());
    user.config_path(name, &ext)
}

fn save_config<C: ConfigLayout>(user: &MacUser, config: &C, path: &Path) -> Result<()> {
    config.save(path)?;
    if let Err(error) = match_owner(path, &user.library_dir()) {
        warn!("cannot hand {:?} to {}: {error}", path.display(), user.name());
    }

    Ok(())
}
