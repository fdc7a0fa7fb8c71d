// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Default applications for file types.
//!
//! Each configured extension is mapped to a Uniform Type Identifier through a
//! fixed table, the configured application is resolved into a bundle path,
//! its bundle identifier is read with `mdls`, and the association is made
//! with `duti`.

use crate::{
    config::DefaultAppsConfig,
    locate::AppResolver,
    path::FileProbe,
    syscall::{Invocation, Syscall},
};

use tracing::{info, instrument};

const UTI_TABLE: &[(&str, &[&str])] = &[
    ("com.adobe.pdf", &["pdf"]),
    ("com.adobe.postscript", &["ps"]),
    ("com.adobe.encapsulated-postscript", &["eps"]),
    ("com.adobe.photoshop-image", &["psd"]),
    ("com.adobe.illustrator.ai-image", &["ai"]),
    ("com.compuserve.gif", &["gif"]),
    ("com.microsoft.bmp", &["bmp"]),
    ("com.microsoft.ico", &["ico"]),
    ("com.microsoft.word.doc", &["doc", "docx"]),
    ("com.microsoft.excel.xls", &["xls", "xlsx"]),
    ("com.microsoft.powerpoint.ppt", &["ppt", "pptx"]),
    ("com.microsoft.waveform-audio", &["wav", "wave"]),
    ("com.microsoft.windows-media-wmv", &["wmv"]),
    ("com.apple.keynote.key", &["key"]),
    ("public.xml", &["xml"]),
    ("public.txt", &["txt"]),
    ("public.jpeg", &["jpg", "jpeg"]),
    ("public.tiff", &["tiff", "tif"]),
    ("public.png", &["png"]),
    ("com.netscape.javascript.source", &["js", "jscript", "javascript"]),
    ("public.shell-script", &["sh", "command"]),
    ("public.python-script", &["py"]),
    ("public.perl-script", &["pl", "pm"]),
    ("public.ruby-script", &["rb", "rbw"]),
    ("public.php-script", &["php", "php3", "php4", "ph3", "ph4", "phtml"]),
    ("public.html", &["htm", "html"]),
    ("public.c-source", &["c"]),
    ("com.apple.applescript.script", &["scpt"]),
];

/// Uniform Type Identifier for file extension, with or without leading dot.
pub fn uti_for_extension(extension: &str) -> Option<&'static str> {
    let extension = extension.trim_start_matches('.').to_lowercase();
    UTI_TABLE
        .iter()
        .find(|(_, extensions)| extensions.contains(&extension.as_str()))
        .map(|(uti, _)| *uti)
}

/// Merge `--extension` and `--app` options into configuration.
///
/// Extension with an application adds or overrides the pair. Extension alone
/// must already be configured.
///
/// # Errors
///
/// - Return [`DefaultsError::MissingApp`] if extension alone is not
///   configured.
pub fn merge_option(config: &mut DefaultAppsConfig, extension: Option<&str>, app: Option<&str>) -> Result<()> {
    let Some(extension) = extension else {
        return Ok(());
    };

    match app {
        Some(app) => config.set(extension, app),
        None if config.get(extension).is_some() => {}
        None => {
            return Err(DefaultsError::MissingApp {
                extension: extension.to_string(),
            })
        }
    }

    Ok(())
}

/// One applied file type association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    pub extension: String,
    pub uti: &'static str,
    pub app: String,
    pub bundle_id: String,
}

/// Set default applications through `mdls` and `duti`.
#[derive(Debug)]
pub struct DefaultAppSetter<'a, S, P>
where
    S: Syscall + ?Sized,
    P: FileProbe + ?Sized,
{
    resolver: &'a AppResolver<'a, P>,
    syscall: &'a S,
}

impl<'a, S, P> DefaultAppSetter<'a, S, P>
where
    S: Syscall + ?Sized,
    P: FileProbe + ?Sized,
{
    pub fn new(resolver: &'a AppResolver<'a, P>, syscall: &'a S) -> Self {
        Self { resolver, syscall }
    }

    /// Bundle identifier of application bundle, if it has one.
    ///
    /// # Errors
    ///
    /// - Return [`DefaultsError::Syscall`] if `mdls` cannot be run.
    pub fn bundle_id(&self, app: &str) -> Result<Option<String>> {
        let call = Invocation::new("mdls").args(["-n", "kMDItemCFBundleIdentifier", "-r", app]);
        let output = self.syscall.call(&call)?;
        let bundle = output.stdout.lines().next().unwrap_or_default().trim();
        if !output.success() || bundle.is_empty() || bundle == "(null)" {
            return Ok(None);
        }

        Ok(Some(bundle.to_string()))
    }

    /// Make application the default for extension.
    ///
    /// # Errors
    ///
    /// - Return [`DefaultsError::UnknownExtension`] if extension has no UTI.
    /// - Return [`DefaultsError::NoBundleId`] if application has no bundle
    ///   identifier.
    /// - Return [`DefaultsError::Syscall`] if `mdls` or `duti` fail.
    #[instrument(skip(self), level = "debug")]
    pub fn set_default(&self, extension: &str, app: &str) -> Result<Association> {
        let uti = uti_for_extension(extension).ok_or_else(|| DefaultsError::UnknownExtension {
            extension: extension.to_string(),
        })?;

        let resolved = self.resolver.resolve(app);
        let bundle_id = self
            .bundle_id(&resolved)?
            .ok_or_else(|| DefaultsError::NoBundleId { app: resolved.clone() })?;

        let call = Invocation::new("duti").args(["-s", bundle_id.as_str(), uti, "all"]);
        self.syscall.call_checked(&call)?;
        info!("{extension} opens with {bundle_id}");

        Ok(Association {
            extension: extension.to_string(),
            uti,
            app: resolved,
            bundle_id,
        })
    }

    /// Apply every pair of configuration in order.
    ///
    /// # Errors
    ///
    /// - Return first error of [`DefaultAppSetter::set_default`].
    pub fn apply(&self, config: &DefaultAppsConfig) -> Result<Vec<Association>> {
        config
            .iter()
            .map(|(extension, app)| self.set_default(extension, app))
            .collect()
    }
}

/// File type default error types.
#[derive(Debug, thiserror::Error)]
pub enum DefaultsError {
    /// Extension has no known Uniform Type Identifier.
    #[error("could not find a uniform type identifier for extension {extension:?}")]
    UnknownExtension { extension: String },

    /// Application has no bundle identifier.
    #[error("could not find a bundle identifier for application {app:?}")]
    NoBundleId { app: String },

    /// Extension was given alone, but has no configured application.
    #[error("no default application configured for {extension:?}, specify one with --app")]
    MissingApp { extension: String },

    /// Running `mdls` or `duti` fails.
    #[error(transparent)]
    Syscall(#[from] crate::syscall::SyscallError),
}

/// Friendly result alias :3
pub type Result<T, E = DefaultsError> = std::result::Result<T, E>;
