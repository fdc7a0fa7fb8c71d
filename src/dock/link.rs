// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dock link classification and canonicalization.
//!
//! Property lists store Dock items as `file://` URLs. Configuration files store
//! them in short form instead: a locator key like `photoshop`, a home relative
//! path like `~/Applications/Foo`, a bare application name, or a plain path.

use crate::{locate::reverse_lookup, path::FileProbe};

use regex::Regex;
use std::{borrow::Cow, path::Path, sync::LazyLock};

static SYSTEM_APP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^file:///Applications/(.*)\.app/").expect("valid regex"));

static USER_APP_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^file:///Users/(.*)/Applications/(.*)\.app/").expect("valid regex")
});

static FILE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^file://(.*)$").expect("valid regex"));

static ANY_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]+)://(.*)").expect("valid regex"));

/// Canonicalize `_CFURLString` of a tile into short form.
///
/// - `file:///Applications/<Name>.app/` becomes a locator key if one claims
///   the name, or the plain name otherwise.
/// - `file:///Users/<user>/Applications/<Name>.app/` becomes
///   `~/Applications/<Name>`.
/// - Any other `file://` URL becomes a locator key, or the decoded path.
/// - Everything else is kept as is.
pub fn canonicalize_url(url: &str) -> String {
    if let Some(captures) = SYSTEM_APP_URL.captures(url) {
        return reverse_or_decoded(&captures[1]);
    }

    if let Some(captures) = USER_APP_URL.captures(url) {
        return format!("~/Applications/{}", decode(&captures[2]));
    }

    if let Some(captures) = FILE_URL.captures(url) {
        return reverse_or_decoded(&captures[1]);
    }

    url.to_string()
}

fn reverse_or_decoded(raw: &str) -> String {
    let name = decode(raw);
    match reverse_lookup(&name) {
        Some(key) => key.to_string(),
        None => name.into_owned(),
    }
}

fn decode(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Check if link is a URL with a scheme, e.g., `https://example.com`.
pub fn is_url(link: &str) -> bool {
    ANY_URL.is_match(link)
}

/// Check if link names an application bundle.
pub fn is_app(link: &str) -> bool {
    link.trim_end_matches('/').ends_with(".app")
}

/// Check if link should be added to the Dock as a folder.
///
/// URLs, application bundles, and existing plain files are never folders.
/// Existing directories always are. Anything else is a folder when it has no
/// extension.
pub fn is_folder<P>(link: &str, probe: &P) -> bool
where
    P: FileProbe + ?Sized,
{
    let path = Path::new(link);
    if is_url(link) || is_app(link) || probe.is_file(path) {
        return false;
    }

    probe.is_dir(path) || path.extension().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FakeFs;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case(
        "file:///Applications/Adobe%20Photoshop%202023/Adobe%20Photoshop%202023.app/",
        "photoshop";
        "adobe application"
    )]
    #[test_case("file:///Users/alice/Applications/Foo.app/", "~/Applications/Foo"; "user application")]
    #[test_case("file:///Users/alice/Applications/Foo%20Bar.app/", "~/Applications/Foo Bar"; "decoded user application")]
    #[test_case("file:///Applications/Quirky.app/", "Quirky"; "unknown application")]
    #[test_case("file:///Applications/Utilities/Terminal.app/", "Utilities/Terminal"; "nested application")]
    #[test_case(
        "file:///System/Library/CoreServices/Applications/Screen%20Sharing.app/",
        "screen_sharing";
        "utility"
    )]
    #[test_case("file:///Users/alice/Downloads/", "/Users/alice/Downloads/"; "folder")]
    #[test_case("https://example.com/", "https://example.com/"; "web url")]
    #[test]
    fn canonicalize(url: &str, expect: &str) {
        assert_eq!(canonicalize_url(url), expect);
    }

    #[test]
    fn url_detection() {
        assert!(is_url("https://example.com"));
        assert!(is_url("smb://server/share"));
        assert!(!is_url("/Users/alice/Downloads"));
        assert!(!is_url("photoshop"));
    }

    #[test]
    fn folder_detection() {
        let fs = FakeFs::new()
            .with_dir("/Users/alice/Code/site.io")
            .with_file("/Users/alice/notes.txt")
            .with_file("/Users/alice/README");

        assert!(is_folder("/Users/alice/Downloads/", &fs));
        assert!(is_folder("/Users/alice/Code/site.io", &fs));
        assert!(!is_folder("/Users/alice/notes.txt", &fs));
        assert!(!is_folder("/Users/alice/README", &fs));
        assert!(!is_folder("/Applications/Safari.app", &fs));
        assert!(!is_folder("/System/Applications/Utilities/Terminal.app/", &fs));
        assert!(!is_folder("https://example.com", &fs));
    }
}
