//! Artifact selection from a release's download URLs

use crate::error::{Error, Result};
use regex::Regex;

/// Archive extensions, longest first so `.tar.gz` wins over `.gz`
const ARCHIVE_EXTENSIONS: &[(&str, &str)] = &[
    (".tar.gz", "tar.gz"),
    (".tar.xz", "tar.xz"),
    (".tar.bz2", "tar.bz2"),
    (".tar.zst", "tar.zst"),
    (".tgz", "tar.gz"),
    (".txz", "tar.xz"),
    (".tbz2", "tar.bz2"),
    (".tar", "tar"),
    (".zip", "zip"),
    (".gz", "gzip"),
    (".xz", "xz"),
    (".bz2", "bzip2"),
    (".zst", "zstd"),
    (".7z", "7z"),
];

/// Select the first artifact whose URL matches `pattern`.
///
/// The pattern is searched for anywhere in the full URL, so callers should
/// anchor it (e.g. `/tool-linux-amd64$`). Returns `Ok(None)` when nothing
/// matches; only an invalid pattern is an error.
pub fn select_asset<'a>(artifacts: &'a [String], pattern: &str) -> Result<Option<&'a str>> {
    let re = Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;

    Ok(artifacts
        .iter()
        .map(String::as_str)
        .find(|url| re.is_match(url)))
}

/// Archive format of an artifact, judged by its URL's file extension
pub fn archive_format(url: &str) -> Option<&'static str> {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .to_ascii_lowercase();

    ARCHIVE_EXTENSIONS
        .iter()
        .find(|(ext, _)| path.ends_with(ext))
        .map(|(_, format)| *format)
}
