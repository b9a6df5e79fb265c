//! Version comparison between installed and latest releases

use semver::Version;

/// Parse a release tag as semver, handling a leading `v`
pub fn parse_version(tag: &str) -> Option<Version> {
    let cleaned = tag.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).ok()
}

/// Decide whether the installed version should be replaced by `latest`.
///
/// Nothing installed always needs an install. When both tags are semver the
/// installed one must be strictly older; otherwise any difference counts.
pub fn needs_upgrade(installed: Option<&str>, latest: &str) -> bool {
    let Some(installed) = installed else {
        return true;
    };

    match (parse_version(installed), parse_version(latest)) {
        (Some(installed_ver), Some(latest_ver)) => installed_ver < latest_ver,
        _ => installed.trim() != latest.trim(),
    }
}
