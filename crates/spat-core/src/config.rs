//! Resolved settings and the on-disk tool directory layout
//!
//! Defaults can be overridden through environment variables:
//!
//! - `SPAT_HOME` - tool directory (default `~/.spat`)
//! - `SPAT_GITHUB_API_URL` - GitHub API base (default `https://api.github.com`)

use crate::error::{Error, Result};
use crate::platform::Platform;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use url::Url;

pub const HOME_ENV: &str = "SPAT_HOME";
pub const GITHUB_API_ENV: &str = "SPAT_GITHUB_API_URL";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Tool installed by `spat init`
pub const DEFAULT_STARTER_TOOLS: &[&str] = &["ocm-cli"];

/// Mode for the tool directory and its subdirectories
pub const DIR_MODE: u32 = 0o700;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Base tool directory holding `bin/`, `tmp/` and the manifest
    pub home: PathBuf,
    /// Base URL of the GitHub REST API
    pub github_api_url: Url,
    /// Platform used to expand artifact patterns
    pub platform: Platform,
    /// User agent for every HTTP request
    pub user_agent: String,
    /// Tool ids installed by the bootstrap flow
    pub starter_tools: Vec<String>,
}

impl Settings {
    /// Settings rooted at `home`, everything else default
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            github_api_url: Url::parse(DEFAULT_GITHUB_API_URL)
                .expect("default GitHub API URL is valid"),
            platform: Platform::current(),
            user_agent: format!("spat/{}", env!("CARGO_PKG_VERSION")),
            starter_tools: DEFAULT_STARTER_TOOLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Resolve settings from the environment
    pub fn from_env() -> Result<Self> {
        Self::from_overrides(
            std::env::var_os(HOME_ENV),
            std::env::var(GITHUB_API_ENV).ok(),
        )
    }

    /// Resolve settings from raw `SPAT_HOME` / `SPAT_GITHUB_API_URL` values.
    ///
    /// An empty home falls back to `~/.spat`.
    fn from_overrides(home: Option<OsString>, github_api: Option<String>) -> Result<Self> {
        let home = match home {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or_else(|| Error::Config("could not determine the home directory".to_string()))?
                .join(".spat"),
        };

        let mut settings = Self::with_home(home);
        if let Some(api) = github_api {
            settings.github_api_url = Url::parse(&api)
                .map_err(|e| Error::Config(format!("invalid {} '{}': {}", GITHUB_API_ENV, api, e)))?;
        }
        Ok(settings)
    }

    /// Directory installed executables live in
    pub fn bin_dir(&self) -> PathBuf {
        self.home.join("bin")
    }

    /// Directory for in-flight downloads
    pub fn scratch_dir(&self) -> PathBuf {
        self.home.join("tmp")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.home.join("manifest.yaml")
    }

    /// Create the tool directory, `bin/` and `tmp/` if missing.
    ///
    /// Directories that already exist are left alone.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [self.home.clone(), self.bin_dir(), self.scratch_dir()] {
            create_private_dir(&dir)?;
        }
        Ok(())
    }
}

fn create_private_dir(dir: &Path) -> Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder
        .create(dir)
        .map_err(|e| Error::fs("create directory", dir, e))
}
