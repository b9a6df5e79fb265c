//! Latest-release lookup on release-hosting providers
//!
//! Each provider kind has one [`ReleaseSource`] implementation. [`Providers`]
//! bundles one source per kind and picks the right one for a descriptor.

pub mod github;
pub mod gitlab;

use crate::error::{Error, Result};
use crate::registry::{Locator, ProviderKind};
use async_trait::async_trait;
use url::Url;

pub use github::GitHubSource;
pub use gitlab::GitLabSource;

/// Latest published release of a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Tag as published by the provider (not validated as semver)
    pub version: String,
    /// Download URLs, in provider response order
    pub artifacts: Vec<String>,
}

#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Provider kind this source resolves
    fn kind(&self) -> ProviderKind;

    /// Fetch the latest release published at `locator`
    async fn fetch_latest_release(&self, locator: &Locator) -> Result<ReleaseInfo>;
}

/// One release source per provider kind
pub struct Providers {
    github: Box<dyn ReleaseSource>,
    gitlab: Box<dyn ReleaseSource>,
}

impl Providers {
    /// The real GitHub and GitLab sources sharing one HTTP client
    pub fn new(client: reqwest::Client, github_api_url: Url) -> Self {
        Self {
            github: Box::new(GitHubSource::new(client.clone(), github_api_url)),
            gitlab: Box::new(GitLabSource::new(client)),
        }
    }

    pub fn custom(github: Box<dyn ReleaseSource>, gitlab: Box<dyn ReleaseSource>) -> Self {
        Self { github, gitlab }
    }

    pub fn for_kind(&self, kind: ProviderKind) -> &dyn ReleaseSource {
        match kind {
            ProviderKind::GitHub => self.github.as_ref(),
            ProviderKind::GitLab => self.gitlab.as_ref(),
        }
    }

    /// Fetch the latest release from whichever provider hosts `locator`
    pub async fn fetch_latest_release(&self, locator: &Locator) -> Result<ReleaseInfo> {
        self.for_kind(locator.provider())
            .fetch_latest_release(locator)
            .await
    }
}

/// Build a URL by appending path segments, preserving query parameters
fn build_url(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("URL cannot have path segments: {}", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// GET `url` and return the body of a successful response
async fn get_text(client: &reqwest::Client, url: &Url) -> Result<String> {
    tracing::debug!(%url, "fetching release metadata");

    let response = client
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| Error::network(url.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::network(url.as_str(), format!("HTTP {}", status)));
    }

    response
        .text()
        .await
        .map_err(|e| Error::network(url.as_str(), e))
}

#[cfg(test)]
pub(crate) fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .user_agent("spat-test")
        .build()
        .unwrap()
}
