//! GitHub "latest release" lookup

use super::{build_url, get_text, ReleaseInfo, ReleaseSource};
use crate::error::{Error, Result};
use crate::registry::{Locator, ProviderKind};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    assets: Vec<GithubAsset>,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    #[allow(dead_code)]
    name: String,
    browser_download_url: String,
}

/// Resolves `GET <api>/repos/<org>/<repo>/releases/latest`
pub struct GitHubSource {
    client: reqwest::Client,
    api_url: Url,
}

impl GitHubSource {
    pub fn new(client: reqwest::Client, api_url: Url) -> Self {
        Self { client, api_url }
    }

    fn latest_release_url(&self, repo: &str) -> Result<Url> {
        let mut segments = vec!["repos"];
        segments.extend(repo.split('/').filter(|s| !s.is_empty()));
        segments.extend(["releases", "latest"]);
        build_url(&self.api_url, &segments)
    }
}

#[async_trait]
impl ReleaseSource for GitHubSource {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    async fn fetch_latest_release(&self, locator: &Locator) -> Result<ReleaseInfo> {
        let Locator::GitHub { repo } = locator else {
            return Err(Error::LocatorMismatch {
                expected: ProviderKind::GitHub,
                locator: locator.to_string(),
            });
        };

        let url = self.latest_release_url(repo)?;
        let body = get_text(&self.client, &url).await?;
        let release: GithubRelease =
            serde_json::from_str(&body).map_err(|e| Error::decode(url.as_str(), e))?;

        tracing::debug!(
            repo = %repo,
            tag = %release.tag_name,
            assets = release.assets.len(),
            "resolved latest GitHub release"
        );

        Ok(ReleaseInfo {
            version: release.tag_name,
            artifacts: release
                .assets
                .into_iter()
                .map(|a| a.browser_download_url)
                .collect(),
        })
    }
}
