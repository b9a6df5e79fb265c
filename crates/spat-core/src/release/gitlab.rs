//! GitLab releases-list lookup
//!
//! The release list is fetched and its first element taken. The list is used
//! in the order the server returns it, which is newest first by release date.

use super::{build_url, get_text, ReleaseInfo, ReleaseSource};
use crate::error::{Error, Result};
use crate::registry::{Locator, ProviderKind};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct GitlabRelease {
    tag_name: String,
    assets: GitlabAssets,
}

#[derive(Debug, Deserialize)]
struct GitlabAssets {
    #[serde(default)]
    links: Vec<GitlabLink>,
}

#[derive(Debug, Deserialize)]
struct GitlabLink {
    direct_asset_url: String,
}

/// Resolves `GET <base>/projects/<id>/releases`
pub struct GitLabSource {
    client: reqwest::Client,
}

impl GitLabSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn releases_url(base_url: &str, project_id: u64) -> Result<Url> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid GitLab URL '{}': {}", base_url, e)))?;
        let id = project_id.to_string();
        build_url(&base, &["projects", id.as_str(), "releases"])
    }
}

#[async_trait]
impl ReleaseSource for GitLabSource {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    async fn fetch_latest_release(&self, locator: &Locator) -> Result<ReleaseInfo> {
        let Locator::GitLab {
            base_url,
            project_id,
        } = locator
        else {
            return Err(Error::LocatorMismatch {
                expected: ProviderKind::GitLab,
                locator: locator.to_string(),
            });
        };

        let url = Self::releases_url(base_url, *project_id)?;
        let body = get_text(&self.client, &url).await?;
        let releases: Vec<GitlabRelease> =
            serde_json::from_str(&body).map_err(|e| Error::decode(url.as_str(), e))?;

        let latest = releases
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmptyReleaseList {
                url: url.to_string(),
            })?;

        tracing::debug!(
            project = project_id,
            tag = %latest.tag_name,
            links = latest.assets.links.len(),
            "resolved latest GitLab release"
        );

        Ok(ReleaseInfo {
            version: latest.tag_name,
            artifacts: latest
                .assets
                .links
                .into_iter()
                .map(|l| l.direct_asset_url)
                .collect(),
        })
    }
}
