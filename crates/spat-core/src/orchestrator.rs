//! The `init`, `check` and `upgrade` flows
//!
//! Each flow walks the registry in declaration order, one tool at a time.
//! Bootstrap stops at the first failure; check and upgrade record a result per
//! tool and carry on, so one unreachable provider does not hide the rest.

use crate::assets::select_asset;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::install::{InstallManifest, InstalledTool, Installer};
use crate::registry::{ProviderKind, ToolDescriptor, ToolRegistry};
use crate::release::{Providers, ReleaseInfo};
use crate::version::needs_upgrade;
use std::path::PathBuf;

/// Result of installing one tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub tool_id: String,
    pub version: String,
    pub binary_path: PathBuf,
    pub source_url: String,
}

/// Latest-release lookup result for one tool
#[derive(Debug)]
pub struct CheckReport {
    pub tool_id: String,
    pub provider: ProviderKind,
    /// Version recorded in the manifest, if the binary is still present
    pub installed: Option<String>,
    pub result: Result<ReleaseInfo>,
}

#[derive(Debug)]
pub enum UpgradeOutcome {
    UpToDate { version: String },
    Installed {
        previous: Option<String>,
        outcome: InstallOutcome,
    },
    Failed(Error),
}

#[derive(Debug)]
pub struct UpgradeReport {
    pub tool_id: String,
    pub outcome: UpgradeOutcome,
}

pub struct Orchestrator {
    settings: Settings,
    registry: ToolRegistry,
    providers: Providers,
    installer: Installer,
}

impl Orchestrator {
    /// Create an orchestrator talking to the real providers
    pub fn new(settings: Settings, registry: ToolRegistry) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(settings, registry, client)
    }

    /// Create an orchestrator using the given HTTP client for every request
    pub fn with_client(settings: Settings, registry: ToolRegistry, client: reqwest::Client) -> Self {
        let providers = Providers::new(client.clone(), settings.github_api_url.clone());
        let installer = Installer::new(client, settings.scratch_dir());
        Self {
            settings,
            registry,
            providers,
            installer,
        }
    }

    /// Replace the release sources, e.g. with fakes
    pub fn with_providers(mut self, providers: Providers) -> Self {
        self.providers = providers;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Create the tool directory layout and install the starter tools.
    ///
    /// Any failure aborts the flow. Install errors name the tool they hit.
    pub async fn bootstrap(&self) -> Result<Vec<InstallOutcome>> {
        self.settings.ensure_layout()?;

        let mut outcomes = Vec::new();
        for id in &self.settings.starter_tools {
            let descriptor = self
                .registry
                .lookup(id)
                .ok_or_else(|| Error::UnknownTool(id.clone()))?;
            let outcome = self
                .install_tool(descriptor)
                .await
                .map_err(|e| e.for_tool(id.as_str()))?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Look up the latest release of every managed tool
    pub async fn check(&self) -> Vec<CheckReport> {
        let manifest = self.load_manifest();

        let mut reports = Vec::with_capacity(self.registry.all().len());
        for descriptor in self.registry.all() {
            let result = self
                .providers
                .fetch_latest_release(&descriptor.locator)
                .await;

            if let Err(e) = &result {
                tracing::warn!(tool = %descriptor.id, error = %e, "release lookup failed");
            }

            reports.push(CheckReport {
                tool_id: descriptor.id.clone(),
                provider: descriptor.provider(),
                installed: self.installed_version(&manifest, descriptor),
                result,
            });
        }
        reports
    }

    /// Install every tool (or just `only`) that is absent or outdated.
    ///
    /// Unknown ids in `only` fail the whole flow before anything is fetched.
    /// An id given more than once is upgraded once, at its first position.
    pub async fn upgrade(&self, only: &[String]) -> Result<Vec<UpgradeReport>> {
        let selected: Vec<&ToolDescriptor> = if only.is_empty() {
            self.registry.all().iter().collect()
        } else {
            let mut selected: Vec<&ToolDescriptor> = Vec::with_capacity(only.len());
            for id in only {
                let descriptor = self
                    .registry
                    .lookup(id)
                    .ok_or_else(|| Error::UnknownTool(id.clone()))?;
                if !selected.iter().any(|d| d.id == descriptor.id) {
                    selected.push(descriptor);
                }
            }
            selected
        };

        let manifest = self.load_manifest();

        let mut reports = Vec::with_capacity(selected.len());
        for descriptor in selected {
            let previous = self.installed_version(&manifest, descriptor);
            let outcome = match self.upgrade_one(descriptor, previous.as_deref()).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!(tool = %descriptor.id, error = %e, "upgrade failed");
                    UpgradeOutcome::Failed(e)
                }
            };
            reports.push(UpgradeReport {
                tool_id: descriptor.id.clone(),
                outcome,
            });
        }
        Ok(reports)
    }

    async fn upgrade_one(
        &self,
        descriptor: &ToolDescriptor,
        installed: Option<&str>,
    ) -> Result<UpgradeOutcome> {
        let release = self
            .providers
            .fetch_latest_release(&descriptor.locator)
            .await?;

        if !needs_upgrade(installed, &release.version) {
            return Ok(UpgradeOutcome::UpToDate {
                version: release.version,
            });
        }

        let outcome = self.install_release(descriptor, release).await?;
        Ok(UpgradeOutcome::Installed {
            previous: installed.map(str::to_string),
            outcome,
        })
    }

    /// Resolve, select and install the latest release of one tool
    pub async fn install_tool(&self, descriptor: &ToolDescriptor) -> Result<InstallOutcome> {
        let release = self
            .providers
            .fetch_latest_release(&descriptor.locator)
            .await?;
        self.install_release(descriptor, release).await
    }

    async fn install_release(
        &self,
        descriptor: &ToolDescriptor,
        release: ReleaseInfo,
    ) -> Result<InstallOutcome> {
        let pattern = self.settings.platform.expand(&descriptor.artifact_pattern);
        let asset = select_asset(&release.artifacts, &pattern)?
            .ok_or_else(|| Error::AssetNotFound {
                pattern: pattern.clone(),
                candidates: release.artifacts.len(),
            })?
            .to_string();

        tracing::debug!(tool = %descriptor.id, %asset, "selected artifact");

        self.settings.ensure_layout()?;
        let target = self.settings.bin_dir().join(&descriptor.binary_name);
        let installed = self.installer.install(&asset, &target).await?;

        let manifest_path = self.settings.manifest_path();
        let mut manifest = self.load_manifest();
        manifest.record(
            &descriptor.id,
            InstalledTool {
                version: release.version.clone(),
                binary: descriptor.binary_name.clone(),
                source_url: asset.clone(),
            },
        );
        manifest.save(&manifest_path)?;

        tracing::info!(
            tool = %descriptor.id,
            version = %release.version,
            binary = %descriptor.binary_name,
            "installed tool"
        );

        Ok(InstallOutcome {
            tool_id: descriptor.id.clone(),
            version: release.version,
            binary_path: installed.path,
            source_url: asset,
        })
    }

    /// Current manifest; an unreadable one is treated as empty
    fn load_manifest(&self) -> InstallManifest {
        let path = self.settings.manifest_path();
        InstallManifest::load(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable manifest");
            InstallManifest::default()
        })
    }

    /// Recorded version, if the recorded binary still exists
    fn installed_version(
        &self,
        manifest: &InstallManifest,
        descriptor: &ToolDescriptor,
    ) -> Option<String> {
        let record = manifest.get(&descriptor.id)?;
        if self.settings.bin_dir().join(&record.binary).is_file() {
            Some(record.version.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::release::test_client;
    use mockito::{Server, ServerGuard};
    use url::Url;

    const BINARY: &[u8] = b"\x7fELF\x02\x01\x01\x00fake tool binary";

    struct Env {
        _temp: tempfile::TempDir,
        settings: Settings,
    }

    fn env(server: &ServerGuard) -> Env {
        let temp = tempfile::tempdir().unwrap();
        let mut settings = Settings::with_home(temp.path().join(".spat"));
        settings.github_api_url = Url::parse(&server.url()).unwrap();
        settings.platform = Platform::new("linux", "x86_64");
        Env {
            _temp: temp,
            settings,
        }
    }

    fn github_tool() -> ToolDescriptor {
        ToolDescriptor::github("tool", "acme/tool", "/tool-{os}-{arch}$", "tool")
    }

    fn github_release_body(server: &ServerGuard, tag: &str) -> String {
        format!(
            r#"{{"tag_name": "{tag}", "assets": [
                {{"name": "tool-darwin-arm64", "browser_download_url": "{url}/dl/{tag}/tool-darwin-arm64"}},
                {{"name": "tool-linux-amd64", "browser_download_url": "{url}/dl/{tag}/tool-linux-amd64"}}
            ]}}"#,
            tag = tag,
            url = server.url()
        )
    }

    async fn mock_github_release(server: &mut ServerGuard, tag: &str) -> mockito::Mock {
        let body = github_release_body(server, tag);
        server
            .mock("GET", "/repos/acme/tool/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    async fn mock_download(server: &mut ServerGuard, tag: &str) -> mockito::Mock {
        server
            .mock("GET", format!("/dl/{}/tool-linux-amd64", tag).as_str())
            .with_status(200)
            .with_body(BINARY)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_bootstrap_installs_starter_tool() {
        let mut server = Server::new_async().await;
        let _release = mock_github_release(&mut server, "v1.2.3").await;
        let _download = mock_download(&mut server, "v1.2.3").await;

        let e = env(&server);
        let mut settings = e.settings.clone();
        settings.starter_tools = vec!["tool".to_string()];
        let orchestrator = Orchestrator::with_client(
            settings.clone(),
            ToolRegistry::new(vec![github_tool()]),
            test_client(),
        );

        let outcomes = orchestrator.bootstrap().await.unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].version, "v1.2.3");
        assert_eq!(outcomes[0].binary_path, settings.bin_dir().join("tool"));
        assert_eq!(std::fs::read(settings.bin_dir().join("tool")).unwrap(), BINARY);
        assert!(settings.scratch_dir().is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(settings.bin_dir().join("tool"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o755);
        }

        let manifest = InstallManifest::load(&settings.manifest_path()).unwrap();
        let record = manifest.get("tool").unwrap();
        assert_eq!(record.version, "v1.2.3");
        assert!(record.source_url.ends_with("/dl/v1.2.3/tool-linux-amd64"));
    }

    #[tokio::test]
    async fn test_bootstrap_unknown_starter_tool_is_fatal() {
        let server = Server::new_async().await;
        let e = env(&server);
        let mut settings = e.settings.clone();
        settings.starter_tools = vec!["missing".to_string()];
        let orchestrator =
            Orchestrator::with_client(settings, ToolRegistry::new(vec![github_tool()]), test_client());

        let err = orchestrator.bootstrap().await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool(ref id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_bootstrap_failure_names_the_tool() {
        let mut server = Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/acme/tool/releases/latest")
            .with_status(200)
            .with_body(
                r#"{"tag_name": "v1.0.0", "assets": [
                    {"name": "a", "browser_download_url": "https://x/tool-darwin-arm64"}
                ]}"#,
            )
            .create_async()
            .await;

        let e = env(&server);
        let mut settings = e.settings.clone();
        settings.starter_tools = vec!["tool".to_string()];
        let orchestrator =
            Orchestrator::with_client(settings, ToolRegistry::new(vec![github_tool()]), test_client());

        let err = orchestrator.bootstrap().await.unwrap_err();

        assert!(err.to_string().starts_with("tool: "), "got {}", err);
        assert_eq!(err.kind(), "asset not found");
        match err {
            Error::Tool { tool, source } => {
                assert_eq!(tool, "tool");
                assert!(matches!(*source, Error::AssetNotFound { .. }));
            }
            other => panic!("expected tool context, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_matching_asset_writes_nothing() {
        let mut server = Server::new_async().await;
        let _release = server
            .mock("GET", "/repos/acme/tool/releases/latest")
            .with_status(200)
            .with_body(
                r#"{"tag_name": "v2.0.0", "assets": [
                    {"name": "a", "browser_download_url": "https://x/tool-darwin-arm64"},
                    {"name": "b", "browser_download_url": "https://x/tool-windows-amd64.exe"},
                    {"name": "c", "browser_download_url": "https://x/checksums.txt"}
                ]}"#,
            )
            .create_async()
            .await;

        let e = env(&server);
        let orchestrator = Orchestrator::with_client(
            e.settings.clone(),
            ToolRegistry::new(vec![github_tool()]),
            test_client(),
        );

        let err = orchestrator.install_tool(&github_tool()).await.unwrap_err();

        match err {
            Error::AssetNotFound {
                pattern,
                candidates,
            } => {
                assert_eq!(pattern, "/tool-linux-amd64$");
                assert_eq!(candidates, 3);
            }
            other => panic!("expected AssetNotFound, got {:?}", other),
        }
        assert!(!e.settings.home.exists());
    }

    #[tokio::test]
    async fn test_check_isolates_failures_and_keeps_order() {
        let mut server = Server::new_async().await;
        let _gitlab = server
            .mock("GET", "/api/v4/projects/1/releases")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/repos/acme/broken/releases/latest")
            .with_status(500)
            .create_async()
            .await;
        let _release = mock_github_release(&mut server, "v1.2.3").await;

        let e = env(&server);
        let registry = ToolRegistry::new(vec![
            ToolDescriptor::gitlab(
                "backplane",
                &format!("{}/api/v4", server.url()),
                1,
                "/backplane$",
                "backplane",
            ),
            ToolDescriptor::github("broken", "acme/broken", "/broken$", "broken"),
            github_tool(),
        ]);
        let orchestrator = Orchestrator::with_client(e.settings.clone(), registry, test_client());

        let reports = orchestrator.check().await;

        let ids: Vec<_> = reports.iter().map(|r| r.tool_id.as_str()).collect();
        assert_eq!(ids, vec!["backplane", "broken", "tool"]);

        assert_eq!(reports[0].provider, ProviderKind::GitLab);
        assert!(matches!(
            reports[0].result,
            Err(Error::EmptyReleaseList { .. })
        ));
        assert!(matches!(reports[1].result, Err(Error::Network { .. })));

        let release = reports[2].result.as_ref().unwrap();
        assert_eq!(release.version, "v1.2.3");
        assert_eq!(release.artifacts.len(), 2);
        assert!(reports[2].installed.is_none());
    }

    #[tokio::test]
    async fn test_upgrade_installs_then_reports_up_to_date() {
        let mut server = Server::new_async().await;
        let release = mock_github_release(&mut server, "v1.0.0").await;
        let download = mock_download(&mut server, "v1.0.0").await;

        let e = env(&server);
        let orchestrator = Orchestrator::with_client(
            e.settings.clone(),
            ToolRegistry::new(vec![github_tool()]),
            test_client(),
        );

        let first = orchestrator.upgrade(&[]).await.unwrap();
        assert!(matches!(
            &first[0].outcome,
            UpgradeOutcome::Installed { previous: None, outcome } if outcome.version == "v1.0.0"
        ));

        let second = orchestrator.upgrade(&[]).await.unwrap();
        assert!(matches!(
            &second[0].outcome,
            UpgradeOutcome::UpToDate { version } if version == "v1.0.0"
        ));

        // A newer release replaces the binary and remembers what was there
        release.remove_async().await;
        download.remove_async().await;
        let _release = mock_github_release(&mut server, "v1.1.0").await;
        let _download = mock_download(&mut server, "v1.1.0").await;

        let third = orchestrator.upgrade(&["tool".to_string()]).await.unwrap();
        match &third[0].outcome {
            UpgradeOutcome::Installed { previous, outcome } => {
                assert_eq!(previous.as_deref(), Some("v1.0.0"));
                assert_eq!(outcome.version, "v1.1.0");
            }
            other => panic!("expected install, got {:?}", other),
        }

        let reports = orchestrator.check().await;
        assert_eq!(reports[0].installed.as_deref(), Some("v1.1.0"));
    }

    #[tokio::test]
    async fn test_upgrade_reinstalls_missing_binary() {
        let mut server = Server::new_async().await;
        let _release = mock_github_release(&mut server, "v1.0.0").await;
        let _download = mock_download(&mut server, "v1.0.0").await;

        let e = env(&server);
        let orchestrator = Orchestrator::with_client(
            e.settings.clone(),
            ToolRegistry::new(vec![github_tool()]),
            test_client(),
        );

        orchestrator.upgrade(&[]).await.unwrap();
        std::fs::remove_file(e.settings.bin_dir().join("tool")).unwrap();

        let reports = orchestrator.upgrade(&[]).await.unwrap();
        assert!(matches!(
            &reports[0].outcome,
            UpgradeOutcome::Installed { previous: None, .. }
        ));
        assert!(e.settings.bin_dir().join("tool").is_file());
    }

    #[tokio::test]
    async fn test_upgrade_repeated_id_runs_once() {
        let mut server = Server::new_async().await;
        let release = mock_github_release(&mut server, "v1.0.0").await;
        let download = mock_download(&mut server, "v1.0.0").await;

        let e = env(&server);
        let orchestrator = Orchestrator::with_client(
            e.settings.clone(),
            ToolRegistry::new(vec![github_tool()]),
            test_client(),
        );

        let reports = orchestrator
            .upgrade(&["tool".to_string(), "tool".to_string()])
            .await
            .unwrap();

        assert_eq!(reports.len(), 1);
        assert!(matches!(
            &reports[0].outcome,
            UpgradeOutcome::Installed { previous: None, .. }
        ));
        release.assert_async().await;
        download.assert_async().await;
    }

    #[tokio::test]
    async fn test_upgrade_unknown_tool_fails_before_fetching() {
        let mut server = Server::new_async().await;
        let release = server
            .mock("GET", "/repos/acme/tool/releases/latest")
            .expect(0)
            .create_async()
            .await;

        let e = env(&server);
        let orchestrator = Orchestrator::with_client(
            e.settings.clone(),
            ToolRegistry::new(vec![github_tool()]),
            test_client(),
        );

        let err = orchestrator
            .upgrade(&["tool".to_string(), "nope".to_string()])
            .await
            .unwrap_err();

        release.assert_async().await;
        assert!(matches!(err, Error::UnknownTool(ref id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_upgrade_records_per_tool_failures() {
        let mut server = Server::new_async().await;
        let _release = mock_github_release(&mut server, "v1.0.0").await;
        let _download = mock_download(&mut server, "v1.0.0").await;
        let _archive = server
            .mock("GET", "/repos/acme/packed/releases/latest")
            .with_status(200)
            .with_body(format!(
                r#"{{"tag_name": "v3.0.0", "assets": [
                    {{"name": "packed", "browser_download_url": "{}/dl/packed_Linux_x86_64.tar.gz"}}
                ]}}"#,
                server.url()
            ))
            .create_async()
            .await;

        let e = env(&server);
        let registry = ToolRegistry::new(vec![
            ToolDescriptor::github(
                "packed",
                "acme/packed",
                r"/packed_{Os}_{cpu}\.tar\.gz$",
                "packed",
            ),
            github_tool(),
        ]);
        let orchestrator = Orchestrator::with_client(e.settings.clone(), registry, test_client());

        let reports = orchestrator.upgrade(&[]).await.unwrap();

        assert!(matches!(
            &reports[0].outcome,
            UpgradeOutcome::Failed(Error::UnsupportedArtifact { .. })
        ));
        assert!(matches!(&reports[1].outcome, UpgradeOutcome::Installed { .. }));
    }
}
