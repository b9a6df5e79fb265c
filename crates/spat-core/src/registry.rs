//! Catalog of managed tools
//!
//! A [`ToolRegistry`] is an ordered list of [`ToolDescriptor`]s. The order is
//! the declaration order and is what `check` reports in.

use std::fmt;

/// Release-hosting provider kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    GitHub,
    GitLab,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
            ProviderKind::GitLab => "gitlab",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a tool's releases are published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// `org/repo` on GitHub
    GitHub { repo: String },
    /// Numeric project id on a GitLab instance, with the instance's API base
    /// URL (e.g. `https://gitlab.com/api/v4`)
    GitLab { base_url: String, project_id: u64 },
}

impl Locator {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Locator::GitHub { .. } => ProviderKind::GitHub,
            Locator::GitLab { .. } => ProviderKind::GitLab,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::GitHub { repo } => write!(f, "{}", repo),
            Locator::GitLab {
                base_url,
                project_id,
            } => write!(f, "{} project {}", base_url, project_id),
        }
    }
}

/// Configuration for one managed tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    /// Human-readable identifier (e.g., "ocm-cli")
    pub id: String,
    /// Where releases are looked up
    pub locator: Locator,
    /// Regular expression matched against artifact URLs; may contain
    /// platform placeholders (see [`crate::Platform::expand`])
    pub artifact_pattern: String,
    /// File name the binary is installed as
    pub binary_name: String,
}

impl ToolDescriptor {
    pub fn github(id: &str, repo: &str, artifact_pattern: &str, binary_name: &str) -> Self {
        Self {
            id: id.to_string(),
            locator: Locator::GitHub {
                repo: repo.to_string(),
            },
            artifact_pattern: artifact_pattern.to_string(),
            binary_name: binary_name.to_string(),
        }
    }

    pub fn gitlab(
        id: &str,
        base_url: &str,
        project_id: u64,
        artifact_pattern: &str,
        binary_name: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            locator: Locator::GitLab {
                base_url: base_url.to_string(),
                project_id,
            },
            artifact_pattern: artifact_pattern.to_string(),
            binary_name: binary_name.to_string(),
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.locator.provider()
    }
}

/// Ordered catalog of tool descriptors
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    /// The production access tools managed out of the box
    pub fn builtin() -> Self {
        Self::new(vec![
            ToolDescriptor::gitlab(
                "backplane-cli",
                "https://gitlab.cee.redhat.com/api/v4",
                33674,
                r"/ocm-backplane_[^/]*_{Os}_{cpu}\.tar\.gz$",
                "ocm-backplane",
            ),
            ToolDescriptor::github(
                "ocm-cli",
                "openshift-online/ocm-cli",
                "/ocm-{os}-{arch}$",
                "ocm",
            ),
            ToolDescriptor::github(
                "osdctl",
                "openshift/osdctl",
                r"/osdctl_[^/]*_{Os}_{cpu}\.tar\.gz$",
                "osdctl",
            ),
            ToolDescriptor::github("rosa", "openshift/rosa", "/rosa-{os}-{arch}$", "rosa"),
            ToolDescriptor::github("butane", "coreos/butane", "/butane-{triple}$", "butane"),
            ToolDescriptor::github(
                "prometheus",
                "prometheus/prometheus",
                r"/prometheus-[^/]*\.{os}-{arch}\.tar\.gz$",
                "prometheus",
            ),
        ])
    }

    /// Find a descriptor by id
    pub fn lookup(&self, id: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.id == id)
    }

    /// All descriptors in declaration order
    pub fn all(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn ids(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.id.as_str()).collect()
    }
}
