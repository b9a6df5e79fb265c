//! Record of installed tool versions (`<home>/manifest.yaml`)

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// What was installed for one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledTool {
    /// Release tag the binary came from
    pub version: String,

    /// File name inside the tool directory's `bin/`
    pub binary: String,

    /// Artifact URL the binary was downloaded from
    pub source_url: String,
}

/// Installed tools keyed by tool id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallManifest {
    #[serde(default)]
    pub tools: BTreeMap<String, InstalledTool>,
}

impl InstallManifest {
    /// Read the manifest, or an empty one if the file does not exist yet
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::fs("read manifest", path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content)
            .map_err(|e| Error::decode(path.display().to_string(), e))
    }

    /// Write the manifest through a temp file in the same directory.
    ///
    /// Every failure, encoding included, is a [`Error::FileSystem`] on `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).map_err(|e| {
            Error::fs(
                "encode manifest",
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })?;

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::Builder::new()
            .prefix(".manifest-")
            .tempfile_in(dir)
            .map_err(|e| Error::fs("create manifest in", dir, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| Error::fs("write manifest", file.path(), e))?;
        file.persist(path)
            .map_err(|e| Error::fs("replace manifest", path, e.error))?;
        Ok(())
    }

    pub fn get(&self, tool_id: &str) -> Option<&InstalledTool> {
        self.tools.get(tool_id)
    }

    pub fn record(&mut self, tool_id: &str, tool: InstalledTool) {
        self.tools.insert(tool_id.to_string(), tool);
    }
}
