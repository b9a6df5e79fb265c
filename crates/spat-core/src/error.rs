//! Error types for release resolution and installation

use crate::registry::ProviderKind;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for spat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, selecting or installing a tool.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport, DNS or TLS failure, or a non-2xx response.
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// Response body does not have the expected JSON or YAML shape.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The provider returned zero releases.
    #[error("no releases published at {url}")]
    EmptyReleaseList { url: String },

    /// No artifact of the latest release matched the configured pattern.
    #[error("no artifact matches pattern '{pattern}' ({candidates} candidates)")]
    AssetNotFound { pattern: String, candidates: usize },

    /// The artifact is an archive and would need unpacking.
    #[error("artifact {url} is a {format} archive; unpacking is not supported")]
    UnsupportedArtifact { url: String, format: &'static str },

    /// Directory creation, download write, atomic move or permission change failed.
    #[error("failed to {action} {}: {source}", .path.display())]
    FileSystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact pattern is not a valid regular expression.
    #[error("invalid artifact pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// No descriptor with this id exists in the registry.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// Settings could not be resolved.
    #[error("configuration error: {0}")]
    Config(String),

    /// A release source was handed a locator for another provider.
    #[error("{expected} source cannot resolve locator '{locator}'")]
    LocatorMismatch {
        expected: ProviderKind,
        locator: String,
    },

    /// A step failed while working on one particular tool.
    #[error("{tool}: {source}")]
    Tool {
        tool: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub(crate) fn network(url: impl Into<String>, message: impl ToString) -> Self {
        Error::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn decode(url: impl Into<String>, message: impl ToString) -> Self {
        Error::Decode {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn fs(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileSystem {
            action,
            path: path.into(),
            source,
        }
    }

    /// Attach the id of the tool being worked on
    pub fn for_tool(self, tool: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            source: Box::new(self),
        }
    }

    /// Short name of the error kind, used in user-facing reports
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Network { .. } => "network",
            Error::Decode { .. } => "decode",
            Error::EmptyReleaseList { .. } => "empty release list",
            Error::AssetNotFound { .. } => "asset not found",
            Error::UnsupportedArtifact { .. } => "unsupported artifact",
            Error::FileSystem { .. } => "filesystem",
            Error::InvalidPattern { .. } => "invalid pattern",
            Error::UnknownTool(_) => "unknown tool",
            Error::Config(_) => "configuration",
            Error::LocatorMismatch { .. } => "locator mismatch",
            Error::Tool { source, .. } => source.kind(),
        }
    }

    /// Process exit code for this kind of failure.
    ///
    /// Codes 0-2 are left to success and command-line usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Network { .. } => 3,
            Error::Decode { .. } => 4,
            Error::EmptyReleaseList { .. } => 5,
            Error::AssetNotFound { .. } => 6,
            Error::UnsupportedArtifact { .. } => 7,
            Error::FileSystem { .. } => 8,
            Error::InvalidPattern { .. } => 9,
            Error::UnknownTool(_) => 10,
            Error::Config(_) => 11,
            Error::LocatorMismatch { .. } => 12,
            Error::Tool { source, .. } => source.exit_code(),
        }
    }
}
