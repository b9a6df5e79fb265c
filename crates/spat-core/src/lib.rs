//! spat core - release resolution and installation for managed CLI tools
//!
//! This library provides everything the `spat` binary does, minus the
//! command-line framing. It is organized into layers:
//!
//! - **Layer 1: Core Operations** - release lookup per provider, artifact
//!   selection, atomic install of a downloaded binary
//! - **Layer 2: Workflow Orchestration** - [`Orchestrator`] composing the
//!   operations into the `init`, `check` and `upgrade` flows
//!
//! # Example Usage
//!
//! ```ignore
//! use spat_core::{Orchestrator, Settings, ToolRegistry};
//!
//! let settings = Settings::from_env()?;
//! let orchestrator = Orchestrator::new(settings, ToolRegistry::builtin());
//! for report in orchestrator.check().await {
//!     println!("{}: {:?}", report.tool_id, report.result.map(|r| r.version));
//! }
//! ```

pub mod assets;
pub mod config;
pub mod error;
pub mod install;
pub mod orchestrator;
pub mod platform;
pub mod registry;
pub mod release;
pub mod version;

// Re-export main types for convenience
pub use assets::{archive_format, select_asset};
pub use config::Settings;
pub use error::{Error, Result};
pub use install::{InstallManifest, InstalledBinary, InstalledTool, Installer};
pub use orchestrator::{CheckReport, InstallOutcome, Orchestrator, UpgradeOutcome, UpgradeReport};
pub use platform::Platform;
pub use registry::{Locator, ProviderKind, ToolDescriptor, ToolRegistry};
pub use release::{GitHubSource, GitLabSource, Providers, ReleaseInfo, ReleaseSource};
