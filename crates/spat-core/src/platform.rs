//! Platform detection and artifact pattern expansion
//!
//! Release artifacts name the same platform in different ways: Go projects use
//! `linux-amd64`, goreleaser uses `Linux_x86_64`, Rust projects use target
//! triples. Artifact patterns reference the current platform through
//! placeholders so one descriptor works across machines:
//!
//! | placeholder | linux/x86_64               | macos/aarch64          |
//! |-------------|----------------------------|------------------------|
//! | `{os}`      | `linux`                    | `darwin`               |
//! | `{Os}`      | `Linux`                    | `Darwin`               |
//! | `{arch}`    | `amd64`                    | `arm64`                |
//! | `{cpu}`     | `x86_64`                   | `aarch64`              |
//! | `{triple}`  | `x86_64-unknown-linux-gnu` | `aarch64-apple-darwin` |

use std::fmt;

/// Operating system and CPU architecture, in Rust's `std::env::consts` naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: String,
    cpu: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, cpu: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            cpu: cpu.into(),
        }
    }

    /// The platform this process runs on
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Go-style OS name (`linux`, `darwin`, `windows`)
    pub fn os(&self) -> &str {
        match self.os.as_str() {
            "macos" => "darwin",
            other => other,
        }
    }

    /// Capitalized OS name as used by goreleaser archives
    pub fn os_title(&self) -> String {
        let os = self.os();
        let mut chars = os.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Go-style architecture name (`amd64`, `arm64`)
    pub fn arch(&self) -> &str {
        match self.cpu.as_str() {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            other => other,
        }
    }

    /// Rust-style CPU name (`x86_64`, `aarch64`)
    pub fn cpu(&self) -> &str {
        &self.cpu
    }

    /// Rust target triple for the common hosts
    pub fn triple(&self) -> String {
        let suffix = match self.os.as_str() {
            "linux" => "unknown-linux-gnu",
            "macos" => "apple-darwin",
            "windows" => "pc-windows-msvc",
            other => other,
        };
        format!("{}-{}", self.cpu, suffix)
    }

    /// Replace platform placeholders in an artifact pattern.
    ///
    /// Substituted values are regex-escaped; the rest of the pattern is left as is.
    pub fn expand(&self, pattern: &str) -> String {
        pattern
            .replace("{triple}", &regex::escape(&self.triple()))
            .replace("{Os}", &regex::escape(&self.os_title()))
            .replace("{os}", &regex::escape(self.os()))
            .replace("{arch}", &regex::escape(self.arch()))
            .replace("{cpu}", &regex::escape(self.cpu()))
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os(), self.arch())
    }
}
