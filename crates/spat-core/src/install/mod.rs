//! Downloading artifacts and placing them as executables
//!
//! An install never exposes a partial file at the target path: bytes are
//! streamed into a uniquely named file in the scratch directory and only a
//! complete download is renamed over the target. The scratch directory must be
//! on the same filesystem as the target for the rename to be atomic.
//!
//! The executable bit is set after the rename, so for a moment the new file
//! is visible without it. Nothing is expected to run a tool mid-install.

pub mod manifest;

pub use manifest::{InstallManifest, InstalledTool};

use crate::assets::archive_format;
use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Mode for installed executables
pub const BINARY_MODE: u32 = 0o755;

/// Bytes buffered before checking for archive magic numbers
const SNIFF_LEN: usize = 8;

/// Archive signatures, checked against the start of a download
const ARCHIVE_MAGIC: &[(&[u8], &str)] = &[
    (b"PK\x03\x04", "zip"),
    (b"\x1f\x8b", "gzip"),
    (b"\xfd7zXZ\x00", "xz"),
    (b"\x28\xb5\x2f\xfd", "zstd"),
    (b"BZh", "bzip2"),
    (b"7z\xbc\xaf\x27\x1c", "7z"),
];

/// An executable placed by [`Installer::install`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    pub path: PathBuf,
    pub size: u64,
}

/// Downloads artifacts through a scratch directory into their final place
pub struct Installer {
    client: reqwest::Client,
    scratch_dir: PathBuf,
}

impl Installer {
    pub fn new(client: reqwest::Client, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Download `source_url` and install it as an executable at `target`.
    ///
    /// An existing file at `target` is only replaced once the new download is
    /// complete. Archives are rejected, both by URL extension (before any
    /// request is made) and by content.
    pub async fn install(&self, source_url: &str, target: &Path) -> Result<InstalledBinary> {
        if let Some(format) = archive_format(source_url) {
            return Err(Error::UnsupportedArtifact {
                url: source_url.to_string(),
                format,
            });
        }

        tracing::debug!(url = source_url, "downloading artifact");

        let mut response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| Error::network(source_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::network(source_url, format!("HTTP {}", status)));
        }
        let expected_len = response.content_length();

        let mut scratch = tempfile::Builder::new()
            .prefix(".download-")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| Error::fs("create scratch file in", &self.scratch_dir, e))?;

        let mut head: Vec<u8> = Vec::with_capacity(SNIFF_LEN);
        let mut sniffed = false;
        let mut written: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::network(source_url, e))?
        {
            if sniffed {
                written += write_chunk(&mut scratch, &chunk)?;
                continue;
            }

            head.extend_from_slice(&chunk);
            if head.len() >= SNIFF_LEN {
                reject_archive(source_url, &head)?;
                written += write_chunk(&mut scratch, &head)?;
                sniffed = true;
            }
        }

        if !sniffed {
            reject_archive(source_url, &head)?;
            written += write_chunk(&mut scratch, &head)?;
        }

        if let Some(expected) = expected_len {
            if written != expected {
                return Err(Error::network(
                    source_url,
                    format!("download truncated: got {} of {} bytes", written, expected),
                ));
            }
        }

        scratch
            .as_file()
            .sync_all()
            .map_err(|e| Error::fs("flush", scratch.path(), e))?;

        scratch
            .persist(target)
            .map_err(|e| Error::fs("move download into place at", target, e.error))?;

        set_executable(target)?;

        tracing::info!(target = %target.display(), bytes = written, "installed binary");

        Ok(InstalledBinary {
            path: target.to_path_buf(),
            size: written,
        })
    }
}

fn write_chunk(file: &mut NamedTempFile, data: &[u8]) -> Result<u64> {
    file.write_all(data)
        .map_err(|e| Error::fs("write download to", file.path(), e))?;
    Ok(data.len() as u64)
}

fn reject_archive(url: &str, head: &[u8]) -> Result<()> {
    match ARCHIVE_MAGIC
        .iter()
        .find(|(magic, _)| head.starts_with(magic))
    {
        Some((_, format)) => Err(Error::UnsupportedArtifact {
            url: url.to_string(),
            format: *format,
        }),
        None => Ok(()),
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(BINARY_MODE))
        .map_err(|e| Error::fs("set permissions on", path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
