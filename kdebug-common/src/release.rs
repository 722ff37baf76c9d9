// kdebug-common/src/release.rs
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::{KdebugError, Result};

/// Base URL the helper binaries are published under.
pub const RELEASE_HOST: &str = "https://github.com/kdebug-io/kdebug/releases/download";

const HELPER_EXE: &str = "kdebugctl";
const MANIFEST: &str = include_str!("release.json");

/// One released helper version: a binary artifact per supported platform,
/// each with the checksum recorded at release time. Loaded once at startup
/// from the embedded manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct HelperRelease {
    pub version: String,
    #[serde(rename = "baseName")]
    pub base_name: String,
    pub binaries: BinaryChecksums,
}

/// Checksum strings may be either `"<hash>"` or `"<hash> <filename>"`,
/// depending on how the release manifest was generated.
#[derive(Debug, Clone, Deserialize)]
pub struct BinaryChecksums {
    pub linux: String,
    pub darwin: String,
    pub win32: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Darwin,
    Windows,
}

impl Platform {
    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Result<Self> {
        match os {
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" => Ok(Platform::Darwin),
            "windows" | "win32" => Ok(Platform::Windows),
            other => Err(KdebugError::UnsupportedPlatform(other.to_string())),
        }
    }

    /// Suffix of the published artifact name for this platform.
    pub fn release_suffix(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::Windows => "windows.exe",
        }
    }

    /// Name of the helper executable on local disk.
    pub fn exe_name(self) -> &'static str {
        match self {
            Platform::Windows => "kdebugctl.exe",
            _ => HELPER_EXE,
        }
    }
}

/// A single acquirable binary: where to get it, what it must hash to, and
/// where it lives locally. Built per invocation, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryArtifact {
    pub url: String,
    pub expected_checksum: String,
    pub local_path: PathBuf,
}

impl BinaryArtifact {
    pub fn name(&self) -> String {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

impl HelperRelease {
    /// The release shipped with this build.
    pub fn builtin() -> Result<Self> {
        let release: HelperRelease = serde_json::from_str(MANIFEST)?;
        Ok(release)
    }

    pub fn checksum_for(&self, platform: Platform) -> &str {
        match platform {
            Platform::Linux => &self.binaries.linux,
            Platform::Darwin => &self.binaries.darwin,
            Platform::Windows => &self.binaries.win32,
        }
    }

    pub fn download_url(&self, platform: Platform) -> String {
        format!(
            "{RELEASE_HOST}/v{}/{}-{}",
            self.version,
            self.base_name,
            platform.release_suffix()
        )
    }

    pub fn artifact(&self, platform: Platform, install_root: &Path) -> BinaryArtifact {
        BinaryArtifact {
            url: self.download_url(platform),
            expected_checksum: self.checksum_for(platform).to_string(),
            local_path: install_root.join(&self.version).join(platform.exe_name()),
        }
    }
}
