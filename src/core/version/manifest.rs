// ─── Version Manifest ───
// Handles fetching and parsing the Mojang version manifest v2.

use serde::Deserialize;
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Resolves symbolic game versions (`release`, `snapshot`) to concrete ones.
pub trait VersionAliases: Send + Sync {
    /// Returns the concrete game version and whether `version` was an alias.
    fn filter_latest(&self, version: &str) -> (String, bool);
}

/// Top-level Mojang version manifest.
#[derive(Debug, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    /// Fetch the version manifest from Mojang using a shared HTTP client.
    pub async fn fetch(client: &reqwest::Client) -> LauncherResult<Self> {
        info!("Fetching Minecraft version manifest...");

        let response = client.get(VERSION_MANIFEST_URL).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: VERSION_MANIFEST_URL.to_string(),
                status: status.as_u16(),
            });
        }
        let manifest: VersionManifest = response.json().await?;

        info!("Loaded {} versions from manifest", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }
}

impl VersionAliases for VersionManifest {
    fn filter_latest(&self, version: &str) -> (String, bool) {
        match version {
            "release" => (self.latest.release.clone(), true),
            "snapshot" => (self.latest.snapshot.clone(), true),
            other => (other.to_string(), false),
        }
    }
}
