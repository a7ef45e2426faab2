// ─── Forge Repository ───
// Promotions feed, installer jars and the published version list.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::{MavenMetadata, FORGE_MAVEN};

use super::archive::InstallerArchive;

pub const PROMOTIONS_URL: &str =
    "https://files.minecraftforge.net/net/minecraftforge/forge/promotions_slim.json";

/// Promotion key (`1.20.1`, `1.20.1-recommended`, `1.20.1-latest`) to build.
pub type PromotionMap = HashMap<String, String>;

/// Historical installer file name suffixes, tried after the plain name.
const LEGACY_INSTALLER_SUFFIXES: &[(&str, &[&str])] = &[
    ("1.11", &["-1.11.x"]),
    ("1.10.2", &["-1.10.0"]),
    ("1.10", &["-1.10.0"]),
    ("1.9.4", &["-1.9.4"]),
    ("1.9", &["-1.9.0", "-1.9"]),
    ("1.8.9", &["-1.8.9"]),
    ("1.8.8", &["-1.8.8"]),
    ("1.8", &["-1.8"]),
    ("1.7.10", &["-1.7.10", "-1710ls", "-new"]),
    ("1.7.2", &["-mc172"]),
];

/// Where forge metadata and installers come from.
#[async_trait]
pub trait ForgeSource: Send + Sync {
    async fn fetch_promotions(&self) -> LauncherResult<PromotionMap>;

    /// Raw installer jar for `version`, `None` when it is not published.
    async fn fetch_installer(&self, version: &str) -> LauncherResult<Option<Vec<u8>>>;
}

#[derive(Debug, Deserialize)]
struct PromotionsDocument {
    promos: PromotionMap,
}

/// The official forge file server and maven.
#[derive(Debug, Clone)]
pub struct ForgeRepository {
    client: reqwest::Client,
    promotions_url: String,
    maven_base: String,
}

impl ForgeRepository {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            promotions_url: PROMOTIONS_URL.to_string(),
            maven_base: FORGE_MAVEN.to_string(),
        }
    }

    pub fn with_maven_base(mut self, base: impl Into<String>) -> Self {
        self.maven_base = base.into();
        self
    }

    pub fn installer_url(&self, version: &str) -> String {
        format!(
            "{}/net/minecraftforge/forge/{v}/forge-{v}-installer.jar",
            self.maven_base.trim_end_matches('/'),
            v = version
        )
    }

    /// Every build id published on the forge maven.
    pub async fn fetch_maven_versions(&self) -> LauncherResult<Vec<String>> {
        let url = format!(
            "{}/net/minecraftforge/forge/maven-metadata.xml",
            self.maven_base.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/xml")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url,
                status: status.as_u16(),
            });
        }
        let xml = response.text().await?;
        Ok(MavenMetadata::parse(&xml)?.versions().to_vec())
    }
}

#[async_trait]
impl ForgeSource for ForgeRepository {
    async fn fetch_promotions(&self) -> LauncherResult<PromotionMap> {
        let url = &self.promotions_url;
        let network = |reason: String| LauncherError::Network {
            url: url.clone(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(network(format!("HTTP {}", status.as_u16())));
        }
        let document: PromotionsDocument =
            response.json().await.map_err(|e| network(e.to_string()))?;

        debug!("Loaded {} forge promotions", document.promos.len());
        Ok(document.promos)
    }

    async fn fetch_installer(&self, version: &str) -> LauncherResult<Option<Vec<u8>>> {
        let url = self.installer_url(version);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/java-archive")
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("No installer at {} (HTTP {})", url, response.status().as_u16());
            return Ok(None);
        }
        Ok(Some(response.bytes().await?.to_vec()))
    }
}

/// Installer file name suffixes to try for `forge_version`, plain name first.
pub fn installer_suffixes(forge_version: &str) -> Vec<&'static str> {
    let game_version = game_version_of(forge_version);
    let mut suffixes = vec![""];
    if let Some((_, legacy)) = LEGACY_INSTALLER_SUFFIXES
        .iter()
        .find(|(gv, _)| *gv == game_version)
    {
        suffixes.extend_from_slice(legacy);
    }
    suffixes
}

/// Game version part of a build id (text before the first `-`).
pub fn game_version_of(forge_version: &str) -> &str {
    forge_version
        .split_once('-')
        .map_or(forge_version, |(gv, _)| gv)
}

/// Download and open the first installer published for `forge_version`.
pub async fn fetch_installer_archive(
    source: &dyn ForgeSource,
    forge_version: &str,
) -> LauncherResult<InstallerArchive> {
    for suffix in installer_suffixes(forge_version) {
        let candidate = format!("{}{}", forge_version, suffix);
        if let Some(bytes) = source.fetch_installer(&candidate).await? {
            info!("Found forge installer {}", candidate);
            return InstallerArchive::from_bytes(bytes);
        }
    }

    Err(LauncherError::InstallerNotFound {
        version: forge_version.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    use zip::write::SimpleFileOptions;

    struct ScriptedSource {
        published: &'static str,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ForgeSource for ScriptedSource {
        async fn fetch_promotions(&self) -> LauncherResult<PromotionMap> {
            Ok(PromotionMap::new())
        }

        async fn fetch_installer(&self, version: &str) -> LauncherResult<Option<Vec<u8>>> {
            self.requested.lock().unwrap().push(version.to_string());
            if version != self.published {
                return Ok(None);
            }
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
            zip.start_file("install_profile.json", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"{}").unwrap();
            Ok(Some(zip.finish().unwrap().into_inner()))
        }
    }

    #[test]
    fn suffix_table_lookup() {
        assert_eq!(installer_suffixes("1.20.1-47.2.0"), vec![""]);
        assert_eq!(
            installer_suffixes("1.7.10-10.13.4.1614"),
            vec!["", "-1.7.10", "-1710ls", "-new"]
        );
        assert_eq!(installer_suffixes("1.9-12.16.1.1887"), vec!["", "-1.9.0", "-1.9"]);
    }

    #[test]
    fn game_version_is_text_before_first_dash() {
        assert_eq!(game_version_of("1.12.2-14.23.5.2859"), "1.12.2");
        assert_eq!(game_version_of("1.20.1"), "1.20.1");
    }

    #[test]
    fn installer_url_layout() {
        let repo = ForgeRepository::new(reqwest::Client::new());
        assert_eq!(
            repo.installer_url("1.20.1-47.2.0"),
            "https://maven.minecraftforge.net/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-installer.jar"
        );
    }

    #[tokio::test]
    async fn tries_legacy_suffixes_in_order() {
        let source = ScriptedSource {
            published: "1.7.10-10.13.4.1614-1710ls",
            requested: Mutex::new(Vec::new()),
        };

        let mut archive = fetch_installer_archive(&source, "1.7.10-10.13.4.1614")
            .await
            .unwrap();
        assert!(archive.contains("install_profile.json"));
        assert_eq!(
            *source.requested.lock().unwrap(),
            vec![
                "1.7.10-10.13.4.1614",
                "1.7.10-10.13.4.1614-1.7.10",
                "1.7.10-10.13.4.1614-1710ls",
            ]
        );
        assert!(archive.read_json("missing.json").unwrap().is_none());
    }

    #[tokio::test]
    async fn no_installer_is_fatal() {
        let source = ScriptedSource {
            published: "nothing",
            requested: Mutex::new(Vec::new()),
        };
        let err = fetch_installer_archive(&source, "1.20.1-0.0.0")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LauncherError::InstallerNotFound { ref version } if version == "1.20.1-0.0.0"
        ));
    }
}
