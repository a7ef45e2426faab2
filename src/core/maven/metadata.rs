use quick_xml::de::from_str;
use serde::Deserialize;

use crate::core::error::LauncherResult;

/// Minimal `maven-metadata.xml` model: only the published version list.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MavenMetadata {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub versioning: Option<MavenVersioning>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MavenVersioning {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub versions: Option<MavenVersions>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MavenVersions {
    #[serde(default, rename = "version")]
    pub items: Vec<String>,
}

impl MavenMetadata {
    pub fn parse(xml: &str) -> LauncherResult<Self> {
        Ok(from_str(xml)?)
    }

    /// Published versions in repository order.
    pub fn versions(&self) -> &[String] {
        self.versioning
            .as_ref()
            .and_then(|v| v.versions.as_ref())
            .map(|v| v.items.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_forge_metadata() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
        <metadata>
            <groupId>net.minecraftforge</groupId>
            <artifactId>forge</artifactId>
            <versioning>
                <latest>1.20.1-47.2.20</latest>
                <release>1.20.1-47.2.20</release>
                <versions>
                    <version>1.20.1-47.2.20</version>
                    <version>1.20.1-47.2.0</version>
                    <version>1.7.10-10.13.4.1614-1.7.10</version>
                </versions>
            </versioning>
        </metadata>"#;

        let meta = MavenMetadata::parse(xml).unwrap();
        assert_eq!(meta.artifact_id.as_deref(), Some("forge"));
        assert_eq!(meta.versions().len(), 3);
        assert_eq!(meta.versions()[2], "1.7.10-10.13.4.1614-1.7.10");
    }

    #[test]
    fn missing_versioning_is_empty() {
        let meta = MavenMetadata::parse("<metadata><groupId>g</groupId></metadata>").unwrap();
        assert!(meta.versions().is_empty());
    }
}
