use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

/// A parsed Maven coordinate as used in install profiles and version metadata.
///
/// Supported formats:
///   `group:artifact:version`
///   `group:artifact:version:classifier`
///   `group:artifact:version[:classifier]@extension`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MavenArtifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub extension: String,
}

impl MavenArtifact {
    /// Parse a Maven coordinate string.
    ///
    /// # Examples
    /// ```
    /// use forge_installer_lib::core::maven::MavenArtifact;
    /// let a = MavenArtifact::parse("net.minecraftforge:forge:1.20.1-47.2.0:universal").unwrap();
    /// assert_eq!(a.classifier.as_deref(), Some("universal"));
    /// ```
    pub fn parse(coord: &str) -> LauncherResult<Self> {
        let (coord_part, extension) = match coord.rsplit_once('@') {
            Some((head, ext)) if !ext.is_empty() => (head, ext),
            Some(_) => return Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
            None => (coord, "jar"),
        };

        let parts: Vec<&str> = coord_part.split(':').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(LauncherError::InvalidMavenCoordinate(coord.to_string()));
        }

        let classifier = match parts.len() {
            3 => None,
            4 => Some(parts[3].to_string()),
            _ => return Err(LauncherError::InvalidMavenCoordinate(coord.to_string())),
        };

        Ok(Self {
            group_id: parts[0].to_string(),
            artifact_id: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier,
            extension: extension.to_string(),
        })
    }

    /// `artifactId-version[-classifier].extension`
    pub fn filename(&self) -> String {
        match &self.classifier {
            Some(c) => format!(
                "{}-{}-{}.{}",
                self.artifact_id, self.version, c, self.extension
            ),
            None => format!("{}-{}.{}", self.artifact_id, self.version, self.extension),
        }
    }

    /// Path relative to a libraries root, in Maven repository layout.
    pub fn local_path(&self) -> PathBuf {
        let mut path: PathBuf = self.group_id.split('.').collect();
        path.push(&self.artifact_id);
        path.push(&self.version);
        path.push(self.filename());
        path
    }

    /// Same layout as [`local_path`](Self::local_path) but always `/`-separated,
    /// as used for archive entries and URLs.
    pub fn url_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.filename()
        )
    }

    /// Full URL for this artifact under the given repository base.
    pub fn url(&self, repo_base: &str) -> String {
        format!("{}/{}", repo_base.trim_end_matches('/'), self.url_path())
    }
}

impl FromStr for MavenArtifact {
    type Err = LauncherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MavenArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(c) = &self.classifier {
            write!(f, ":{}", c)?;
        }
        if self.extension != "jar" {
            write!(f, "@{}", self.extension)?;
        }
        Ok(())
    }
}
