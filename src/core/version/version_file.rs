// ─── Version File ───
// Version metadata documents, library OS rules and parent merging.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::core::downloader::DownloadEntry;
use crate::core::error::LauncherResult;
use crate::core::maven::{MavenArtifact, MOJANG_LIBRARIES};

/// A version metadata document together with the id it is installed under.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionDescriptor {
    pub id: String,
    pub meta: Value,
}

impl VersionDescriptor {
    /// Wrap `meta`, forcing its `id` field to `id`.
    pub fn new(id: impl Into<String>, mut meta: Value) -> Self {
        let id = id.into();
        if let Some(obj) = meta.as_object_mut() {
            obj.insert("id".to_string(), Value::String(id.clone()));
        }
        Self { id, meta }
    }

    pub fn inherits_from(&self) -> Option<&str> {
        self.meta
            .get("inheritsFrom")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn libraries_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.meta.get_mut("libraries").and_then(Value::as_array_mut)
    }
}

// ─── Library Entry with Rules ───

#[derive(Debug, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// Legacy repository base used before `downloads` existed.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub rules: Option<Vec<LibraryRule>>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryRule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
}

impl LibraryEntry {
    /// Evaluate whether this library should be included for the current OS.
    ///
    /// No rules means allowed. Otherwise rules are applied top-to-bottom
    /// starting from "disallowed", the last matching rule wins.
    pub fn is_allowed_for_current_os(&self) -> bool {
        let rules = match &self.rules {
            Some(r) => r,
            None => return true,
        };

        let current_os = current_os_name();
        let mut allowed = false;

        for rule in rules {
            let os_matches = match &rule.os {
                None => true,
                Some(os) => match &os.name {
                    None => true,
                    Some(name) => name == current_os,
                },
            };

            if os_matches {
                allowed = rule.action == RuleAction::Allow;
            }
        }

        allowed
    }

    /// Download entry for the main artifact, if it can be fetched remotely.
    ///
    /// Artifacts with an empty URL are produced locally (extracted from an
    /// installer or generated by processors) and yield `None`.
    pub fn download_entry(&self, libs_dir: &Path) -> LauncherResult<Option<DownloadEntry>> {
        let artifact = MavenArtifact::parse(&self.name)?;

        if let Some(meta) = self.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            let dest = match meta.get("path").and_then(Value::as_str) {
                Some(path) if !path.is_empty() => libs_dir.join(path),
                _ => libs_dir.join(artifact.local_path()),
            };
            return Ok(DownloadEntry::from_meta(meta, dest));
        }

        if self.downloads.is_some() {
            return Ok(None);
        }

        let repo = self
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(MOJANG_LIBRARIES);
        Ok(Some(DownloadEntry {
            url: artifact.url(repo),
            dest: libs_dir.join(artifact.local_path()),
            sha1: None,
            size: None,
        }))
    }
}

/// Get the Mojang OS name for the current platform.
fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

/// Collect download entries for every allowed library of `meta`.
pub fn library_downloads(meta: &Value, libs_dir: &Path) -> LauncherResult<Vec<DownloadEntry>> {
    let Some(libraries) = meta.get("libraries").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    for raw in libraries {
        let lib: LibraryEntry = serde_json::from_value(raw.clone())?;
        if !lib.is_allowed_for_current_os() {
            debug!("Skipping library (OS rule): {}", lib.name);
            continue;
        }
        match lib.download_entry(libs_dir)? {
            Some(entry) => entries.push(entry),
            None => debug!("Library {} has no remote artifact", lib.name),
        }
    }
    Ok(entries)
}

/// Download entry for the client jar declared by `meta`, stored at `jar_path`.
pub fn client_download(meta: &Value, jar_path: PathBuf) -> Option<DownloadEntry> {
    let client = meta.get("downloads")?.get("client")?;
    DownloadEntry::from_meta(client, jar_path)
}

/// Build a merged version document with `parent_json` as base and
/// `current_json` overriding matching keys. Libraries are concatenated with the
/// child's first, argument lists with the parent's first.
pub fn merge_with_parent_json(current_json: &Value, parent_json: &Value) -> Value {
    let mut merged = parent_json.clone();

    let Some(obj) = current_json.as_object() else {
        return merged;
    };

    for (k, v) in obj {
        match k.as_str() {
            "libraries" => {
                let mut libraries = v.as_array().cloned().unwrap_or_default();
                if let Some(parent_libs) = parent_json.get("libraries").and_then(Value::as_array) {
                    libraries.extend(parent_libs.iter().cloned());
                }
                merged[k] = Value::Array(libraries);
            }
            "arguments" => {
                let mut arguments = parent_json
                    .get("arguments")
                    .cloned()
                    .unwrap_or_else(|| serde_json::json!({}));
                for side in ["game", "jvm"] {
                    let Some(extra) = v.get(side).and_then(Value::as_array) else {
                        continue;
                    };
                    let mut list = arguments
                        .get(side)
                        .and_then(Value::as_array)
                        .cloned()
                        .unwrap_or_default();
                    list.extend(extra.iter().cloned());
                    arguments[side] = Value::Array(list);
                }
                merged[k] = arguments;
            }
            "inheritsFrom" => {}
            _ => merged[k] = v.clone(),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lib(value: Value) -> LibraryEntry {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn no_rules_means_allowed() {
        assert!(lib(json!({"name": "test:lib:1.0"})).is_allowed_for_current_os());
    }

    #[test]
    fn disallow_current_os() {
        let entry = lib(json!({
            "name": "test:lib:1.0",
            "rules": [
                {"action": "allow"},
                {"action": "disallow", "os": {"name": current_os_name()}}
            ]
        }));
        assert!(!entry.is_allowed_for_current_os());
    }

    #[test]
    fn empty_url_artifact_is_not_downloadable() {
        let entry = lib(json!({
            "name": "net.minecraftforge:forge:1.20.1-47.2.0:client",
            "downloads": {"artifact": {"path": "net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-client.jar", "url": "", "sha1": "", "size": 0}}
        }));
        assert!(entry.download_entry(Path::new("/libs")).unwrap().is_none());
    }

    #[test]
    fn legacy_library_uses_repository_url() {
        let entry = lib(json!({
            "name": "net.minecraft:launchwrapper:1.12",
            "url": "https://maven.minecraftforge.net/"
        }));
        let dl = entry.download_entry(Path::new("/libs")).unwrap().unwrap();
        assert_eq!(
            dl.url,
            "https://maven.minecraftforge.net/net/minecraft/launchwrapper/1.12/launchwrapper-1.12.jar"
        );

        let entry = lib(json!({"name": "com.google.guava:guava:17.0"}));
        let dl = entry.download_entry(Path::new("/libs")).unwrap().unwrap();
        assert!(dl.url.starts_with(MOJANG_LIBRARIES));
    }

    #[test]
    fn descriptor_overwrites_embedded_id() {
        let d = VersionDescriptor::new("forge-1.20.1-47.2.0", json!({"id": "1.20.1-forge-47.2.0"}));
        assert_eq!(d.meta["id"], "forge-1.20.1-47.2.0");
    }

    #[test]
    fn merge_concatenates_libraries_and_arguments() {
        let parent = json!({
            "id": "1.20.1",
            "mainClass": "net.minecraft.client.main.Main",
            "libraries": [{"name": "a:b:1.0"}],
            "arguments": {"game": ["--parent"], "jvm": ["-Xss1M"]}
        });
        let current = json!({
            "id": "forge-1.20.1-47.2.0",
            "inheritsFrom": "1.20.1",
            "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher",
            "libraries": [{"name": "c:d:2.0"}],
            "arguments": {"game": ["--launchTarget", "forgeclient"]}
        });

        let merged = merge_with_parent_json(&current, &parent);

        assert_eq!(merged["id"], "forge-1.20.1-47.2.0");
        assert_eq!(merged["mainClass"], "cpw.mods.bootstraplauncher.BootstrapLauncher");
        assert_eq!(merged["libraries"][0]["name"], "c:d:2.0");
        assert_eq!(merged["libraries"][1]["name"], "a:b:1.0");
        assert_eq!(merged["arguments"]["game"], json!(["--parent", "--launchTarget", "forgeclient"]));
        assert_eq!(merged["arguments"]["jvm"], json!(["-Xss1M"]));
        assert!(merged.get("inheritsFrom").is_none());
    }
}
