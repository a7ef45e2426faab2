// ─── Version Install ───
// Load-or-fetch of version metadata, parent resolution and library download,
// driving the hooks of the version being installed.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::{InstallContext, VanillaVersion, VersionHooks};

use super::version_file::{
    client_download, library_downloads, merge_with_parent_json, VersionDescriptor,
};

const MAX_INHERITANCE_DEPTH: usize = 8;

/// A version whose metadata, libraries and post-processing are complete.
#[derive(Debug, Clone)]
pub struct InstalledVersion {
    /// Metadata merged with every parent.
    pub version: VersionDescriptor,
    /// Game jar of the root parent, when it declares one.
    pub jar: Option<PathBuf>,
}

/// Install the version driven by `hooks`, resolving `inheritsFrom` parents as
/// vanilla versions.
pub async fn install_version(
    ctx: &InstallContext<'_>,
    hooks: &mut dyn VersionHooks,
) -> LauncherResult<InstalledVersion> {
    info!("Installing version {}", hooks.id());

    let leaf = load_or_fetch(ctx, hooks).await?;
    let mut merged = leaf.meta.clone();
    let mut root_id = leaf.id.clone();
    let mut parent = leaf.inherits_from().map(str::to_string);
    let mut depth = 0;

    while let Some(parent_id) = parent.take() {
        depth += 1;
        if depth > MAX_INHERITANCE_DEPTH {
            return Err(LauncherError::Other(format!(
                "Version {} inherits too deeply",
                leaf.id
            )));
        }

        let mut vanilla = VanillaVersion::new(&parent_id);
        let parent_version = load_or_fetch(ctx, &mut vanilla).await?;
        parent = parent_version.inherits_from().map(str::to_string);
        merged = merge_with_parent_json(&merged, &parent_version.meta);
        root_id = parent_version.id;
    }

    let mut version = VersionDescriptor::new(leaf.id.clone(), merged);

    let mut entries = hooks.prepare_libraries(ctx, &mut version)?;
    entries.extend(library_downloads(&version.meta, ctx.libs_dir)?);

    let jar_path = ctx
        .versions_dir
        .join(&root_id)
        .join(format!("{}.jar", root_id));
    let jar = client_download(&version.meta, jar_path.clone()).map(|entry| {
        entries.push(entry);
        jar_path
    });

    let failed = ctx.downloader.download_batch(entries).await;
    if !failed.is_empty() {
        for (entry, err) in &failed {
            warn!("Failed to download {}: {}", entry.url, err);
        }
        if let Some((_, err)) = failed.into_iter().next() {
            return Err(err);
        }
    }

    hooks.prepare_post(ctx).await?;

    info!("Version {} installed", version.id);
    Ok(InstalledVersion { version, jar })
}

/// Reuse `<versions>/<id>/<id>.json` when the hooks accept it, otherwise
/// fetch it and write it to disk.
async fn load_or_fetch(
    ctx: &InstallContext<'_>,
    hooks: &mut dyn VersionHooks,
) -> LauncherResult<VersionDescriptor> {
    let id = hooks.id().to_string();
    let version_dir = ctx.versions_dir.join(&id);
    let meta_path = version_dir.join(format!("{}.json", id));

    if meta_path.is_file() {
        let raw = tokio::fs::read_to_string(&meta_path)
            .await
            .map_err(|e| LauncherError::Io {
                path: meta_path.clone(),
                source: e,
            })?;
        match serde_json::from_str::<Value>(&raw) {
            Ok(meta) if hooks.validate_version_meta(ctx, &meta) => {
                debug!("Reusing stored metadata for {}", id);
                return Ok(VersionDescriptor { id, meta });
            }
            Ok(_) => info!("Stored metadata for {} is outdated, fetching again", id),
            Err(e) => warn!("Stored metadata for {} is unreadable: {}", id, e),
        }
    }

    let version = hooks.fetch_version_meta(ctx).await?;

    tokio::fs::create_dir_all(&version_dir)
        .await
        .map_err(|e| LauncherError::Io {
            path: version_dir.clone(),
            source: e,
        })?;
    let raw = serde_json::to_string_pretty(&version.meta)?;
    tokio::fs::write(&meta_path, raw)
        .await
        .map_err(|e| LauncherError::Io {
            path: meta_path.clone(),
            source: e,
        })?;

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::core::downloader::{DownloadEntry, Downloader};
    use crate::core::version::VersionManifest;

    struct CountingHooks {
        id: String,
        fetched: usize,
        post: usize,
    }

    #[async_trait]
    impl VersionHooks for CountingHooks {
        fn id(&self) -> &str {
            &self.id
        }

        async fn fetch_version_meta(
            &mut self,
            _ctx: &InstallContext<'_>,
        ) -> LauncherResult<VersionDescriptor> {
            self.fetched += 1;
            Ok(VersionDescriptor::new(
                self.id.clone(),
                json!({"libraries": [], "mainClass": "Main"}),
            ))
        }

        fn prepare_libraries(
            &mut self,
            _ctx: &InstallContext<'_>,
            _version: &mut VersionDescriptor,
        ) -> LauncherResult<Vec<DownloadEntry>> {
            Ok(Vec::new())
        }

        async fn prepare_post(&mut self, _ctx: &InstallContext<'_>) -> LauncherResult<()> {
            self.post += 1;
            Ok(())
        }
    }

    fn empty_manifest() -> VersionManifest {
        serde_json::from_value(json!({
            "latest": {"release": "1.20.1", "snapshot": "1.20.1"},
            "versions": []
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_once_then_reuses_stored_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let versions = dir.path().join("versions");
        let libs = dir.path().join("libraries");
        let client = reqwest::Client::new();
        let downloader = Downloader::new(client.clone());
        let manifest = empty_manifest();
        let ctx = InstallContext {
            versions_dir: &versions,
            libs_dir: &libs,
            downloader: &downloader,
            http_client: &client,
            manifest: &manifest,
            java_bin: None,
            processor_timeout: Duration::from_secs(5),
        };

        let mut hooks = CountingHooks {
            id: "custom".into(),
            fetched: 0,
            post: 0,
        };
        let installed = install_version(&ctx, &mut hooks).await.unwrap();
        assert_eq!(installed.version.meta["id"], "custom");
        assert!(installed.jar.is_none());
        assert!(versions.join("custom").join("custom.json").is_file());

        install_version(&ctx, &mut hooks).await.unwrap();
        assert_eq!(hooks.fetched, 1);
        assert_eq!(hooks.post, 2);
    }
}
