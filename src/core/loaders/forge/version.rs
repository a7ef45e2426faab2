use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::core::downloader::DownloadEntry;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::loaders::{InstallContext, VersionHooks};
use crate::core::version::VersionDescriptor;

use super::processor::ProcessorRunner;
use super::profile::{parse_install_profile, ModernInstall, ProfileTarget};
use super::repository::{fetch_installer_archive, game_version_of, ForgeSource};

/// Written into the version dir once post-processing succeeded. Stored
/// metadata without it belongs to an interrupted install.
pub const INSTALL_MARKER: &str = ".forge-installed";

/// One forge build being installed as `<prefix>-<forge_version>`.
///
/// The install state is only populated when the metadata had to be fetched;
/// a completed version reused from disk never runs its processors again.
pub struct ForgeVersion {
    id: String,
    forge_version: String,
    source: Arc<dyn ForgeSource>,
    install: Option<ModernInstall>,
}

impl ForgeVersion {
    pub fn new(
        prefix: &str,
        forge_version: impl Into<String>,
        source: Arc<dyn ForgeSource>,
    ) -> Self {
        let forge_version = forge_version.into();
        Self {
            id: format!("{}-{}", prefix, forge_version),
            forge_version,
            source,
            install: None,
        }
    }

    pub fn forge_version(&self) -> &str {
        &self.forge_version
    }

    fn marker_path(&self, ctx: &InstallContext<'_>) -> PathBuf {
        ctx.versions_dir.join(&self.id).join(INSTALL_MARKER)
    }

    async fn run_processors(&self, ctx: &InstallContext<'_>) -> LauncherResult<()> {
        let Some(install) = &self.install else {
            return Ok(());
        };
        if install.processors.is_empty() {
            return Ok(());
        }

        let java_bin = ctx.java_bin.ok_or_else(|| LauncherError::RequiresJvm {
            version: self.forge_version.clone(),
        })?;

        let game_version = self.game_version();
        let minecraft_jar = ctx
            .versions_dir
            .join(game_version)
            .join(format!("{}.jar", game_version));
        let root = ctx.versions_dir.parent().unwrap_or(ctx.versions_dir);

        info!(
            "Running {} forge processors for {}",
            install.processors.len(),
            self.forge_version
        );

        ProcessorRunner::new(java_bin, ctx.libs_dir, &install.libraries)
            .with_timeout(ctx.processor_timeout)
            .with_data(&install.data)
            .with_builtins([
                ("SIDE", "client".to_string()),
                ("MINECRAFT_JAR", minecraft_jar.to_string_lossy().to_string()),
                ("MINECRAFT_VERSION", game_version.to_string()),
                ("ROOT", root.to_string_lossy().to_string()),
                ("LIBRARY_DIR", ctx.libs_dir.to_string_lossy().to_string()),
            ])
            .run_all(&install.processors)
            .await
    }

    fn game_version(&self) -> &str {
        self.install
            .as_ref()
            .and_then(|install| install.minecraft.as_deref())
            .unwrap_or_else(|| game_version_of(&self.forge_version))
    }
}

#[async_trait]
impl VersionHooks for ForgeVersion {
    fn id(&self) -> &str {
        &self.id
    }

    #[instrument(skip_all)]
    async fn fetch_version_meta(
        &mut self,
        ctx: &InstallContext<'_>,
    ) -> LauncherResult<VersionDescriptor> {
        info!("Fetching forge {} installer", self.forge_version);
        let marker = self.marker_path(ctx);
        if marker.exists() {
            tokio::fs::remove_file(&marker)
                .await
                .map_err(|e| LauncherError::Io {
                    path: marker.clone(),
                    source: e,
                })?;
        }
        let archive = fetch_installer_archive(self.source.as_ref(), &self.forge_version).await?;

        let data_dir = ctx.versions_dir.join(&self.id).join("data");
        let target = ProfileTarget {
            version_id: &self.id,
            forge_version: &self.forge_version,
            libs_dir: ctx.libs_dir,
            data_dir: &data_dir,
        };
        let parsed = parse_install_profile(archive, &target)?;

        self.install = parsed.install;
        Ok(parsed.version)
    }

    /// The id check is irrelevant since the id was forced when the metadata
    /// was written. Metadata left behind by a failed install is refetched.
    fn validate_version_meta(&self, ctx: &InstallContext<'_>, meta: &Value) -> bool {
        meta.is_object() && self.marker_path(ctx).is_file()
    }

    fn prepare_libraries(
        &mut self,
        ctx: &InstallContext<'_>,
        version: &mut VersionDescriptor,
    ) -> LauncherResult<Vec<DownloadEntry>> {
        let Some(install) = &self.install else {
            return Ok(Vec::new());
        };

        if let Some(libraries) = version.libraries_mut() {
            retain_downloadable_libraries(libraries);
        }

        let entries: Vec<DownloadEntry> = install
            .libraries
            .values()
            .filter_map(|lib| lib.download.clone())
            .collect();
        debug!(
            "{} install libraries to download into {:?}",
            entries.len(),
            ctx.libs_dir
        );
        Ok(entries)
    }

    async fn prepare_post(&mut self, ctx: &InstallContext<'_>) -> LauncherResult<()> {
        self.run_processors(ctx).await?;

        let marker = self.marker_path(ctx);
        tokio::fs::write(&marker, &self.forge_version)
            .await
            .map_err(|e| LauncherError::Io {
                path: marker.clone(),
                source: e,
            })?;
        debug!("Marked {} as installed", self.id);
        Ok(())
    }
}

/// Keep only libraries that declare a `downloads` descriptor; the others are
/// produced locally by extraction or processors.
pub fn retain_downloadable_libraries(libraries: &mut Vec<Value>) {
    libraries.retain(|lib| {
        lib.get("downloads")
            .and_then(Value::as_object)
            .is_some_and(|downloads| !downloads.is_empty())
    });
}
