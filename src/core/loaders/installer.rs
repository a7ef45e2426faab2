use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::core::downloader::DownloadEntry;
use crate::core::error::LauncherResult;
use crate::core::version::VersionDescriptor;

use super::context::InstallContext;
use super::vanilla::VanillaVersion;

/// Hook points the install pipeline calls for the version being installed.
///
/// Only `id` and `fetch_version_meta` are mandatory; the other hooks default
/// to the plain vanilla behavior.
#[async_trait]
pub trait VersionHooks: Send {
    /// Id of the version directory this hook set is responsible for.
    fn id(&self) -> &str;

    /// Produce the version metadata when no valid version directory exists.
    async fn fetch_version_meta(
        &mut self,
        ctx: &InstallContext<'_>,
    ) -> LauncherResult<VersionDescriptor>;

    /// Decide whether an already stored metadata document can be reused.
    fn validate_version_meta(&self, _ctx: &InstallContext<'_>, meta: &Value) -> bool {
        meta.get("id").and_then(Value::as_str) == Some(self.id())
    }

    /// Adjust the merged metadata before libraries are downloaded and return
    /// extra files that must be downloaded with them.
    fn prepare_libraries(
        &mut self,
        _ctx: &InstallContext<'_>,
        _version: &mut VersionDescriptor,
    ) -> LauncherResult<Vec<DownloadEntry>> {
        Ok(Vec::new())
    }

    /// Runs once every library is present on disk.
    async fn prepare_post(&mut self, _ctx: &InstallContext<'_>) -> LauncherResult<()> {
        Ok(())
    }
}

/// A source of hook sets for the version ids it recognizes.
#[async_trait]
pub trait VersionExtension: Send + Sync {
    /// `Ok(None)` means the id is not handled by this extension.
    async fn new_version(
        &self,
        ctx: &InstallContext<'_>,
        version_id: &str,
    ) -> LauncherResult<Option<Box<dyn VersionHooks>>>;
}

/// Ordered list of extensions, falling back to vanilla versions.
#[derive(Default)]
pub struct VersionRegistry {
    extensions: Vec<Box<dyn VersionExtension>>,
}

impl VersionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: impl VersionExtension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    pub async fn new_version(
        &self,
        ctx: &InstallContext<'_>,
        version_id: &str,
    ) -> LauncherResult<Box<dyn VersionHooks>> {
        for extension in &self.extensions {
            if let Some(hooks) = extension.new_version(ctx, version_id).await? {
                return Ok(hooks);
            }
        }
        debug!("No extension claimed {}, using vanilla", version_id);
        Ok(Box::new(VanillaVersion::new(version_id)))
    }
}
