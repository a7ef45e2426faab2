use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::error::LauncherResult;
use crate::core::loaders::{InstallContext, VersionExtension, VersionHooks};

use super::repository::ForgeSource;
use super::resolver::resolve_forge_version;
use super::version::ForgeVersion;

/// Identifier prefix claimed by [`ForgeExtension`], e.g. `forge:1.20.1`.
pub const FORGE_ID_PREFIX: &str = "forge:";

/// Turns `forge:<version>` identifiers into [`ForgeVersion`] hooks.
pub struct ForgeExtension {
    /// Prefix of the installed version ids (`<prefix>-<build>`).
    prefix: String,
    source: Arc<dyn ForgeSource>,
}

impl ForgeExtension {
    pub fn new(prefix: impl Into<String>, source: Arc<dyn ForgeSource>) -> Self {
        Self {
            prefix: prefix.into(),
            source,
        }
    }
}

#[async_trait]
impl VersionExtension for ForgeExtension {
    async fn new_version(
        &self,
        ctx: &InstallContext<'_>,
        version_id: &str,
    ) -> LauncherResult<Option<Box<dyn VersionHooks>>> {
        let Some(requested) = version_id.strip_prefix(FORGE_ID_PREFIX) else {
            return Ok(None);
        };

        let build = resolve_forge_version(requested, ctx.manifest, self.source.as_ref()).await?;
        info!("Resolved forge {}, downloading installer and parent version", build);

        Ok(Some(Box::new(ForgeVersion::new(
            &self.prefix,
            build,
            Arc::clone(&self.source),
        ))))
    }
}
