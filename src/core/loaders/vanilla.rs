use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::VersionDescriptor;

use super::context::InstallContext;
use super::installer::VersionHooks;

/// Official Mojang version, fetched through the version manifest.
pub struct VanillaVersion {
    id: String,
}

impl VanillaVersion {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl VersionHooks for VanillaVersion {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_version_meta(
        &mut self,
        ctx: &InstallContext<'_>,
    ) -> LauncherResult<VersionDescriptor> {
        let entry = ctx.manifest.find_version(&self.id).ok_or_else(|| {
            LauncherError::Other(format!(
                "Minecraft version {} not found in manifest",
                self.id
            ))
        })?;

        info!("Fetching Minecraft {} metadata", self.id);
        let response = ctx.http_client.get(&entry.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: entry.url.clone(),
                status: status.as_u16(),
            });
        }
        let meta: Value = response.json().await?;

        Ok(VersionDescriptor::new(self.id.clone(), meta))
    }
}
