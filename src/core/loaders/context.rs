use std::path::Path;
use std::time::Duration;

use crate::core::downloader::Downloader;
use crate::core::version::VersionManifest;

/// Contexto completo de instalación.
/// Everything a version hook may touch while installing.
pub struct InstallContext<'a> {
    /// Root holding `<id>/<id>.json` version directories.
    pub versions_dir: &'a Path,
    pub libs_dir: &'a Path,
    pub downloader: &'a Downloader,
    pub http_client: &'a reqwest::Client,
    pub manifest: &'a VersionManifest,
    /// Runtime used to execute installer processors.
    pub java_bin: Option<&'a Path>,
    pub processor_timeout: Duration,
}
