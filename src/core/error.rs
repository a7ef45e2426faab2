use std::path::PathBuf;
use thiserror::Error;

/// Process status used when a requested version cannot be installed.
pub const EXIT_VERSION_NOT_FOUND: i32 = 10;
/// Process status used when a download could not be completed.
pub const EXIT_DOWNLOAD_ERROR: i32 = 13;
/// Generic failure status.
pub const EXIT_FAILURE: i32 = 1;

/// Central error type for the installer.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-1 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha1Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Maven ───────────────────────────────────────────
    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Serialization ───────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Entry {0} not found in installer archive")]
    ArchiveEntryNotFound(String),

    // ── Forge ───────────────────────────────────────────
    #[error("No installer found for forge {version}.")]
    InstallerNotFound { version: String },

    #[error("Installer for forge {version} has no install profile.")]
    InstallProfileNotFound { version: String },

    #[error("Install profile of forge {version} is invalid: {reason}.")]
    InvalidInstallProfile { version: String, reason: String },

    #[error("Install profile of forge {version} has no version metadata.")]
    VersionMetaNotFound { version: String },

    #[error("Minecraft version {version} is not currently supported by forge.")]
    MinecraftVersionNotSupported { version: String },

    #[error("Forge {version} requires a Java runtime to run its installer processors.")]
    RequiresJvm { version: String },

    #[error("Install library {0} is not declared by the install profile")]
    UnknownInstallLibrary(String),

    // ── Java ────────────────────────────────────────────
    #[error("Java execution failed: {0}")]
    JavaExecution(String),

    #[error("Processor {jar} failed (code {code:?})\nSTDOUT:\n{stdout}\nSTDERR:\n{stderr}")]
    ProcessorFailed {
        jar: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Processor {jar} did not finish within {secs}s")]
    ProcessorTimeout { jar: String, secs: u64 },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Stable code used to look up a user-facing message.
    pub fn code(&self) -> &'static str {
        match self {
            LauncherError::Io { .. } => "io",
            LauncherError::Http(_) | LauncherError::Network { .. } => "network",
            LauncherError::DownloadFailed { .. } => "download_failed",
            LauncherError::Sha1Mismatch { .. } => "sha1_mismatch",
            LauncherError::InvalidMavenCoordinate(_) => "invalid_maven_coordinate",
            LauncherError::Json(_) => "json",
            LauncherError::Xml(_) => "xml",
            LauncherError::Zip(_) | LauncherError::ArchiveEntryNotFound(_) => "archive",
            LauncherError::InstallerNotFound { .. } => "installer_not_found",
            LauncherError::InstallProfileNotFound { .. } => "install_profile_not_found",
            LauncherError::InvalidInstallProfile { .. } => "invalid_install_profile",
            LauncherError::VersionMetaNotFound { .. } => "version_meta_not_found",
            LauncherError::MinecraftVersionNotSupported { .. } => {
                "minecraft_version_not_supported"
            }
            LauncherError::RequiresJvm { .. } => "requires_jvm",
            LauncherError::UnknownInstallLibrary(_) => "unknown_install_library",
            LauncherError::JavaExecution(_) => "java_execution",
            LauncherError::ProcessorFailed { .. } => "processor_failed",
            LauncherError::ProcessorTimeout { .. } => "processor_timeout",
            LauncherError::Other(_) => "other",
        }
    }

    /// The forge version an installation error refers to, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            LauncherError::InstallerNotFound { version }
            | LauncherError::InstallProfileNotFound { version }
            | LauncherError::InvalidInstallProfile { version, .. }
            | LauncherError::VersionMetaNotFound { version }
            | LauncherError::MinecraftVersionNotSupported { version }
            | LauncherError::RequiresJvm { version } => Some(version),
            _ => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.version().is_some() {
            return EXIT_VERSION_NOT_FOUND;
        }
        match self {
            LauncherError::Http(_)
            | LauncherError::Network { .. }
            | LauncherError::DownloadFailed { .. }
            | LauncherError::Sha1Mismatch { .. } => EXIT_DOWNLOAD_ERROR,
            _ => EXIT_FAILURE,
        }
    }
}
