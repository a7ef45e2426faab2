// ─── Install Profile ───
// Both generations of `install_profile.json`, normalized into one result.
//
// >= 1.12.2-14.23.5.2851: `install_profile.json` carries libraries, processors
//   and data, and its `json` key points at the version metadata entry.
// <= 1.12.2-14.23.5.2847: the metadata lives under `versionInfo` and the
//   universal jar is described by the `install` section.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::core::downloader::DownloadEntry;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::maven::MavenArtifact;
use crate::core::version::VersionDescriptor;

use super::archive::InstallerArchive;

pub const INSTALL_PROFILE_ENTRY: &str = "install_profile.json";

/// Library fields of legacy profiles with no modern equivalent.
const LEGACY_LIBRARY_KEYS: [&str; 3] = ["serverreq", "clientreq", "checksums"];

/// One external tool invocation of the modern installer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessorStep {
    pub jar: String,
    #[serde(default)]
    pub classpath: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub sides: Option<Vec<String>>,
    /// Output path template to expected SHA-1 template.
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl ProcessorStep {
    pub fn runs_on_client(&self) -> bool {
        self.sides
            .as_ref()
            .map_or(true, |sides| sides.iter().any(|s| s == "client"))
    }
}

/// A library needed by the processors.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallLibrary {
    pub name: String,
    pub path: PathBuf,
    /// `None` when the artifact was extracted from the installer.
    pub download: Option<DownloadEntry>,
}

/// Everything the modern installer needs once libraries are downloaded.
#[derive(Debug, Clone, Default)]
pub struct ModernInstall {
    pub minecraft: Option<String>,
    pub libraries: BTreeMap<String, InstallLibrary>,
    pub processors: Vec<ProcessorStep>,
    /// Client side values of the profile's `data` object.
    pub data: HashMap<String, String>,
    /// Libraries declared by the version metadata itself.
    pub version_libraries: Vec<Value>,
}

#[derive(Debug)]
pub struct ParsedProfile {
    pub version: VersionDescriptor,
    /// `None` for legacy profiles, which have nothing to run afterwards.
    pub install: Option<ModernInstall>,
}

/// Where parsing writes the files it extracts.
#[derive(Debug, Clone, Copy)]
pub struct ProfileTarget<'a> {
    /// Id the version is installed under.
    pub version_id: &'a str,
    /// Build id, used in error reports.
    pub forge_version: &'a str,
    pub libs_dir: &'a Path,
    /// Directory receiving archive files referenced by `data` values.
    pub data_dir: &'a Path,
}

#[derive(Debug, Deserialize)]
struct ModernProfile {
    json: String,
    #[serde(default)]
    minecraft: Option<String>,
    #[serde(default)]
    libraries: Vec<ProfileLibrary>,
    #[serde(default)]
    processors: Vec<ProcessorStep>,
    #[serde(default)]
    data: BTreeMap<String, SidedData>,
}

#[derive(Debug, Deserialize)]
struct ProfileLibrary {
    name: String,
    #[serde(default)]
    downloads: Option<ProfileLibraryDownloads>,
}

#[derive(Debug, Deserialize)]
struct ProfileLibraryDownloads {
    #[serde(default)]
    artifact: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SidedData {
    client: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyProfile {
    #[serde(default)]
    version_info: Option<Value>,
    #[serde(default)]
    install: Option<LegacyInstall>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyInstall {
    file_path: String,
    path: String,
}

enum InstallProfile {
    Modern(ModernProfile),
    Legacy(LegacyProfile),
}

impl InstallProfile {
    fn from_json(value: Value) -> LauncherResult<Self> {
        if value.get("json").is_some() {
            Ok(Self::Modern(serde_json::from_value(value)?))
        } else {
            Ok(Self::Legacy(serde_json::from_value(value)?))
        }
    }
}

/// Parse the install profile of `archive`, extracting embedded artifacts.
///
/// The archive is consumed and closed when parsing returns.
pub fn parse_install_profile(
    mut archive: InstallerArchive,
    target: &ProfileTarget<'_>,
) -> LauncherResult<ParsedProfile> {
    let raw = archive
        .read_json(INSTALL_PROFILE_ENTRY)?
        .ok_or_else(|| LauncherError::InstallProfileNotFound {
            version: target.forge_version.to_string(),
        })?;

    match InstallProfile::from_json(raw)? {
        InstallProfile::Modern(profile) => parse_modern(&mut archive, profile, target),
        InstallProfile::Legacy(profile) => parse_legacy(&mut archive, profile, target),
    }
}

fn parse_modern(
    archive: &mut InstallerArchive,
    profile: ModernProfile,
    target: &ProfileTarget<'_>,
) -> LauncherResult<ParsedProfile> {
    info!("Parsing modern install profile for {}", target.forge_version);

    let meta_entry = profile.json.trim_start_matches('/');
    let meta = archive
        .read_json(meta_entry)?
        .ok_or_else(|| LauncherError::ArchiveEntryNotFound(meta_entry.to_string()))?;

    let version_libraries = meta
        .get("libraries")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut libraries = BTreeMap::new();
    for lib in profile.libraries {
        let artifact = MavenArtifact::parse(&lib.name)?;
        let path = target.libs_dir.join(artifact.local_path());
        let download = lib
            .downloads
            .as_ref()
            .and_then(|d| d.artifact.as_ref())
            .and_then(|meta| DownloadEntry::from_meta(meta, path.clone()));

        if download.is_none() {
            archive.extract_entry(&format!("maven/{}", artifact.url_path()), &path)?;
        }

        libraries.insert(
            lib.name.clone(),
            InstallLibrary {
                name: lib.name,
                path,
                download,
            },
        );
    }

    let mut data = HashMap::new();
    for (key, value) in profile.data {
        let client = match value.client.strip_prefix('/') {
            Some(entry) => {
                if !is_contained(entry) {
                    return Err(invalid_profile(
                        target,
                        &format!("data entry {} escapes the version directory", entry),
                    ));
                }
                let dest = target.data_dir.join(entry);
                archive.extract_entry(entry, &dest)?;
                dest.to_string_lossy().to_string()
            }
            None => value.client,
        };
        data.insert(key, client);
    }

    debug!(
        "{} install libraries, {} processors, {} data entries",
        libraries.len(),
        profile.processors.len(),
        data.len()
    );

    Ok(ParsedProfile {
        version: VersionDescriptor::new(target.version_id, meta),
        install: Some(ModernInstall {
            minecraft: profile.minecraft,
            libraries,
            processors: profile.processors,
            data,
            version_libraries,
        }),
    })
}

fn invalid_profile(target: &ProfileTarget<'_>, reason: &str) -> LauncherError {
    LauncherError::InvalidInstallProfile {
        version: target.forge_version.to_string(),
        reason: reason.to_string(),
    }
}

/// Whether `entry` stays below the directory it is joined onto.
fn is_contained(entry: &str) -> bool {
    Path::new(entry)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn parse_legacy(
    archive: &mut InstallerArchive,
    profile: LegacyProfile,
    target: &ProfileTarget<'_>,
) -> LauncherResult<ParsedProfile> {
    info!("Parsing legacy install profile for {}", target.forge_version);

    let mut meta = profile
        .version_info
        .ok_or_else(|| LauncherError::VersionMetaNotFound {
            version: target.forge_version.to_string(),
        })?;

    if let Some(libraries) = meta.get_mut("libraries").and_then(Value::as_array_mut) {
        for lib in libraries.iter_mut().filter_map(Value::as_object_mut) {
            for key in LEGACY_LIBRARY_KEYS {
                lib.remove(key);
            }
        }
    }

    let install = profile
        .install
        .ok_or_else(|| invalid_profile(target, "missing install section"))?;
    let jar = MavenArtifact::parse(&install.path)?;
    archive.extract_entry(&install.file_path, &target.libs_dir.join(jar.local_path()))?;

    Ok(ParsedProfile {
        version: VersionDescriptor::new(target.version_id, meta),
        install: None,
    })
}
