use std::fmt;
use std::io::Cursor;
use std::path::Path;

use serde_json::Value;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::core::error::{LauncherError, LauncherResult};

/// An installer jar opened in memory.
pub struct InstallerArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
}

impl fmt::Debug for InstallerArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallerArchive")
            .field("entries", &self.zip.len())
            .finish()
    }
}

impl InstallerArchive {
    pub fn from_bytes(bytes: Vec<u8>) -> LauncherResult<Self> {
        Ok(Self {
            zip: ZipArchive::new(Cursor::new(bytes))?,
        })
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.zip.file_names().any(|name| name == entry)
    }

    /// Parse a JSON entry, `None` when the entry does not exist.
    pub fn read_json(&mut self, entry: &str) -> LauncherResult<Option<Value>> {
        match self.zip.by_name(entry) {
            Ok(file) => Ok(Some(serde_json::from_reader(file)?)),
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Copy one entry to `dest`, whatever its directory inside the archive.
    pub fn extract_entry(&mut self, entry: &str, dest: &Path) -> LauncherResult<()> {
        let mut file = match self.zip.by_name(entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => {
                return Err(LauncherError::ArchiveEntryNotFound(entry.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out = std::fs::File::create(dest).map_err(|source| LauncherError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
        std::io::copy(&mut file, &mut out).map_err(|source| LauncherError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        debug!("Extracted {} -> {:?}", entry, dest);
        Ok(())
    }
}
