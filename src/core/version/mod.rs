pub mod install;
pub mod manifest;
pub mod version_file;

pub use install::{install_version, InstalledVersion};
pub use manifest::{VersionAliases, VersionEntry, VersionManifest};
pub use version_file::{LibraryEntry, VersionDescriptor};
