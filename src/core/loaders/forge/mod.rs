//! Forge support: build resolution, installer download, install profile
//! parsing and the processor pipeline of modern installers.

mod archive;
mod extension;
mod processor;
mod profile;
pub mod repository;
mod resolver;
mod version;

pub use archive::InstallerArchive;
pub use extension::{ForgeExtension, FORGE_ID_PREFIX};
pub use processor::{read_main_class_from_jar, ProcessorCommand, ProcessorRunner};
pub use profile::{
    parse_install_profile, InstallLibrary, ModernInstall, ParsedProfile, ProcessorStep,
    ProfileTarget, INSTALL_PROFILE_ENTRY,
};
pub use repository::{fetch_installer_archive, ForgeRepository, ForgeSource, PromotionMap};
pub use resolver::resolve_forge_version;
pub use version::{retain_downloadable_libraries, ForgeVersion};
