pub mod context;
pub mod forge;
pub mod installer;
pub mod vanilla;

pub use context::InstallContext;
pub use installer::{VersionExtension, VersionHooks, VersionRegistry};
pub use vanilla::VanillaVersion;
