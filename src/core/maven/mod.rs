mod artifact;
mod metadata;

pub use artifact::MavenArtifact;
pub use metadata::MavenMetadata;

/// Well-known Maven repositories used by the installer.
pub const MOJANG_LIBRARIES: &str = "https://libraries.minecraft.net";
pub const FORGE_MAVEN: &str = "https://maven.minecraftforge.net";
