pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::InstallerSettings;
pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::loaders::forge::{ForgeExtension, ForgeRepository, ForgeVersion};
pub use crate::core::loaders::{InstallContext, VersionRegistry};
pub use crate::core::version::{install_version, InstalledVersion};

/// Default log filter, overridable through `RUST_LOG`.
const DEFAULT_LOG_FILTER: &str = "info,forge_installer_lib=debug";

/// Initialize structured logging.
///
/// `-v` raises the whole crate to `trace`, `-q` only keeps warnings. Without
/// either flag `RUST_LOG` wins over the default filter.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug,forge_installer_lib=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
