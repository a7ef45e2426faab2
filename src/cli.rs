use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "forge-installer")]
#[command(about = "Install Minecraft Forge versions and their vanilla parents")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Show debug output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Game directory holding `versions/` and `libraries/`
    #[arg(long, global = true, value_name = "DIR")]
    pub main_dir: Option<PathBuf>,

    /// Overall HTTP timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub http_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a version, e.g. `forge:1.20.1`, `forge:release` or `1.20.1`
    #[command(after_help = "Examples:\n  forge-installer install forge:\n  forge-installer install forge:1.20.1-recommended\n  forge-installer install forge:1.12.2-14.23.5.2859 --forge-prefix mcforge")]
    Install {
        /// Version identifier, `forge:<version>` for forge builds
        version: String,
        /// Prefix of the installed forge version ids
        #[arg(long, value_name = "PREFIX")]
        forge_prefix: Option<String>,
        /// Java executable used to run installer processors
        #[arg(long, value_name = "PATH")]
        jvm: Option<PathBuf>,
        /// Per processor timeout in seconds
        #[arg(long, value_name = "SECS")]
        processor_timeout: Option<u64>,
    },

    /// Print the forge build a version request resolves to
    Resolve {
        /// `release`, `snapshot`, `<game>`, `<game>-recommended`, `<game>-latest` or a build id
        #[arg(default_value = "")]
        version: String,
    },

    /// List forge builds published on the forge maven
    Versions {
        /// Only show builds for this game version
        game_version: Option<String>,
    },
}
