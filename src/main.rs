mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use cli::{Cli, Commands};
use forge_installer_lib::core::config::{default_main_dir, InstallerSettings};
use forge_installer_lib::core::downloader::Downloader;
use forge_installer_lib::core::http::build_http_client;
use forge_installer_lib::core::java::find_java;
use forge_installer_lib::core::loaders::forge::{resolve_forge_version, ForgeSource};
use forge_installer_lib::core::version::VersionManifest;
use forge_installer_lib::{
    install_version, ForgeExtension, ForgeRepository, InstallContext, LauncherResult,
    VersionRegistry,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    forge_installer_lib::init_logging(cli.verbose > 0, cli.quiet);

    if let Err(err) = run(cli).await {
        debug!("Install failed with code {}", err.code());
        eprintln!("FAILED {}", err);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> LauncherResult<()> {
    let main_dir = cli.main_dir.unwrap_or_else(default_main_dir);
    let mut settings = InstallerSettings::load(&main_dir);
    if let Some(secs) = cli.http_timeout {
        settings.http_timeout_secs = secs;
    }
    let client = build_http_client(&settings)?;
    let repository = ForgeRepository::new(client.clone());

    match cli.command {
        Commands::Install {
            version,
            forge_prefix,
            jvm,
            processor_timeout,
        } => {
            if let Some(prefix) = forge_prefix {
                settings.forge_prefix = prefix;
            }
            if let Some(secs) = processor_timeout {
                settings.processor_timeout_secs = secs;
            }
            let java_bin: Option<PathBuf> = jvm
                .or_else(|| settings.java_path.clone())
                .or_else(|| find_java().map(|java| java.path));
            debug!("Java runtime: {:?}", java_bin);

            let manifest = VersionManifest::fetch(&client).await?;
            let downloader = Downloader::new(client.clone());
            let versions_dir = main_dir.join("versions");
            let libs_dir = main_dir.join("libraries");
            let ctx = InstallContext {
                versions_dir: &versions_dir,
                libs_dir: &libs_dir,
                downloader: &downloader,
                http_client: &client,
                manifest: &manifest,
                java_bin: java_bin.as_deref(),
                processor_timeout: settings.processor_timeout(),
            };

            let source: Arc<dyn ForgeSource> = Arc::new(repository);
            let registry = VersionRegistry::new()
                .with_extension(ForgeExtension::new(settings.forge_prefix.clone(), source));

            let mut hooks = registry.new_version(&ctx, &version).await?;
            let installed = install_version(&ctx, hooks.as_mut()).await?;
            println!("Installed {}", installed.version.id);
            if let Some(main_class) = installed
                .version
                .meta
                .get("mainClass")
                .and_then(|v| v.as_str())
            {
                println!("Main class: {}", main_class);
            }
        }

        Commands::Resolve { version } => {
            let manifest = VersionManifest::fetch(&client).await?;
            let build = resolve_forge_version(&version, &manifest, &repository).await?;
            println!("{}", build);
        }

        Commands::Versions { game_version } => {
            let prefix = game_version.map(|gv| format!("{}-", gv));
            let mut count = 0;
            for build in repository.fetch_maven_versions().await? {
                if prefix.as_deref().map_or(true, |p| build.starts_with(p)) {
                    println!("{}", build);
                    count += 1;
                }
            }
            debug!("{} forge builds listed", count);
        }
    }

    Ok(())
}
