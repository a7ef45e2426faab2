use tracing::{debug, info, instrument};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::version::VersionAliases;

use super::repository::{ForgeSource, PromotionMap};

/// Promotion keys tried for a game version, in order.
const PROMOTION_SUFFIXES: [&str; 3] = ["", "-recommended", "-latest"];

/// Whether `game_version` must be looked up in the promotions feed rather
/// than taken as a full build id.
fn needs_promotion_lookup(game_version: &str, is_alias: bool) -> bool {
    is_alias
        || game_version.ends_with("-recommended")
        || game_version.ends_with("-latest")
        || !game_version.contains('-')
}

/// First promoted build for `game_version`, as a full build id.
fn lookup_promotion(promotions: &PromotionMap, game_version: &str) -> Option<String> {
    PROMOTION_SUFFIXES.iter().find_map(|suffix| {
        let build = promotions.get(&format!("{}{}", game_version, suffix))?;
        let base = game_version
            .strip_suffix("-recommended")
            .or_else(|| game_version.strip_suffix("-latest"))
            .unwrap_or(game_version);
        Some(format!("{}-{}", base, build))
    })
}

/// Turn a user supplied forge version into a concrete build id.
///
/// `release`/`snapshot` aliases go through `aliases`; an empty request means
/// the latest release. Anything that already looks like a build id is
/// returned verbatim without touching the network.
#[instrument(skip(aliases, source))]
pub async fn resolve_forge_version(
    requested: &str,
    aliases: &dyn VersionAliases,
    source: &dyn ForgeSource,
) -> LauncherResult<String> {
    let requested = if requested.is_empty() { "release" } else { requested };
    let (game_version, is_alias) = aliases.filter_latest(requested);

    if needs_promotion_lookup(&game_version, is_alias) {
        let promotions = source.fetch_promotions().await?;
        if let Some(build) = lookup_promotion(&promotions, &game_version) {
            info!("Resolved forge {} -> {}", requested, build);
            return Ok(build);
        }
        if is_alias {
            // No forge build supports this game version yet.
            return Err(LauncherError::MinecraftVersionNotSupported {
                version: game_version,
            });
        }
    }

    debug!("Using {} as a full forge build id", game_version);
    Ok(game_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    struct Aliases;

    impl VersionAliases for Aliases {
        fn filter_latest(&self, version: &str) -> (String, bool) {
            match version {
                "release" => ("1.20.1".to_string(), true),
                "snapshot" => ("23w31a".to_string(), true),
                other => (other.to_string(), false),
            }
        }
    }

    struct Promotions {
        promos: PromotionMap,
        fetches: AtomicUsize,
    }

    impl Promotions {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                promos: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ForgeSource for Promotions {
        async fn fetch_promotions(&self) -> LauncherResult<PromotionMap> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.promos.clone())
        }

        async fn fetch_installer(&self, _version: &str) -> LauncherResult<Option<Vec<u8>>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn release_alias_uses_promotions() {
        let source = Promotions::new(&[("1.20.1", "47.2.0")]);
        let build = resolve_forge_version("release", &Aliases, &source).await.unwrap();
        assert_eq!(build, "1.20.1-47.2.0");
    }

    #[tokio::test]
    async fn empty_request_means_release() {
        let source = Promotions::new(&[("1.20.1-latest", "47.3.12")]);
        let build = resolve_forge_version("", &Aliases, &source).await.unwrap();
        assert_eq!(build, "1.20.1-47.3.12");
    }

    #[tokio::test]
    async fn recommended_suffix_is_stripped() {
        let source = Promotions::new(&[("1.20.1-recommended", "47.2.0")]);
        let build = resolve_forge_version("1.20.1-recommended", &Aliases, &source)
            .await
            .unwrap();
        assert_eq!(build, "1.20.1-47.2.0");
    }

    #[tokio::test]
    async fn plain_game_version_prefers_recommended_over_latest() {
        let source = Promotions::new(&[
            ("1.19.4-latest", "45.3.0"),
            ("1.19.4-recommended", "45.2.0"),
        ]);
        let build = resolve_forge_version("1.19.4", &Aliases, &source).await.unwrap();
        assert_eq!(build, "1.19.4-45.2.0");
    }

    #[tokio::test]
    async fn full_build_id_skips_promotions() {
        let source = Promotions::new(&[]);
        let build = resolve_forge_version("1.20.1-47.2.0", &Aliases, &source)
            .await
            .unwrap();
        assert_eq!(build, "1.20.1-47.2.0");
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_alias_fails() {
        let source = Promotions::new(&[("1.20.1", "47.2.0")]);
        let err = resolve_forge_version("snapshot", &Aliases, &source)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LauncherError::MinecraftVersionNotSupported { ref version } if version == "23w31a"
        ));
    }

    #[tokio::test]
    async fn unknown_game_version_falls_through() {
        let source = Promotions::new(&[]);
        let build = resolve_forge_version("1.5.2", &Aliases, &source).await.unwrap();
        assert_eq!(build, "1.5.2");
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }
}
