//! The specifier mapper chain.
//!
//! An ordered list of strategies, each of which either recognizes a
//! specifier shape and produces a [`MappedSpecifier`] or declines. The chain
//! returns the first non-declining result; declining is expected and never an
//! error. Only the deno.land/x strategy suspends (it consults the package
//! locator); the other strategies are pure string matching.

use crate::apis::{ApiError, JsrPackage};
use regex_lite::Regex;

/// A specifier recognized by one of the mapping strategies.
///
/// `base` is the fully qualified coordinate recorded in the import map,
/// `bare_specifier` the short name exposed to source files, and `subpath`
/// the remainder of the path inside the package (empty when the specifier
/// addressed the package root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSpecifier {
    pub base: String,
    pub bare_specifier: String,
    pub subpath: String,
}

/// Result of running a specifier through the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOutcome {
    /// A strategy recognized the specifier.
    Mapped(MappedSpecifier),
    /// No strategy matched, but the specifier is network-addressable; the
    /// caller should record it for follow-up reporting.
    UnmappedRemote,
    /// No strategy matched and the specifier is local (e.g. a relative
    /// path); leave it alone.
    Unmapped,
}

/// Lookup capability for migrated deno.land/x packages.
///
/// Implemented by [`CachedPackageLocator`](super::CachedPackageLocator);
/// tests substitute a stub.
pub trait PackageFinder {
    /// Find the JSR package a legacy name migrated to, if any.
    async fn find_jsr_package(&self, name: &str) -> Result<Option<JsrPackage>, ApiError>;
}

const ESM_SH_RE: &str =
    r"^https://esm\.sh/(?:v\d+/)?(@?[^@?]+)@([0-9.^~A-Za-z-]+)(?:/([^#?]+))?$";
const DENO_STD_RE: &str = r"^https://deno\.land/std@([^/]+)/([^/]+)/(.+)$";
const DENO_LAND_RE: &str = r"^https://deno\.land/x/([^@]+)@([^/]+)/(.+)$";

/// Maps esm.sh CDN imports to npm coordinates.
struct EsmShMapper {
    re: Regex,
}

impl EsmShMapper {
    fn new() -> Self {
        Self {
            re: Regex::new(ESM_SH_RE).unwrap(),
        }
    }

    fn map(&self, specifier: &str) -> Option<MappedSpecifier> {
        // repository-proxied imports are unsupported
        if specifier.contains("/gh/") {
            return None;
        }

        let caps = self.re.captures(specifier)?;
        let name = caps.get(1)?.as_str();
        let version = caps.get(2)?.as_str();
        let subpath = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

        if subpath.to_lowercase().ends_with(".d.ts") {
            // type-declaration imports are out of scope
            return None;
        }

        Some(MappedSpecifier {
            base: format!("npm:{name}@{version}"),
            bare_specifier: name.to_string(),
            subpath: subpath.to_string(),
        })
    }
}

/// Maps deno.land/std imports to their `@std` JSR packages.
struct DenoStdMapper {
    re: Regex,
}

impl DenoStdMapper {
    fn new() -> Self {
        Self {
            re: Regex::new(DENO_STD_RE).unwrap(),
        }
    }

    fn map(&self, specifier: &str) -> Option<MappedSpecifier> {
        let caps = self.re.captures(specifier)?;
        let version = caps.get(1)?.as_str();
        let name = caps.get(2)?.as_str();
        let subpath = caps.get(3)?.as_str();

        Some(MappedSpecifier {
            bare_specifier: format!("@std/{name}"),
            base: format!("jsr:@std/{name}@{version}"),
            subpath: normalize_subpath(subpath),
        })
    }
}

/// Maps deno.land/x imports, consulting the package locator for the
/// migrated JSR identity.
struct DenoLandMapper<F> {
    re: Regex,
    finder: F,
}

impl<F: PackageFinder> DenoLandMapper<F> {
    fn new(finder: F) -> Self {
        Self {
            re: Regex::new(DENO_LAND_RE).unwrap(),
            finder,
        }
    }

    async fn map(&self, specifier: &str) -> Result<Option<MappedSpecifier>, ApiError> {
        let Some(caps) = self.re.captures(specifier) else {
            return Ok(None);
        };
        let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let version = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let subpath = caps.get(3).map(|m| m.as_str()).unwrap_or_default();

        match self.finder.find_jsr_package(name).await? {
            Some(pkg) => Ok(Some(MappedSpecifier {
                bare_specifier: format!("@{}/{}", pkg.scope, pkg.name),
                base: format!("jsr:@{}/{}@{version}", pkg.scope, pkg.name),
                subpath: normalize_subpath(subpath),
            })),
            // No known migration. Still route through the import map so the
            // rewritten specifier stays stable and centrally tracked; the
            // base keeps the original coordinate.
            None => Ok(Some(MappedSpecifier {
                bare_specifier: format!("{name}/"),
                base: format!("https://deno.land/x/{name}@{version}/"),
                subpath: subpath.to_string(),
            })),
        }
    }
}

/// Strip a trailing `.ts` extension and collapse a bare `mod` entry to the
/// package root.
fn normalize_subpath(subpath: &str) -> String {
    let trimmed = subpath.strip_suffix(".ts").unwrap_or(subpath);
    if trimmed == "mod" {
        String::new()
    } else {
        trimmed.to_string()
    }
}

enum Strategy<F> {
    EsmSh(EsmShMapper),
    DenoStd(DenoStdMapper),
    DenoLand(DenoLandMapper<F>),
}

impl<F: PackageFinder> Strategy<F> {
    async fn map(&self, specifier: &str) -> Result<Option<MappedSpecifier>, ApiError> {
        match self {
            Self::EsmSh(m) => Ok(m.map(specifier)),
            Self::DenoStd(m) => Ok(m.map(specifier)),
            Self::DenoLand(m) => m.map(specifier).await,
        }
    }
}

/// The ordered strategy chain. First match wins; there is no backtracking
/// across strategies.
pub struct SpecifierMapper<F> {
    strategies: Vec<Strategy<F>>,
}

impl<F: PackageFinder> SpecifierMapper<F> {
    /// Build the chain in priority order.
    #[must_use]
    pub fn new(finder: F) -> Self {
        Self {
            strategies: vec![
                Strategy::EsmSh(EsmShMapper::new()),
                Strategy::DenoStd(DenoStdMapper::new()),
                Strategy::DenoLand(DenoLandMapper::new(finder)),
            ],
        }
    }

    /// Classify a specifier.
    ///
    /// A lookup failure inside the deno.land/x strategy propagates; it is
    /// not treated as "unmapped".
    pub async fn map(&self, specifier: &str) -> Result<MapOutcome, ApiError> {
        for strategy in &self.strategies {
            if let Some(mapped) = strategy.map(specifier).await? {
                return Ok(MapOutcome::Mapped(mapped));
            }
        }
        if is_remote(specifier) {
            Ok(MapOutcome::UnmappedRemote)
        } else {
            Ok(MapOutcome::Unmapped)
        }
    }
}

/// Whether a specifier is network-addressable.
fn is_remote(specifier: &str) -> bool {
    specifier.starts_with("https:") || specifier.starts_with("http:")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubFinder;

    impl PackageFinder for StubFinder {
        async fn find_jsr_package(&self, name: &str) -> Result<Option<JsrPackage>, ApiError> {
            if name == "ts_morph" {
                Ok(Some(JsrPackage {
                    scope: "david".to_string(),
                    name: "ts-morph".to_string(),
                }))
            } else {
                Ok(None)
            }
        }
    }

    fn mapper() -> SpecifierMapper<StubFinder> {
        SpecifierMapper::new(StubFinder)
    }

    async fn map_ok(specifier: &str) -> MapOutcome {
        mapper().map(specifier).await.unwrap()
    }

    fn mapped(bare: &str, base: &str, subpath: &str) -> MapOutcome {
        MapOutcome::Mapped(MappedSpecifier {
            bare_specifier: bare.to_string(),
            base: base.to_string(),
            subpath: subpath.to_string(),
        })
    }

    #[tokio::test]
    async fn test_std_with_subpath() {
        assert_eq!(
            map_ok("https://deno.land/std@0.193.0/testing/bdd.ts").await,
            mapped("@std/testing", "jsr:@std/testing@0.193.0", "bdd")
        );
    }

    #[tokio::test]
    async fn test_std_mod_collapses_to_root() {
        assert_eq!(
            map_ok("https://deno.land/std@0.193.0/path/mod.ts").await,
            mapped("@std/path", "jsr:@std/path@0.193.0", "")
        );
    }

    #[tokio::test]
    async fn test_slash_x_migrated() {
        assert_eq!(
            map_ok("https://deno.land/x/ts_morph@21.0.0/mod.ts").await,
            mapped("@david/ts-morph", "jsr:@david/ts-morph@21.0.0", "")
        );
    }

    #[tokio::test]
    async fn test_slash_x_migrated_nested_subpath() {
        assert_eq!(
            map_ok("https://deno.land/x/ts_morph@21.0.0/common/mod.ts").await,
            mapped("@david/ts-morph", "jsr:@david/ts-morph@21.0.0", "common/mod")
        );
    }

    #[tokio::test]
    async fn test_slash_x_unmigrated_passes_through() {
        assert_eq!(
            map_ok("https://deno.land/x/oak@12.6.1/mod.ts").await,
            mapped("oak/", "https://deno.land/x/oak@12.6.1/", "mod.ts")
        );
    }

    #[tokio::test]
    async fn test_esm_sh_no_subpath() {
        assert_eq!(
            map_ok("https://esm.sh/ts-morph@21.0.0").await,
            mapped("ts-morph", "npm:ts-morph@21.0.0", "")
        );
    }

    #[tokio::test]
    async fn test_esm_sh_version_prefix_and_subpath() {
        assert_eq!(
            map_ok("https://esm.sh/v135/preact@10.19.2/hooks").await,
            mapped("preact", "npm:preact@10.19.2", "hooks")
        );
    }

    #[tokio::test]
    async fn test_esm_sh_scoped_package() {
        assert_eq!(
            map_ok("https://esm.sh/@unocss/core@0.58.0").await,
            mapped("@unocss/core", "npm:@unocss/core@0.58.0", "")
        );
    }

    #[tokio::test]
    async fn test_esm_sh_declines_gh_imports() {
        assert_eq!(
            map_ok("https://esm.sh/gh/user/repo@1.0.0/mod.ts").await,
            MapOutcome::UnmappedRemote
        );
    }

    #[tokio::test]
    async fn test_esm_sh_declines_declaration_subpath() {
        assert_eq!(
            map_ok("https://esm.sh/preact@10.19.2/src/index.d.ts").await,
            MapOutcome::UnmappedRemote
        );
        // case-insensitive
        assert_eq!(
            map_ok("https://esm.sh/preact@10.19.2/src/index.D.TS").await,
            MapOutcome::UnmappedRemote
        );
    }

    #[tokio::test]
    async fn test_unknown_remote_is_unmapped_remote() {
        assert_eq!(
            map_ok("https://example.com/some/mod.ts").await,
            MapOutcome::UnmappedRemote
        );
    }

    #[tokio::test]
    async fn test_relative_is_unmapped() {
        assert_eq!(map_ok("./foo.ts").await, MapOutcome::Unmapped);
        assert_eq!(map_ok("../bar/mod.ts").await, MapOutcome::Unmapped);
    }

    #[tokio::test]
    async fn test_bare_is_unmapped() {
        assert_eq!(map_ok("react").await, MapOutcome::Unmapped);
    }

    #[test]
    fn test_normalize_subpath() {
        assert_eq!(normalize_subpath("mod.ts"), "");
        assert_eq!(normalize_subpath("mod"), "");
        assert_eq!(normalize_subpath("bdd.ts"), "bdd");
        assert_eq!(normalize_subpath("common/mod.ts"), "common/mod");
        assert_eq!(normalize_subpath("path/posix.ts"), "path/posix");
    }
}
