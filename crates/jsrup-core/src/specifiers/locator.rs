//! Cache-backed lookup of migrated deno.land/x packages.

use super::mapper::PackageFinder;
use crate::apis::{ApiError, JsrPackage, ModulesApi, RegistryApi};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Resolves a legacy package name to its JSR identity via two chained
/// service calls, memoizing the outcome (including "not found") for the
/// rest of the run.
///
/// The cache distinguishes "never queried" (key absent) from "queried, no
/// result" (key present, value `None`), so negatives are never re-queried.
/// Lookups are expected to happen strictly sequentially; two concurrent
/// calls for the same name would each hit the services.
pub struct CachedPackageLocator<M, R> {
    modules: M,
    registry: R,
    cache: Mutex<HashMap<String, Option<JsrPackage>>>,
}

impl<M: ModulesApi, R: RegistryApi> CachedPackageLocator<M, R> {
    #[must_use]
    pub fn new(modules: M, registry: R) -> Self {
        Self {
            modules,
            registry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The uncached lookup: module metadata first, then the registry.
    /// A name unknown to the metadata service short-circuits to "not
    /// found" without touching the registry.
    async fn lookup(&self, name: &str) -> Result<Option<JsrPackage>, ApiError> {
        let Some(module) = self.modules.get_module(name).await? else {
            return Ok(None);
        };
        self.registry.get_package_by_repo_id(module.repo_id).await
    }
}

impl<M: ModulesApi, R: RegistryApi> PackageFinder for CachedPackageLocator<M, R> {
    async fn find_jsr_package(&self, name: &str) -> Result<Option<JsrPackage>, ApiError> {
        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(name) {
                return Ok(cached.clone());
            }
        }

        // Only completed lookups are written back; a failed call leaves the
        // cache untouched and propagates.
        let value = self.lookup(name).await?;
        self.cache
            .lock()
            .await
            .insert(name.to_string(), value.clone());
        Ok(value)
    }
}
