//! Clients for the two lookup services used during migration.
//!
//! The module-metadata service resolves a legacy deno.land/x package name to
//! its source repository id; the registry service resolves a repository id to
//! the JSR package published from it. Both are behind capability traits so
//! the locator can be tested without the network.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default base URL for the module-metadata service.
pub const DEFAULT_MODULES_API_URL: &str = "https://apiland.deno.dev/";

/// Environment variable to override the module-metadata service URL.
pub const MODULES_API_ENV: &str = "JSRUP_MODULES_API_URL";

/// Default base URL for the JSR registry API.
pub const DEFAULT_REGISTRY_API_URL: &str = "https://jsr.io/";

/// Environment variable to override the registry API URL.
pub const REGISTRY_API_ENV: &str = "JSRUP_REGISTRY_API_URL";

/// Error from one of the lookup services.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid API URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status} for '{what}'")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        what: String,
    },
}

/// A legacy deno.land/x module, as reported by the module-metadata service.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyModule {
    /// Source-control repository id, the join key into the registry lookup.
    pub repo_id: i64,
}

/// Identity of a package in the JSR registry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JsrPackage {
    pub scope: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct JsrPackageResponse {
    #[serde(default)]
    items: Vec<JsrPackage>,
}

/// Module-metadata lookup capability.
pub trait ModulesApi {
    /// Resolve a legacy package name to its module record, if any.
    async fn get_module(&self, name: &str) -> Result<Option<LegacyModule>, ApiError>;
}

/// Registry-package lookup capability.
pub trait RegistryApi {
    /// Resolve a source repository id to the package published from it.
    async fn get_package_by_repo_id(&self, repo_id: i64) -> Result<Option<JsrPackage>, ApiError>;
}

fn build_http_client() -> Result<reqwest::Client, ApiError> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(15))
        .user_agent(concat!("jsrup/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
    Url::parse(base_url).map_err(|source| ApiError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })
}

/// HTTP client for the module-metadata service.
#[derive(Debug, Clone)]
pub struct ModulesClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ModulesClient {
    /// Create a new client with the given base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// created.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http: build_http_client()?,
        })
    }

    /// Create a client using the URL from the environment or the default.
    pub fn from_env() -> Result<Self, ApiError> {
        let url =
            std::env::var(MODULES_API_ENV).unwrap_or_else(|_| DEFAULT_MODULES_API_URL.to_string());
        Self::new(&url)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl ModulesApi for ModulesClient {
    async fn get_module(&self, name: &str) -> Result<Option<LegacyModule>, ApiError> {
        let url = self
            .base_url
            .join(&format!("legacy_modules/{name}"))
            .map_err(|source| ApiError::InvalidUrl {
                url: format!("legacy_modules/{name}"),
                source,
            })?;

        let response = self.http.get(url.as_str()).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(ApiError::Status {
                service: "module metadata service",
                status: response.status(),
                what: name.to_string(),
            });
        }

        let module: Option<LegacyModule> = response.json().await?;
        Ok(module)
    }
}

/// HTTP client for the JSR registry API.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: Url,
    http: reqwest::Client,
}

impl RegistryClient {
    /// Create a new client with the given base URL.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// created.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http: build_http_client()?,
        })
    }

    /// Create a client using the URL from the environment or the default.
    pub fn from_env() -> Result<Self, ApiError> {
        let url =
            std::env::var(REGISTRY_API_ENV).unwrap_or_else(|_| DEFAULT_REGISTRY_API_URL.to_string());
        Self::new(&url)
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl RegistryApi for RegistryClient {
    async fn get_package_by_repo_id(&self, repo_id: i64) -> Result<Option<JsrPackage>, ApiError> {
        let mut url = self
            .base_url
            .join("api/packages")
            .map_err(|source| ApiError::InvalidUrl {
                url: "api/packages".to_string(),
                source,
            })?;
        url.query_pairs_mut()
            .append_pair("gitHubRepoId", &repo_id.to_string());

        let response = self.http.get(url.as_str()).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(ApiError::Status {
                service: "registry API",
                status: response.status(),
                what: format!("gitHubRepoId={repo_id}"),
            });
        }

        let result: JsrPackageResponse = response.json().await?;
        Ok(result.items.into_iter().next())
    }
}
