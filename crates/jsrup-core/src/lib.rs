#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)]

pub mod apis;
pub mod config;
pub mod error;
pub mod import_map;
pub mod manifest;
pub mod migrate;
pub mod rewrite;
pub mod specifiers;
pub mod version;

pub use apis::{
    ApiError, JsrPackage, LegacyModule, ModulesApi, ModulesClient, RegistryApi, RegistryClient,
};
pub use config::Config;
pub use error::Error;
pub use import_map::ImportMapBuilder;
pub use manifest::{resolve_manifest, Manifest, ManifestValue};
pub use migrate::{migrate, MigrateOptions, MigrateReport};
pub use specifiers::{
    CachedPackageLocator, MapOutcome, MappedSpecifier, PackageFinder, SpecifierMapper,
};
pub use version::VERSION;
