//! Specifier classification and mapping.
//!
//! Recognizes the legacy URL import shapes (esm.sh, deno.land/std,
//! deno.land/x) and maps each to a registry-qualified bare specifier plus
//! base coordinate for the import map.

mod locator;
mod mapper;

pub use locator::CachedPackageLocator;
pub use mapper::{MapOutcome, MappedSpecifier, PackageFinder, SpecifierMapper};
