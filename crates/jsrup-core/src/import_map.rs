//! Import map accumulation.
//!
//! Collects bare-specifier → base-coordinate pairs for the whole run and
//! guarantees each bare specifier maps to exactly one coordinate, renaming
//! on conflict. Also tracks remote specifiers no strategy could map.

use indexmap::IndexMap;
use std::collections::HashSet;

/// Builder for the manifest's import map.
pub struct ImportMapBuilder {
    imports: IndexMap<String, String>,
    unmapped_remote: Vec<String>,
    seen_remote: HashSet<String>,
}

impl ImportMapBuilder {
    /// Create a builder seeded with the manifest's existing imports.
    #[must_use]
    pub fn new(imports: IndexMap<String, String>) -> Self {
        Self {
            imports,
            unmapped_remote: Vec::new(),
            seen_remote: HashSet::new(),
        }
    }

    /// Record a bare specifier → base mapping.
    ///
    /// Returns the bare specifier actually used, which differs from the
    /// input when the requested name is already bound to a different base.
    /// Callers must rewrite statements with the returned name.
    pub fn add_import(&mut self, bare_specifier: &str, base: &str) -> String {
        let bare_specifier = self.unique_bare_specifier(bare_specifier, base);
        self.imports.insert(bare_specifier.clone(), base.to_string());
        bare_specifier
    }

    /// Find a slot for `bare_specifier` that is free or already holds
    /// `base`, appending an incrementing numeric tail on conflict. A tail
    /// is inserted before a trailing `/` so pass-through names keep their
    /// shape (`oak/` → `oak2/`).
    fn unique_bare_specifier(&self, bare_specifier: &str, base: &str) -> String {
        if self.is_available(bare_specifier, base) {
            return bare_specifier.to_string();
        }

        let has_trailing_slash = bare_specifier.ends_with('/');
        let stem = if has_trailing_slash {
            &bare_specifier[..bare_specifier.len() - 1]
        } else {
            bare_specifier
        };

        let mut n: u64 = 2;
        loop {
            let candidate = if has_trailing_slash {
                format!("{stem}{n}/")
            } else {
                format!("{stem}{n}")
            };
            if self.is_available(&candidate, base) {
                return candidate;
            }
            n += 1;
        }
    }

    fn is_available(&self, bare_specifier: &str, base: &str) -> bool {
        match self.imports.get(bare_specifier) {
            None => true,
            Some(existing) => existing == base,
        }
    }

    /// Record a remote specifier no strategy recognized. Deduplicated by
    /// exact string.
    pub fn add_unmapped_remote_import(&mut self, specifier: &str) {
        if self.seen_remote.insert(specifier.to_string()) {
            self.unmapped_remote.push(specifier.to_string());
        }
    }

    /// The accumulated bare specifier → base table.
    #[must_use]
    pub fn build(&self) -> IndexMap<String, String> {
        self.imports.clone()
    }

    /// Remote specifiers nobody could map, in first-appearance order.
    #[must_use]
    pub fn unmapped_remote_imports(&self) -> &[String] {
        &self.unmapped_remote
    }
}
