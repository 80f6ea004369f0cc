//! Migration driver.
//!
//! Walks the project tree, rewrites every script file through the specifier
//! mapper, and saves the manifest with the accumulated import map.

use crate::error::Error;
use crate::import_map::ImportMapBuilder;
use crate::manifest::resolve_manifest;
use crate::rewrite::rewrite_source;
use crate::specifiers::{PackageFinder, SpecifierMapper};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Directories never descended into.
const SKIP_DIRS: &[&str] = &[".git", "node_modules", "dist", "build", "out", "target"];

/// File extensions treated as script sources.
const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs"];

/// Options for a migration run.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Analyze and report without writing any files.
    pub dry_run: bool,
}

/// Result of a migration run.
#[derive(Debug)]
pub struct MigrateReport {
    /// Path of the manifest that was (or would be) written.
    pub manifest_path: PathBuf,
    /// Package name from the manifest, when present.
    pub package_name: Option<String>,
    /// Script files analyzed.
    pub files_scanned: usize,
    /// Script files whose content changed.
    pub files_changed: usize,
    /// The final import map.
    pub imports: IndexMap<String, String>,
    /// Remote specifiers no strategy recognized.
    pub unmapped_remote_imports: Vec<String>,
    /// Follow-up notes (constructs the target registry does not support).
    pub notes: Vec<String>,
}

/// Run a migration over `cwd`.
///
/// Files are visited in a fixed (sorted) traversal order and specifiers are
/// mapped one at a time, so the locator cache and import map accumulate
/// deterministically.
pub async fn migrate<F: PackageFinder>(
    cwd: &Path,
    mapper: &SpecifierMapper<F>,
    options: &MigrateOptions,
) -> Result<MigrateReport, Error> {
    let mut manifest = resolve_manifest(cwd)?;
    let mut imports = ImportMapBuilder::new(manifest.value.imports.clone());
    let mut notes = Vec::new();
    let mut files_scanned = 0;
    let mut files_changed = 0;

    let walker = WalkDir::new(cwd)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry.map_err(|e| Error::other(format!("Failed to walk project: {e}")))?;
        if !entry.file_type().is_file() || !is_script_file(entry.path()) {
            continue;
        }

        let path = entry.path();
        let display_path = display_path(cwd, path);
        debug!(file = %display_path, "analyzing");
        files_scanned += 1;

        let source = fs::read_to_string(path)?;
        let outcome = rewrite_source(&source, &display_path, mapper, &mut imports).await?;
        notes.extend(outcome.notes);

        if outcome.changed {
            files_changed += 1;
            if !options.dry_run {
                fs::write(path, outcome.source)?;
            }
        }
    }

    let final_imports = imports.build();
    manifest.value.imports = final_imports.clone();
    if !options.dry_run {
        manifest.write()?;
    }

    info!(
        files_scanned,
        files_changed,
        imports = final_imports.len(),
        "migration complete"
    );

    Ok(MigrateReport {
        manifest_path: manifest.path,
        package_name: manifest.value.name,
        files_scanned,
        files_changed,
        imports: final_imports,
        unmapped_remote_imports: imports.unmapped_remote_imports().to_vec(),
        notes,
    })
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
}

fn is_script_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// Project-relative path with a `./` prefix, for notes and logs.
fn display_path(cwd: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(cwd).unwrap_or(path);
    format!("./{}", relative.display())
}
