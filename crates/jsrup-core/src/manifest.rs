//! Project manifest (deno.json / deno.jsonc) handling.
//!
//! Only the `name`, `version`, and `imports` fields are interpreted;
//! everything else is carried through writes verbatim. `.jsonc` files are
//! parsed as plain JSON; comments are not supported.

use crate::error::Error;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Preferred manifest filename.
pub const MANIFEST_NAME: &str = "deno.json";

/// Fallback manifest filename.
pub const MANIFEST_FALLBACK_NAME: &str = "deno.jsonc";

/// The manifest fields jsrup reads and writes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default)]
    pub imports: IndexMap<String, String>,

    /// All remaining fields, preserved as-is across a rewrite.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A resolved manifest: its path plus parsed value.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub value: ManifestValue,
}

impl Manifest {
    /// Write the manifest back to its path as pretty-printed JSON.
    pub fn write(&self) -> Result<(), Error> {
        let mut content = serde_json::to_string_pretty(&self.value)
            .map_err(|e| Error::other(format!("Failed to serialize manifest: {e}")))?;
        content.push('\n');
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Resolve the project manifest in `cwd`.
///
/// `deno.json` is preferred; `deno.jsonc` is the fallback. A missing file
/// yields an empty manifest anchored at the path that would be written.
pub fn resolve_manifest(cwd: &Path) -> Result<Manifest, Error> {
    let deno_json = cwd.join(MANIFEST_NAME);
    if deno_json.exists() {
        let value = read_manifest_value(&deno_json)?.unwrap_or_default();
        return Ok(Manifest {
            path: deno_json,
            value,
        });
    }

    let deno_jsonc = cwd.join(MANIFEST_FALLBACK_NAME);
    let value = read_manifest_value(&deno_jsonc)?.unwrap_or_default();
    Ok(Manifest {
        path: deno_jsonc,
        value,
    })
}

fn read_manifest_value(path: &Path) -> Result<Option<ManifestValue>, Error> {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| Error::ManifestParse {
                path: path.to_path_buf(),
                source,
            }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::ManifestRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_missing_manifest_is_empty() {
        let dir = tempdir().unwrap();
        let manifest = resolve_manifest(dir.path()).unwrap();
        assert!(manifest.value.name.is_none());
        assert!(manifest.value.imports.is_empty());
        // the fallback path is where a fresh manifest would be written
        assert!(manifest.path.ends_with(MANIFEST_FALLBACK_NAME));
    }

    #[test]
    fn test_resolve_prefers_deno_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("deno.json"), r#"{"name":"one"}"#).unwrap();
        fs::write(dir.path().join("deno.jsonc"), r#"{"name":"two"}"#).unwrap();

        let manifest = resolve_manifest(dir.path()).unwrap();
        assert_eq!(manifest.value.name.as_deref(), Some("one"));
        assert!(manifest.path.ends_with(MANIFEST_NAME));
    }

    #[test]
    fn test_resolve_falls_back_to_jsonc() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("deno.jsonc"), r#"{"name":"two"}"#).unwrap();

        let manifest = resolve_manifest(dir.path()).unwrap();
        assert_eq!(manifest.value.name.as_deref(), Some("two"));
    }

    #[test]
    fn test_resolve_rejects_comments() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("deno.json"),
            "{\n  // a comment\n  \"name\": \"one\"\n}",
        )
        .unwrap();

        let err = resolve_manifest(dir.path()).unwrap_err();
        assert!(err.to_string().contains("without comments"));
    }

    #[test]
    fn test_write_preserves_unknown_fields() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("deno.json"),
            r#"{"name":"pkg","version":"1.0.0","tasks":{"dev":"deno run -A main.ts"},"lock":false}"#,
        )
        .unwrap();

        let mut manifest = resolve_manifest(dir.path()).unwrap();
        manifest
            .value
            .imports
            .insert("@std/path".to_string(), "jsr:@std/path@1.0.0".to_string());
        manifest.write().unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&manifest.path).unwrap()).unwrap();
        assert_eq!(written["name"], "pkg");
        assert_eq!(written["version"], "1.0.0");
        assert_eq!(written["tasks"]["dev"], "deno run -A main.ts");
        assert_eq!(written["lock"], false);
        assert_eq!(written["imports"]["@std/path"], "jsr:@std/path@1.0.0");
    }

    #[test]
    fn test_imports_preserve_insertion_order() {
        let mut value = ManifestValue::default();
        value
            .imports
            .insert("zeta".to_string(), "jsr:@a/zeta@1.0.0".to_string());
        value
            .imports
            .insert("alpha".to_string(), "jsr:@a/alpha@1.0.0".to_string());

        let json = serde_json::to_string(&value).unwrap();
        let zeta = json.find("zeta").unwrap();
        let alpha = json.find("alpha").unwrap();
        assert!(zeta < alpha);
    }
}
