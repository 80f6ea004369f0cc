//! Statement rewriting for migration.
//!
//! Scans source text for import/export statements and rewrites each remote
//! specifier the mapper chain recognizes to its import-map bare specifier
//! (plus subpath). Remote specifiers nobody recognizes are recorded on the
//! import map builder; everything else is left untouched.

use crate::apis::ApiError;
use crate::import_map::ImportMapBuilder;
use crate::specifiers::{MapOutcome, MappedSpecifier, PackageFinder, SpecifierMapper};

/// Result of rewriting one file.
#[derive(Debug)]
pub struct RewriteOutcome {
    /// The rewritten source.
    pub source: String,
    /// Whether anything differs from the input.
    pub changed: bool,
    /// Follow-up notes for constructs the target registry does not support.
    pub notes: Vec<String>,
}

/// Rewrite all import/export specifiers in `source`.
///
/// `display_path` is the project-relative path used in follow-up notes.
/// Mapped specifiers are registered on `imports`, which decides the final
/// bare specifier (it can rename on conflict).
pub async fn rewrite_source<F: PackageFinder>(
    source: &str,
    display_path: &str,
    mapper: &SpecifierMapper<F>,
    imports: &mut ImportMapBuilder,
) -> Result<RewriteOutcome, ApiError> {
    let mut result = String::with_capacity(source.len());
    let mut notes = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        if trimmed.starts_with("declare global") {
            let column = line.find("declare").map_or(1, |i| i + 1);
            notes.push(format!(
                "Global type augmentation is not yet supported in JSR.\n    at {display_path}:{line}:{column}",
                line = idx + 1
            ));
            result.push_str(line);
        } else if is_import_line(trimmed) || is_export_from_line(trimmed) {
            result.push_str(&rewrite_statement_line(line, mapper, imports).await?);
        } else if trimmed.contains("import(") {
            result.push_str(&rewrite_dynamic_import_line(line, mapper, imports).await?);
        } else {
            result.push_str(line);
        }
        result.push('\n');
    }

    // Remove trailing newline if original didn't have one
    if !source.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    let changed = result != source;
    Ok(RewriteOutcome {
        source: result,
        changed,
        notes,
    })
}

/// Rewrite a single static import/export line.
async fn rewrite_statement_line<F: PackageFinder>(
    line: &str,
    mapper: &SpecifierMapper<F>,
    imports: &mut ImportMapBuilder,
) -> Result<String, ApiError> {
    let Some((before, specifier, after, quote)) =
        extract_from_specifier(line).or_else(|| extract_side_effect_import(line))
    else {
        return Ok(line.to_string());
    };

    match mapper.map(&specifier).await? {
        MapOutcome::Mapped(mapped) => {
            let final_specifier = apply_mapped(&mapped, imports);
            Ok(format!("{before}{quote}{final_specifier}{quote}{after}"))
        }
        MapOutcome::UnmappedRemote => {
            imports.add_unmapped_remote_import(&specifier);
            Ok(line.to_string())
        }
        MapOutcome::Unmapped => Ok(line.to_string()),
    }
}

/// Rewrite dynamic `import()` expressions in a line.
async fn rewrite_dynamic_import_line<F: PackageFinder>(
    line: &str,
    mapper: &SpecifierMapper<F>,
    imports: &mut ImportMapBuilder,
) -> Result<String, ApiError> {
    let mut result = String::with_capacity(line.len());
    let mut remaining = line;

    while let Some(import_start) = remaining.find("import(") {
        result.push_str(&remaining[..import_start]);
        let after_import = &remaining[import_start + 7..];

        if let Some((specifier, quote, rest)) = extract_string_from_start(after_import) {
            let rewritten = match mapper.map(&specifier).await? {
                MapOutcome::Mapped(mapped) => apply_mapped(&mapped, imports),
                MapOutcome::UnmappedRemote => {
                    imports.add_unmapped_remote_import(&specifier);
                    specifier
                }
                MapOutcome::Unmapped => specifier,
            };
            result.push_str("import(");
            result.push(quote);
            result.push_str(&rewritten);
            result.push(quote);
            remaining = rest;
        } else {
            // Not a string literal, leave as-is
            result.push_str("import(");
            remaining = after_import;
        }
    }

    result.push_str(remaining);
    Ok(result)
}

/// Register a mapped specifier and build the final statement specifier:
/// the bare specifier the builder settled on, plus the subpath when there
/// is one.
fn apply_mapped(mapped: &MappedSpecifier, imports: &mut ImportMapBuilder) -> String {
    let mut final_specifier = imports.add_import(&mapped.bare_specifier, &mapped.base);
    if !mapped.subpath.is_empty() {
        if !final_specifier.ends_with('/') {
            final_specifier.push('/');
        }
        final_specifier.push_str(&mapped.subpath);
    }
    final_specifier
}

/// Check if a line is a static import statement.
fn is_import_line(trimmed: &str) -> bool {
    trimmed.starts_with("import ")
        && (trimmed.contains(" from ") || trimmed.contains('\'') || trimmed.contains('"'))
}

/// Check if a line is an `export ... from` re-export.
fn is_export_from_line(trimmed: &str) -> bool {
    trimmed.starts_with("export ") && trimmed.contains(" from ")
}

/// Extract the `from 'specifier'` portion of an import/export line.
///
/// Returns (`before_quote`, specifier, `after_quote`, `quote_char`).
fn extract_from_specifier(line: &str) -> Option<(String, String, String, char)> {
    let from_idx = line.find(" from ")?;
    let after_from = &line[from_idx + 6..];
    let after_from_trimmed = after_from.trim_start();
    let quote = after_from_trimmed.chars().next()?;

    if quote != '\'' && quote != '"' {
        return None;
    }

    let inner = &after_from_trimmed[1..];
    let end_idx = inner.find(quote)?;
    let specifier = inner[..end_idx].to_string();

    let before = format!("{} from ", &line[..from_idx]);
    let after_specifier = &inner[end_idx + 1..];

    Some((before, specifier, after_specifier.to_string(), quote))
}

/// Extract specifier from a side-effect import: `import 'xxx'` or `import "xxx"`.
fn extract_side_effect_import(line: &str) -> Option<(String, String, String, char)> {
    let trimmed = line.trim();
    if !trimmed.starts_with("import ") {
        return None;
    }

    let after_import = &trimmed[7..].trim_start();
    let quote = after_import.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }

    let inner = &after_import[1..];
    let end_idx = inner.find(quote)?;
    let specifier = inner[..end_idx].to_string();
    let after = inner[end_idx + 1..].to_string();

    let leading_ws: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    let before = format!("{leading_ws}import ");

    Some((before, specifier, after, quote))
}

/// Extract a string literal from the start of a string slice.
///
/// Returns (specifier, `quote_char`, `rest_of_string`).
fn extract_string_from_start(s: &str) -> Option<(String, char, &str)> {
    let trimmed = s.trim_start();
    let quote = trimmed.chars().next()?;

    if quote != '\'' && quote != '"' {
        return None;
    }

    let inner = &trimmed[1..];
    let end_idx = inner.find(quote)?;
    let specifier = inner[..end_idx].to_string();
    let rest = &inner[end_idx + 1..];

    Some((specifier, quote, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::JsrPackage;
    use indexmap::IndexMap;

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

    async fn rewrite(source: &str) -> (RewriteOutcome, ImportMapBuilder) {
        let mapper = SpecifierMapper::new(StubFinder);
        let mut imports = ImportMapBuilder::new(IndexMap::new());
        let outcome = rewrite_source(source, "./mod.ts", &mapper, &mut imports)
            .await
            .unwrap();
        (outcome, imports)
    }

    #[tokio::test]
    async fn test_rewrite_std_import() {
        let (outcome, imports) =
            rewrite(r#"import { join } from "https://deno.land/std@0.193.0/path/mod.ts";"#).await;

        assert_eq!(outcome.source, r#"import { join } from "@std/path";"#);
        assert!(outcome.changed);
        assert_eq!(
            imports.build().get("@std/path").unwrap(),
            "jsr:@std/path@0.193.0"
        );
    }

    #[tokio::test]
    async fn test_rewrite_appends_subpath() {
        let (outcome, _) =
            rewrite(r#"import { describe } from "https://deno.land/std@0.193.0/testing/bdd.ts";"#)
                .await;

        assert_eq!(
            outcome.source,
            r#"import { describe } from "@std/testing/bdd";"#
        );
    }

    #[tokio::test]
    async fn test_rewrite_pass_through_keeps_trailing_slash() {
        let (outcome, imports) =
            rewrite(r#"import { Application } from "https://deno.land/x/oak@12.6.1/mod.ts";"#)
                .await;

        // the bare specifier already ends with a slash, so no extra one
        assert_eq!(
            outcome.source,
            r#"import { Application } from "oak/mod.ts";"#
        );
        assert_eq!(
            imports.build().get("oak/").unwrap(),
            "https://deno.land/x/oak@12.6.1/"
        );
    }

    #[tokio::test]
    async fn test_rewrite_migrated_slash_x() {
        let (outcome, imports) =
            rewrite(r#"import { Project } from "https://deno.land/x/ts_morph@21.0.0/mod.ts";"#)
                .await;

        assert_eq!(
            outcome.source,
            r#"import { Project } from "@david/ts-morph";"#
        );
        assert_eq!(
            imports.build().get("@david/ts-morph").unwrap(),
            "jsr:@david/ts-morph@21.0.0"
        );
    }

    #[tokio::test]
    async fn test_rewrite_side_effect_import() {
        let (outcome, _) =
            rewrite(r#"import "https://deno.land/std@0.193.0/dotenv/load.ts";"#).await;

        assert_eq!(outcome.source, r#"import "@std/dotenv/load";"#);
    }

    #[tokio::test]
    async fn test_rewrite_export_from() {
        let (outcome, _) =
            rewrite(r#"export { join } from "https://deno.land/std@0.193.0/path/mod.ts";"#).await;

        assert_eq!(outcome.source, r#"export { join } from "@std/path";"#);
    }

    #[tokio::test]
    async fn test_rewrite_dynamic_import() {
        let (outcome, _) =
            rewrite(r#"const mod = await import("https://deno.land/std@0.193.0/path/mod.ts");"#)
                .await;

        assert_eq!(outcome.source, r#"const mod = await import("@std/path");"#);
    }

    #[tokio::test]
    async fn test_relative_imports_untouched() {
        let source = r#"import { helper } from "./helper.ts";"#;
        let (outcome, _) = rewrite(source).await;

        assert_eq!(outcome.source, source);
        assert!(!outcome.changed);
    }

    #[tokio::test]
    async fn test_unmapped_remote_recorded_and_untouched() {
        let source = r#"import { x } from "https://example.com/x/mod.ts";"#;
        let (outcome, imports) = rewrite(source).await;

        assert_eq!(outcome.source, source);
        assert_eq!(
            imports.unmapped_remote_imports(),
            &["https://example.com/x/mod.ts".to_string()]
        );
    }

    #[tokio::test]
    async fn test_conflicting_versions_rename_in_statement() {
        let mapper = SpecifierMapper::new(StubFinder);
        let mut imports = ImportMapBuilder::new(IndexMap::new());

        let first = rewrite_source(
            r#"import { join } from "https://deno.land/std@0.193.0/path/mod.ts";"#,
            "./a.ts",
            &mapper,
            &mut imports,
        )
        .await
        .unwrap();
        let second = rewrite_source(
            r#"import { join } from "https://deno.land/std@0.200.0/path/mod.ts";"#,
            "./b.ts",
            &mapper,
            &mut imports,
        )
        .await
        .unwrap();

        assert_eq!(first.source, r#"import { join } from "@std/path";"#);
        assert_eq!(second.source, r#"import { join } from "@std/path2";"#);

        let built = imports.build();
        assert_eq!(built.get("@std/path").unwrap(), "jsr:@std/path@0.193.0");
        assert_eq!(built.get("@std/path2").unwrap(), "jsr:@std/path@0.200.0");
    }

    #[tokio::test]
    async fn test_declare_global_note() {
        let source = "declare global {\n  interface Window {}\n}\n";
        let (outcome, _) = rewrite(source).await;

        assert_eq!(outcome.source, source);
        assert_eq!(outcome.notes.len(), 1);
        assert!(outcome.notes[0].contains("Global type augmentation"));
        assert!(outcome.notes[0].contains("./mod.ts:1:1"));
    }

    #[tokio::test]
    async fn test_missing_trailing_newline_preserved() {
        let source = r#"import { join } from "https://deno.land/std@0.193.0/path/mod.ts";"#;
        let (outcome, _) = rewrite(source).await;

        assert!(!outcome.source.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_single_quotes_preserved() {
        let (outcome, _) =
            rewrite("import { join } from 'https://deno.land/std@0.193.0/path/mod.ts';").await;

        assert_eq!(outcome.source, "import { join } from '@std/path';");
    }
}
