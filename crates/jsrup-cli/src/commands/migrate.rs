//! `jsrup migrate` command implementation.
//!
//! Confirms the destructive rewrite, wires the real lookup services into
//! the mapper chain, runs the migration, and reports the results.

use jsrup_core::migrate::{migrate, MigrateOptions, MigrateReport};
use jsrup_core::{
    resolve_manifest, CachedPackageLocator, Config, ModulesClient, RegistryClient, SpecifierMapper,
};
use miette::{IntoDiagnostic, Result};
use std::io::{self, Write};
use tracing::info;

pub fn run(config: &Config, yes: bool, dry_run: bool) -> Result<()> {
    // Fail early on an unreadable manifest, before prompting
    let manifest = resolve_manifest(&config.cwd).into_diagnostic()?;

    if !yes && !dry_run {
        println!("This will modify the files in {}.", config.cwd.display());
        println!("Please check in all code to source control before continuing.");
        if !confirm("Continue? [y/N] ")? {
            eprintln!("Aborted.");
            std::process::exit(1);
        }
    }

    let package_name = match manifest.value.name {
        Some(name) => name,
        None => {
            let dir_name = config
                .cwd
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("my-package")
                .to_string();
            if yes || dry_run {
                dir_name
            } else {
                prompt(&format!("package name ({dir_name}): "))?
                    .filter(|s| !s.is_empty())
                    .unwrap_or(dir_name)
            }
        }
    };

    info!(package = %package_name, "migrating");

    let runtime = tokio::runtime::Runtime::new().into_diagnostic()?;
    let report = runtime
        .block_on(async {
            let modules = ModulesClient::from_env()?;
            let registry = RegistryClient::from_env()?;
            let locator = CachedPackageLocator::new(modules, registry);
            let mapper = SpecifierMapper::new(locator);
            migrate(&config.cwd, &mapper, &MigrateOptions { dry_run }).await
        })
        .into_diagnostic()?;

    print_report(&report, config.json_logs, dry_run);
    Ok(())
}

fn print_report(report: &MigrateReport, json: bool, dry_run: bool) {
    if json {
        let output = serde_json::json!({
            "ok": true,
            "dryRun": dry_run,
            "manifestPath": &report.manifest_path,
            "filesScanned": report.files_scanned,
            "filesChanged": report.files_changed,
            "imports": &report.imports,
            "unmappedRemoteImports": &report.unmapped_remote_imports,
            "notes": &report.notes,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        );
        return;
    }

    println!(
        "Analyzed {} files, rewrote {}.",
        report.files_scanned, report.files_changed
    );

    if !report.imports.is_empty() {
        println!("Import map ({} entries):", report.imports.len());
        for (bare, base) in &report.imports {
            println!("  {bare} -> {base}");
        }
    }

    if !report.unmapped_remote_imports.is_empty() {
        println!("Could not map these remote imports:");
        for specifier in &report.unmapped_remote_imports {
            println!("  - {specifier}");
        }
    }

    for note in &report.notes {
        println!("warning: {note}");
    }

    if dry_run {
        println!("Dry run: no files were written.");
    } else {
        println!("Wrote import map to {}.", report.manifest_path.display());
    }
}

fn confirm(message: &str) -> Result<bool> {
    Ok(prompt(message)?
        .map(|answer| matches!(answer.as_str(), "y" | "Y" | "yes"))
        .unwrap_or(false))
}

/// Prompt the user for input
fn prompt(message: &str) -> Result<Option<String>> {
    print!("{message}");
    io::stdout()
        .flush()
        .map_err(|e| miette::miette!("Failed to flush stdout: {}", e))?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .map_err(|e| miette::miette!("Failed to read input: {}", e))?;

    let trimmed = input.trim().to_string();
    Ok(if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    })
}
