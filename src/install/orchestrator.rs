//! The installation orchestrator.
//!
//! One run: load and validate the manifest set, expand the profile into a
//! package list, resolve a backend per package, dispatch each backend's
//! share as a bulk operation, and aggregate a summary. Validation failures
//! halt before anything is touched; per-package failures are recorded and
//! the run continues.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::backend::{self, Backend, BackendContext};
use crate::cache::PackageCache;
use crate::common::{Executor, Platform};
use crate::error::ProvisionError;
use crate::manifest::{self, Manifest};

use super::outcome::{InstallOutcome, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Install,
    Uninstall,
}

/// Load, merge, expand and validate a manifest document set.
///
/// Nothing is installed past this point unless the whole set is valid.
pub fn load_validated_manifest<P: AsRef<Path>>(paths: &[P]) -> Result<Manifest, ProvisionError> {
    let mut manifest = manifest::load_and_merge(paths)?;
    manifest::expand_mise_tools(&mut manifest);
    let violations = manifest::validate(&manifest);
    if !violations.is_empty() {
        return Err(ProvisionError::Validation(violations));
    }
    Ok(manifest)
}

/// Install every package of a profile.
pub fn install_from_manifest<P: AsRef<Path>>(
    exec: &dyn Executor,
    manifest_paths: &[P],
    profile: &str,
    platform: Platform,
    dry_run: bool,
) -> Result<RunSummary> {
    run(exec, manifest_paths, profile, platform, dry_run, Action::Install)
}

/// Remove every package of a profile.
pub fn uninstall_from_manifest<P: AsRef<Path>>(
    exec: &dyn Executor,
    manifest_paths: &[P],
    profile: &str,
    platform: Platform,
    dry_run: bool,
) -> Result<RunSummary> {
    run(exec, manifest_paths, profile, platform, dry_run, Action::Uninstall)
}

fn run<P: AsRef<Path>>(
    exec: &dyn Executor,
    manifest_paths: &[P],
    profile: &str,
    platform: Platform,
    dry_run: bool,
    action: Action,
) -> Result<RunSummary> {
    let manifest = load_validated_manifest(manifest_paths)?;
    let packages = manifest::packages_for_profile(&manifest, profile, platform)?;

    let mut summary = RunSummary {
        total: packages.len(),
        ..RunSummary::default()
    };

    // In dry-run mode resolution describes the manifest's plan rather than
    // what this particular host happens to have on PATH.
    let probe = move |b: Backend| dry_run || b.is_available(exec, platform);

    let mut per_backend: BTreeMap<Backend, Vec<String>> = BTreeMap::new();
    for package in &packages {
        match backend::resolve(&manifest, package, platform, &probe) {
            Ok(chosen) => per_backend.entry(chosen).or_default().push(package.clone()),
            Err(err) => {
                let outcome = InstallOutcome::Failed(err.to_string());
                report_outcome(package, None, &outcome);
                summary.record(package, &outcome);
            }
        }
    }

    let mut cache = PackageCache::new();
    let mut ctx = BackendContext::new(exec, &mut cache, dry_run);

    for (chosen, group) in &per_backend {
        let bulk = match action {
            Action::Install => backend::install_bulk(&mut ctx, &manifest, *chosen, group)?,
            Action::Uninstall => {
                let mut bulk = super::outcome::BulkSummary::default();
                for package in group {
                    bulk.count += 1;
                    let outcome = backend::uninstall(&mut ctx, &manifest, *chosen, package)?;
                    bulk.record(package, outcome);
                }
                bulk
            }
        };
        for (package, outcome) in &bulk.outcomes {
            report_outcome(package, Some(*chosen), outcome);
            summary.record(package, outcome);
        }
    }

    Ok(summary)
}

/// Print one package's outcome line.
pub fn report_outcome(package: &str, chosen: Option<Backend>, outcome: &InstallOutcome) {
    let via = chosen.map(|b| format!(" ({b})")).unwrap_or_default();
    match outcome {
        InstallOutcome::Installed => {
            println!("{} {package}{via}: installed", "✓".green());
        }
        InstallOutcome::Removed => {
            println!("{} {package}{via}: removed", "✓".green());
        }
        InstallOutcome::AlreadyInstalled => {
            println!("{} {package}{via}: already installed", "·".dimmed());
        }
        InstallOutcome::DryRun(plan) => {
            println!("{} {package}{via}:", "[dry run]".cyan());
            for line in plan.lines() {
                println!("    {line}");
            }
        }
        InstallOutcome::Skipped(reason) => {
            println!("{} {package}{via}: skipped ({reason})", "·".dimmed());
        }
        InstallOutcome::Failed(reason) => {
            eprintln!("{} {package}{via}: {reason}", "✗".red());
        }
    }
}

/// Print the closing summary line of a run.
pub fn report_summary(summary: &RunSummary, dry_run: bool) {
    let headline = format!(
        "{} package(s): {} ok, {} already installed, {} skipped, {} failed",
        summary.total, summary.succeeded, summary.already_installed, summary.skipped, summary.failed
    );
    if dry_run {
        println!("{} {headline}", "[dry run]".cyan());
    } else if summary.is_success() {
        println!("{}", headline.green());
    } else {
        println!("{}", headline.red());
        for (package, reason) in &summary.failures {
            eprintln!("  {}: {reason}", package.yellow());
        }
    }
}
