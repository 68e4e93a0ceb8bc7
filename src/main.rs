use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use dotprov::backend::{self, Backend, BackendContext};
use dotprov::cache::PackageCache;
use dotprov::common::{Platform, SystemExecutor};
use dotprov::install::{
    self, install_from_manifest, load_validated_manifest, report_summary, uninstall_from_manifest,
};
use dotprov::manifest;
use dotprov::verify::{self, load_missing_packages, log_missing_packages};

/// dotprov main parser
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Activate debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Manifest document(s), merged in order (later documents win).
    /// Defaults to manifests/common.yaml plus manifests/<platform>.yaml.
    #[arg(short, long, global = true)]
    manifest: Vec<String>,

    /// Target platform (defaults to auto-detection)
    #[arg(short, long, global = true)]
    platform: Option<Platform>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install all packages of a profile
    Install {
        /// Profile name from the manifest
        profile: String,
        /// Describe what would run without touching the system
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove all packages of a profile
    #[command(alias = "cleanup")]
    Uninstall {
        profile: String,
        #[arg(long)]
        dry_run: bool,
    },

    /// Cross-check installed state against the manifest
    Verify {
        profile: String,
        /// Where to write the verification log
        #[arg(long)]
        log: Option<String>,
    },

    /// Re-install the packages recorded in a verification log
    Retry {
        #[arg(long)]
        log: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate manifest documents against the schema
    Schema {
        /// Documents to validate (defaults to the standard set)
        paths: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        eprintln!("Debug mode is on");
    }

    if let Err(e) = run(&cli) {
        eprintln!("{} {e:#}", "Error:".red());
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let platform = match cli.platform {
        Some(platform) => platform,
        None => Platform::detect().context(
            "could not detect a supported platform (ubuntu/macos); pass --platform explicitly",
        )?,
    };
    let manifest_paths = manifest_paths(cli, platform)?;
    let exec = SystemExecutor;

    match &cli.command {
        Commands::Install { profile, dry_run } => {
            let summary =
                install_from_manifest(&exec, &manifest_paths, profile, platform, *dry_run)?;
            report_summary(&summary, *dry_run);
            if !summary.is_success() {
                anyhow::bail!("{} package(s) failed", summary.failed);
            }
        }

        Commands::Uninstall { profile, dry_run } => {
            let summary =
                uninstall_from_manifest(&exec, &manifest_paths, profile, platform, *dry_run)?;
            report_summary(&summary, *dry_run);
            if !summary.is_success() {
                anyhow::bail!("{} package(s) failed", summary.failed);
            }
        }

        Commands::Verify { profile, log } => {
            let manifest = load_validated_manifest(&manifest_paths)?;
            let packages: Vec<String> =
                manifest::packages_for_profile(&manifest, profile, platform)?
                    .into_iter()
                    .collect();

            let mut cache = PackageCache::new();
            let mut ctx = BackendContext::new(&exec, &mut cache, false);
            let issues =
                verify::verify_packages_batch(&mut ctx, &manifest, &packages, platform)?;

            if issues.is_empty() {
                println!(
                    "{}",
                    format!("all {} package(s) verified", packages.len()).green()
                );
            } else {
                verify::report::report_issues(&issues);
                let path = log_path(log.as_deref())?;
                log_missing_packages(&path, &issues)?;
                println!("{} issue(s) logged to {}", issues.len(), path.display());
                anyhow::bail!("{} package(s) failed verification", issues.len());
            }
        }

        Commands::Retry { log, dry_run } => {
            let path = log_path(log.as_deref())?;
            let packages = load_missing_packages(&path)?;
            if packages.is_empty() {
                println!("nothing to retry");
                return Ok(());
            }
            if cli.debug {
                eprintln!("Retrying: {packages:?}");
            }

            let manifest = load_validated_manifest(&manifest_paths)?;
            let mut cache = PackageCache::new();
            let mut ctx = BackendContext::new(&exec, &mut cache, *dry_run);
            let mut summary = install::RunSummary {
                total: packages.len(),
                ..Default::default()
            };
            // One unresolvable package must not abort the rest of the batch.
            for package in &packages {
                if !manifest.packages.contains_key(package) {
                    let outcome =
                        install::InstallOutcome::Skipped("no longer in manifest".to_string());
                    install::report_outcome(package, None, &outcome);
                    summary.record(package, &outcome);
                    continue;
                }
                let probe = |b: Backend| *dry_run || b.is_available(&exec, platform);
                match backend::resolve(&manifest, package, platform, &probe) {
                    Ok(chosen) => {
                        let outcome = backend::install(&mut ctx, &manifest, chosen, package)?;
                        install::report_outcome(package, Some(chosen), &outcome);
                        summary.record(package, &outcome);
                    }
                    Err(err) => {
                        let outcome = install::InstallOutcome::Failed(err.to_string());
                        install::report_outcome(package, None, &outcome);
                        summary.record(package, &outcome);
                    }
                }
            }
            report_summary(&summary, *dry_run);
            if !summary.is_success() {
                anyhow::bail!("{} package(s) failed", summary.failed);
            }
        }

        Commands::Schema { paths } => {
            let paths = if paths.is_empty() {
                manifest_paths.clone()
            } else {
                paths.iter().map(expand_path).collect()
            };
            manifest::validate_manifest_schema(&paths)?;
            println!("manifest schema validation passed");
        }
    }

    Ok(())
}

/// The manifest document set for this invocation: explicit `--manifest`
/// paths, or the standard common + platform pair. The platform document is
/// optional; the common one is not.
fn manifest_paths(cli: &Cli, platform: Platform) -> Result<Vec<PathBuf>> {
    if !cli.manifest.is_empty() {
        return Ok(cli.manifest.iter().map(expand_path).collect());
    }

    let common = PathBuf::from("manifests/common.yaml");
    let platform_doc = PathBuf::from(format!("manifests/{}.yaml", platform.identifier()));

    let mut paths = vec![common];
    if platform_doc.exists() {
        paths.push(platform_doc);
    }
    Ok(paths)
}

fn expand_path(path: impl AsRef<str>) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path.as_ref()).into_owned())
}

/// Default verification log location: the user state directory, falling
/// back to the data directory.
fn log_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(expand_path(path));
    }
    let base = dirs::state_dir()
        .or_else(dirs::data_dir)
        .context("could not determine a state directory for the verification log")?;
    Ok(base.join("dotprov").join("missing_packages.yaml"))
}
