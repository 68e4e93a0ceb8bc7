//! The PPA adapter.
//!
//! A PPA install is a composition: optionally import a signing key, register
//! the repository with `add-apt-repository`, refresh the package index, then
//! install the supplied deb(s) through apt. Repository registration is
//! skipped when the PPA is already present in the apt source lists.

use anyhow::Result;

use crate::common::exec::render_command;
use crate::common::Executor;
use crate::error::ProvisionError;
use crate::install::outcome::InstallOutcome;
use crate::manifest::schema::PpaConfig;
use crate::manifest::{backend_config, BackendConfig, Manifest};

use super::{apt, Backend, BackendContext};

const SOURCES_DIR: &str = "/etc/apt/sources.list.d";

fn config<'a>(manifest: &'a Manifest, package: &str) -> Result<&'a PpaConfig, ProvisionError> {
    let BackendConfig::Ppa(config) = backend_config(manifest, package, Backend::Ppa)? else {
        return Err(ProvisionError::not_configured(package, Backend::Ppa));
    };
    Ok(config)
}

fn repository<'a>(config: &'a PpaConfig, package: &str) -> Result<&'a str, ProvisionError> {
    let repository = config
        .repository
        .as_deref()
        .ok_or_else(|| ProvisionError::InvalidFormat {
            package: package.to_string(),
            reason: "ppa block has no 'repository'".to_string(),
        })?;
    if !repository.starts_with("ppa:") {
        return Err(ProvisionError::InvalidFormat {
            package: package.to_string(),
            reason: format!("repository '{repository}' must start with 'ppa:'"),
        });
    }
    Ok(repository)
}

/// The shell pipeline that fetches and installs a signing key.
fn gpg_import_command(package: &str, url: &str) -> (String, Vec<String>) {
    let pipeline = format!(
        "curl -fsSL {url} | sudo gpg --dearmor -o /etc/apt/trusted.gpg.d/{package}.gpg"
    );
    ("sh".to_string(), vec!["-c".to_string(), pipeline])
}

/// Whether the PPA already has an entry under the apt source lists.
///
/// grep exits non-zero when nothing matches; that read failure means "not
/// registered".
fn repository_registered(exec: &dyn Executor, repository: &str) -> bool {
    let slug = repository.trim_start_matches("ppa:");
    exec.read("grep", &["-r", "-l", slug, SOURCES_DIR])
        .map(|matches| !matches.trim().is_empty())
        .unwrap_or(false)
}

/// Register a PPA: import the GPG key if configured, add the repository,
/// refresh the package index. Re-adding an already-registered PPA is a
/// no-op.
pub fn add_repository(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    package: &str,
) -> Result<InstallOutcome> {
    let config = config(manifest, package)?;
    let repository = repository(config, package)?;

    if ctx.dry_run {
        return Ok(InstallOutcome::DryRun(repository_plan(config, package, repository)));
    }

    if repository_registered(ctx.exec, repository) {
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    if let Some(url) = &config.gpg_key {
        let (program, args) = gpg_import_command(package, url);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        if !ctx.exec.run(&program, &args)? {
            return Ok(InstallOutcome::Failed(format!(
                "GPG key import from {url} failed"
            )));
        }
    }

    if !ctx.exec.run("sudo", &["add-apt-repository", "-y", repository])? {
        return Ok(InstallOutcome::Failed(format!(
            "add-apt-repository {repository} returned non-zero"
        )));
    }

    if !ctx.exec.run("sudo", &["apt-get", "update"])? {
        return Ok(InstallOutcome::Failed(
            "apt-get update returned non-zero".to_string(),
        ));
    }

    Ok(InstallOutcome::Installed)
}

fn repository_plan(config: &PpaConfig, package: &str, repository: &str) -> String {
    let mut steps = Vec::new();
    if let Some(url) = &config.gpg_key {
        let (program, args) = gpg_import_command(package, url);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        steps.push(render_command(&program, &args));
    }
    steps.push(render_command("sudo", &["add-apt-repository", "-y", repository]));
    steps.push(render_command("sudo", &["apt-get", "update"]));
    steps.join("\n")
}

/// Full PPA install: repository registration followed by the apt install of
/// the PPA-supplied package name(s).
pub fn install_package(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    package: &str,
) -> Result<InstallOutcome> {
    let cfg = config(manifest, package)?;
    let names = cfg
        .names()
        .ok_or_else(|| ProvisionError::not_configured(package, Backend::Ppa))?;

    if ctx.dry_run {
        let repository = repository(cfg, package)?;
        let mut plan = repository_plan(cfg, package, repository);
        let mut args = vec!["apt-get", "install", "-y"];
        args.extend(names.iter().map(String::as_str));
        plan.push('\n');
        plan.push_str(&render_command("sudo", &args));
        return Ok(InstallOutcome::DryRun(plan));
    }

    ctx.cache.init(Backend::Ppa, ctx.exec)?;
    if names.iter().all(|name| ctx.cache.lookup(Backend::Ppa, name)) {
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    if let InstallOutcome::Failed(reason) = add_repository(ctx, manifest, package)? {
        return Ok(InstallOutcome::Failed(reason));
    }

    apt::install_debs(ctx, Backend::Ppa, &names)
}

/// PPA packages are removed through apt; the repository itself stays
/// registered.
pub fn uninstall(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    package: &str,
) -> Result<InstallOutcome> {
    let cfg = config(manifest, package)?;
    let names = cfg
        .names()
        .ok_or_else(|| ProvisionError::not_configured(package, Backend::Ppa))?;
    apt::remove_debs(ctx, Backend::Ppa, &names)
}
