//! The mise adapter.
//!
//! mise distinguishes "listed in the tool registry" (a known installable
//! target) from "actually installed"; the cache mirrors that split. Tools
//! are pinned per package with `mise_version` and default to "latest".

use anyhow::Result;

use crate::common::exec::render_command;
use crate::error::ProvisionError;
use crate::install::outcome::InstallOutcome;
use crate::manifest::{backend_config, BackendConfig, Manifest};

use super::{Backend, BackendContext};

fn pinned_version<'a>(manifest: &'a Manifest, package: &str) -> Result<&'a str, ProvisionError> {
    match backend_config(manifest, package, Backend::Mise)? {
        BackendConfig::Mise { version } => Ok(version),
        _ => Err(ProvisionError::not_configured(package, Backend::Mise)),
    }
}

/// Whether the tool is a known installable target (not necessarily
/// installed). Requires an initialized cache.
pub fn in_registry(ctx: &BackendContext, tool: &str) -> bool {
    ctx.cache
        .find_similar(Backend::Mise, tool, 1)
        .first()
        .is_some_and(|candidate| candidate == tool)
}

pub fn install(ctx: &mut BackendContext, manifest: &Manifest, package: &str) -> Result<InstallOutcome> {
    let version = pinned_version(manifest, package)?;
    let spec = format!("{package}@{version}");
    let args = ["use", "--global", spec.as_str()];

    if ctx.dry_run {
        return Ok(InstallOutcome::DryRun(render_command("mise", &args)));
    }

    ctx.cache.init(Backend::Mise, ctx.exec)?;
    if ctx.cache.lookup(Backend::Mise, package) {
        return Ok(InstallOutcome::AlreadyInstalled);
    }
    if !in_registry(ctx, package) {
        return Ok(InstallOutcome::Failed(format!(
            "'{package}' is not in the mise registry"
        )));
    }

    if ctx.exec.run("mise", &args)? {
        ctx.cache.record_installed(Backend::Mise, package);
        Ok(InstallOutcome::Installed)
    } else {
        Ok(InstallOutcome::Failed(format!(
            "'{}' returned non-zero",
            render_command("mise", &args)
        )))
    }
}

pub fn uninstall(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    package: &str,
) -> Result<InstallOutcome> {
    let version = pinned_version(manifest, package)?;
    let spec = format!("{package}@{version}");
    let args = ["uninstall", spec.as_str()];

    if ctx.dry_run {
        return Ok(InstallOutcome::DryRun(render_command("mise", &args)));
    }

    ctx.cache.init(Backend::Mise, ctx.exec)?;
    if !ctx.cache.lookup(Backend::Mise, package) {
        return Ok(InstallOutcome::Skipped("not installed".to_string()));
    }

    if ctx.exec.run("mise", &args)? {
        Ok(InstallOutcome::Removed)
    } else {
        Ok(InstallOutcome::Failed(format!(
            "'{}' returned non-zero",
            render_command("mise", &args)
        )))
    }
}
