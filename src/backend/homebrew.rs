//! The Homebrew adapter.
//!
//! Handles both formulae and casks (`cask: true` in the config block).
//! Installed state comes from `brew list -1`, cached for the run.

use anyhow::Result;

use crate::common::exec::render_command;
use crate::error::ProvisionError;
use crate::install::outcome::InstallOutcome;
use crate::manifest::{backend_config, BackendConfig, Manifest};

use super::{Backend, BackendContext};

struct BrewRequest {
    names: Vec<String>,
    cask: bool,
}

fn request(manifest: &Manifest, package: &str) -> Result<BrewRequest, ProvisionError> {
    let BackendConfig::Homebrew(config) = backend_config(manifest, package, Backend::Homebrew)?
    else {
        return Err(ProvisionError::not_configured(package, Backend::Homebrew));
    };
    let names = config
        .names()
        .ok_or_else(|| ProvisionError::not_configured(package, Backend::Homebrew))?;
    Ok(BrewRequest {
        names,
        cask: config.cask,
    })
}

fn brew_args<'a>(action: &'a str, req: &'a BrewRequest) -> Vec<&'a str> {
    let mut args = vec![action];
    if req.cask {
        args.push("--cask");
    }
    args.extend(req.names.iter().map(String::as_str));
    args
}

pub fn install(ctx: &mut BackendContext, manifest: &Manifest, package: &str) -> Result<InstallOutcome> {
    let req = request(manifest, package)?;
    let args = brew_args("install", &req);

    if ctx.dry_run {
        return Ok(InstallOutcome::DryRun(render_command("brew", &args)));
    }

    ctx.cache.init(Backend::Homebrew, ctx.exec)?;
    if req
        .names
        .iter()
        .all(|name| ctx.cache.lookup(Backend::Homebrew, name))
    {
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    if ctx.exec.run("brew", &args)? {
        for name in &req.names {
            ctx.cache.record_installed(Backend::Homebrew, name);
        }
        Ok(InstallOutcome::Installed)
    } else {
        Ok(InstallOutcome::Failed(format!(
            "'{}' returned non-zero",
            render_command("brew", &args)
        )))
    }
}

pub fn uninstall(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    package: &str,
) -> Result<InstallOutcome> {
    let req = request(manifest, package)?;
    let args = brew_args("uninstall", &req);

    if ctx.dry_run {
        return Ok(InstallOutcome::DryRun(render_command("brew", &args)));
    }

    ctx.cache.init(Backend::Homebrew, ctx.exec)?;
    if req
        .names
        .iter()
        .all(|name| !ctx.cache.lookup(Backend::Homebrew, name))
    {
        return Ok(InstallOutcome::Skipped("not installed".to_string()));
    }

    if ctx.exec.run("brew", &args)? {
        Ok(InstallOutcome::Removed)
    } else {
        Ok(InstallOutcome::Failed(format!(
            "'{}' returned non-zero",
            render_command("brew", &args)
        )))
    }
}
