//! The apt adapter.
//!
//! Installed state comes from the dpkg database (`dpkg-query`), cached for
//! the run. Installs go through `sudo apt-get install -y`; already-installed
//! packages are a no-op, not an error.

use anyhow::Result;

use crate::common::exec::render_command;
use crate::install::outcome::InstallOutcome;
use crate::manifest::{native_names, Manifest};

use super::{Backend, BackendContext};

pub fn install(ctx: &mut BackendContext, manifest: &Manifest, package: &str) -> Result<InstallOutcome> {
    let names = native_names(manifest, package, Backend::Apt)?;
    install_debs(ctx, Backend::Apt, &names)
}

pub fn uninstall(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    package: &str,
) -> Result<InstallOutcome> {
    let names = native_names(manifest, package, Backend::Apt)?;
    remove_debs(ctx, Backend::Apt, &names)
}

/// Install deb packages, shared with the PPA adapter (both end in apt-get
/// against the same dpkg database).
pub(crate) fn install_debs(
    ctx: &mut BackendContext,
    backend: Backend,
    names: &[String],
) -> Result<InstallOutcome> {
    let args = apt_get_args("install", names);

    if ctx.dry_run {
        return Ok(InstallOutcome::DryRun(render_command("sudo", &args)));
    }

    ctx.cache.init(backend, ctx.exec)?;
    let pending: Vec<&String> = names
        .iter()
        .filter(|name| !ctx.cache.lookup(backend, name))
        .collect();
    if pending.is_empty() {
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    if ctx.exec.run("sudo", &args)? {
        for name in names {
            ctx.cache.record_installed(backend, name);
        }
        Ok(InstallOutcome::Installed)
    } else {
        Ok(InstallOutcome::Failed(format!(
            "'{}' returned non-zero",
            render_command("sudo", &args)
        )))
    }
}

pub(crate) fn remove_debs(
    ctx: &mut BackendContext,
    backend: Backend,
    names: &[String],
) -> Result<InstallOutcome> {
    let args = apt_get_args("remove", names);

    if ctx.dry_run {
        return Ok(InstallOutcome::DryRun(render_command("sudo", &args)));
    }

    ctx.cache.init(backend, ctx.exec)?;
    if names.iter().all(|name| !ctx.cache.lookup(backend, name)) {
        return Ok(InstallOutcome::Skipped("not installed".to_string()));
    }

    if ctx.exec.run("sudo", &args)? {
        Ok(InstallOutcome::Removed)
    } else {
        Ok(InstallOutcome::Failed(format!(
            "'{}' returned non-zero",
            render_command("sudo", &args)
        )))
    }
}

fn apt_get_args<'a>(action: &'a str, names: &'a [String]) -> Vec<&'a str> {
    let mut args = vec!["apt-get", action, "-y"];
    args.extend(names.iter().map(String::as_str));
    args
}
