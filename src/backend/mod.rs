//! Package-manager backends.
//!
//! [`Backend`] is the single source of truth for supported package managers.
//! Each variant has an adapter module implementing the common contract:
//! resolve native names, check installed state (cached), install with
//! dry-run support. Dispatch is a match over the closed enum, so an
//! unsupported backend identifier can only show up as a manifest validation
//! error, never as a runtime fallthrough.

pub mod apt;
pub mod homebrew;
pub mod mise;
pub mod ppa;
pub mod resolve;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::cache::PackageCache;
use crate::common::{Executor, Platform};
use crate::error::ProvisionError;
use crate::install::outcome::{BulkSummary, InstallOutcome};
use crate::manifest::Manifest;

pub use resolve::resolve;

/// All supported package-manager backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Apt,
    Homebrew,
    Ppa,
    Mise,
}

impl Backend {
    pub const ALL: [Backend; 4] = [Backend::Apt, Backend::Homebrew, Backend::Ppa, Backend::Mise];

    /// The identifier used in manifest priority chains and config blocks.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Apt => "apt",
            Self::Homebrew => "homebrew",
            Self::Ppa => "ppa",
            Self::Mise => "mise",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Apt => "APT",
            Self::Homebrew => "Homebrew",
            Self::Ppa => "PPA",
            Self::Mise => "mise",
        }
    }

    /// The binary whose presence on PATH makes this backend usable.
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Homebrew => "brew",
            Self::Ppa => "add-apt-repository",
            Self::Mise => "mise",
        }
    }

    /// Whether the backend makes sense on the given platform at all.
    ///
    /// apt and PPAs are Debian-family only; Homebrew and mise work on both
    /// targets (Homebrew via Linuxbrew).
    pub fn supported_on(&self, platform: Platform) -> bool {
        match self {
            Self::Apt | Self::Ppa => platform == Platform::Ubuntu,
            Self::Homebrew | Self::Mise => true,
        }
    }

    /// Availability probe: platform fit plus binary presence.
    pub fn is_available(&self, exec: &dyn Executor, platform: Platform) -> bool {
        self.supported_on(platform) && exec.has_command(self.binary())
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apt" => Ok(Self::Apt),
            "homebrew" => Ok(Self::Homebrew),
            "ppa" => Ok(Self::Ppa),
            "mise" => Ok(Self::Mise),
            other => Err(format!("unsupported backend '{other}'")),
        }
    }
}

/// Shared state one backend operation needs: the subprocess boundary, the
/// run-scoped cache and the dry-run flag.
pub struct BackendContext<'a> {
    pub exec: &'a dyn Executor,
    pub cache: &'a mut PackageCache,
    pub dry_run: bool,
}

impl<'a> BackendContext<'a> {
    pub fn new(exec: &'a dyn Executor, cache: &'a mut PackageCache, dry_run: bool) -> Self {
        Self {
            exec,
            cache,
            dry_run,
        }
    }
}

/// Install one package through the given backend.
pub fn install(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    backend: Backend,
    package: &str,
) -> Result<InstallOutcome> {
    match backend {
        Backend::Apt => apt::install(ctx, manifest, package),
        Backend::Homebrew => homebrew::install(ctx, manifest, package),
        Backend::Ppa => ppa::install_package(ctx, manifest, package),
        Backend::Mise => mise::install(ctx, manifest, package),
    }
}

/// Remove one package through the given backend.
pub fn uninstall(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    backend: Backend,
    package: &str,
) -> Result<InstallOutcome> {
    match backend {
        Backend::Apt => apt::uninstall(ctx, manifest, package),
        Backend::Homebrew => homebrew::uninstall(ctx, manifest, package),
        Backend::Ppa => ppa::uninstall(ctx, manifest, package),
        Backend::Mise => mise::uninstall(ctx, manifest, package),
    }
}

/// Whether a backend-native name is currently installed, answered from the
/// run-scoped cache.
pub fn check_installed(
    ctx: &mut BackendContext,
    backend: Backend,
    native_name: &str,
) -> Result<bool> {
    ctx.cache.init(backend, ctx.exec)?;
    Ok(ctx.cache.lookup(backend, native_name))
}

/// Install a list of packages through one backend, skipping packages that
/// have no configuration for it instead of failing the whole batch.
pub fn install_bulk(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    backend: Backend,
    packages: &[String],
) -> Result<BulkSummary> {
    let mut summary = BulkSummary::default();
    for package in packages {
        summary.count += 1;
        let outcome = match crate::manifest::backend_config(manifest, package, backend) {
            Ok(_) => install(ctx, manifest, backend, package)?,
            Err(err @ ProvisionError::NotConfigured { .. }) => {
                InstallOutcome::Skipped(err.to_string())
            }
            Err(err) => return Err(err.into()),
        };
        summary.record(package, outcome);
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(backend.identifier().parse::<Backend>(), Ok(backend));
        }
    }

    #[test]
    fn test_snap_is_not_a_backend() {
        assert!("snap".parse::<Backend>().is_err());
    }

    #[test]
    fn test_platform_support() {
        assert!(Backend::Apt.supported_on(Platform::Ubuntu));
        assert!(!Backend::Apt.supported_on(Platform::Macos));
        assert!(!Backend::Ppa.supported_on(Platform::Macos));
        assert!(Backend::Homebrew.supported_on(Platform::Macos));
        assert!(Backend::Homebrew.supported_on(Platform::Ubuntu));
        assert!(Backend::Mise.supported_on(Platform::Ubuntu));
    }

    #[test]
    fn test_serde_uses_identifiers() {
        let yaml = serde_yaml::to_string(&Backend::Homebrew).unwrap();
        assert_eq!(yaml.trim(), "homebrew");
        let parsed: Backend = serde_yaml::from_str("mise").unwrap();
        assert_eq!(parsed, Backend::Mise);
    }
}
