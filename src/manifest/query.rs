//! Typed queries over a merged manifest.

use std::collections::BTreeSet;

use crate::backend::Backend;
use crate::common::Platform;
use crate::error::ProvisionError;

use super::schema::{AptConfig, Category, HomebrewConfig, Manifest, Package, PpaConfig};

/// The backend-specific configuration of one package.
#[derive(Debug, Clone, Copy)]
pub enum BackendConfig<'a> {
    Apt(&'a AptConfig),
    Homebrew(&'a HomebrewConfig),
    Ppa(&'a PpaConfig),
    Mise { version: &'a str },
}

/// Resolve a profile into the concrete set of package names that apply to
/// the given platform.
///
/// Explicit `packages` lists are returned as written. `includes` profiles
/// expand to every package in the included categories, minus packages whose
/// `platforms` field excludes this platform, minus packages belonging to
/// `excludes` categories. An empty category yields an empty contribution,
/// not an error.
pub fn packages_for_profile(
    manifest: &Manifest,
    profile_name: &str,
    platform: Platform,
) -> Result<BTreeSet<String>, ProvisionError> {
    let profile = manifest
        .profiles
        .get(profile_name)
        .ok_or_else(|| ProvisionError::not_found("profile", profile_name))?;

    if let Some(packages) = &profile.packages {
        return Ok(packages.clone());
    }

    let includes = profile.includes.clone().unwrap_or_default();
    let excludes = profile.excludes.clone().unwrap_or_default();

    let mut selected = BTreeSet::new();
    for (name, package) in &manifest.packages {
        let Some(category) = &package.category else {
            continue;
        };
        if !includes.contains(category) || excludes.contains(category) {
            continue;
        }
        if !package.applies_to(platform) {
            continue;
        }
        selected.insert(name.clone());
    }
    Ok(selected)
}

/// The ordered backend chain for a package: package-level `priority` if
/// present, else a single-element chain from `managed_by`, else the
/// category default.
pub fn priority_for_package(
    manifest: &Manifest,
    package_name: &str,
) -> Result<Vec<Backend>, ProvisionError> {
    let package = lookup_package(manifest, package_name)?;

    if let Some(priority) = &package.priority {
        return parse_chain(package_name, priority);
    }

    // managed_by is a shorthand for priority: [<backend>].
    if let Some(managed_by) = &package.managed_by {
        return parse_chain(package_name, std::slice::from_ref(managed_by));
    }

    if let Some(category) = package
        .category
        .as_ref()
        .and_then(|c| manifest.categories.get(c))
        && let Some(priority) = category_priority(category)
    {
        return parse_chain(package_name, priority);
    }

    Err(ProvisionError::Unresolvable {
        package: package_name.to_string(),
        chain: Vec::new(),
    })
}

fn category_priority(category: &Category) -> Option<&[String]> {
    category
        .priority
        .as_deref()
        .filter(|priority| !priority.is_empty())
}

fn parse_chain(package_name: &str, chain: &[String]) -> Result<Vec<Backend>, ProvisionError> {
    chain
        .iter()
        .map(|identifier| {
            identifier
                .parse::<Backend>()
                .map_err(|_| ProvisionError::InvalidFormat {
                    package: package_name.to_string(),
                    reason: format!("unsupported backend '{identifier}' in priority chain"),
                })
        })
        .collect()
}

/// The backend-specific config block of a package.
///
/// `managed_by: mise` without a `mise_version` yields a mise config pinned
/// to "latest".
pub fn backend_config<'a>(
    manifest: &'a Manifest,
    package_name: &str,
    backend: Backend,
) -> Result<BackendConfig<'a>, ProvisionError> {
    let package = lookup_package(manifest, package_name)?;
    let config = match backend {
        Backend::Apt => package.apt.as_ref().map(BackendConfig::Apt),
        Backend::Homebrew => package.homebrew.as_ref().map(BackendConfig::Homebrew),
        Backend::Ppa => package.ppa.as_ref().map(BackendConfig::Ppa),
        Backend::Mise => {
            if package.has_backend(Backend::Mise) {
                Some(BackendConfig::Mise {
                    version: package.mise_version.as_deref().unwrap_or("latest"),
                })
            } else {
                None
            }
        }
    };
    config.ok_or_else(|| ProvisionError::not_configured(package_name, backend))
}

/// The backend-native identifier(s) to install for a package.
///
/// For mise the native name is the package name itself; the other backends
/// take `package`/`packages` from their config block.
pub fn native_names(
    manifest: &Manifest,
    package_name: &str,
    backend: Backend,
) -> Result<Vec<String>, ProvisionError> {
    let names = match backend_config(manifest, package_name, backend)? {
        BackendConfig::Apt(config) => config.names(),
        BackendConfig::Homebrew(config) => config.names(),
        BackendConfig::Ppa(config) => config.names(),
        BackendConfig::Mise { .. } => Some(vec![package_name.to_string()]),
    };
    names.ok_or_else(|| ProvisionError::not_configured(package_name, backend))
}

/// Name of the category synthesized for shorthand mise tools.
pub const MISE_TOOLS_CATEGORY: &str = "mise_tools";

/// Expand the shorthand `mise: {tools: ...}` block into full mise-managed
/// package entries.
///
/// An explicit package entry with the same name wins over the shorthand.
/// The synthesized `mise_tools` category is added when absent so the
/// expanded entries validate like hand-written ones.
pub fn expand_mise_tools(manifest: &mut Manifest) {
    let Some(mise) = manifest.mise.take() else {
        return;
    };
    if mise.tools.is_empty() {
        return;
    }

    manifest
        .categories
        .entry(MISE_TOOLS_CATEGORY.to_string())
        .or_insert_with(|| Category {
            description: Some("Tools managed by mise".to_string()),
            priority: Some(vec![Backend::Mise.identifier().to_string()]),
        });

    for (tool, version) in mise.tools {
        manifest.packages.entry(tool.clone()).or_insert_with(|| Package {
            category: Some(MISE_TOOLS_CATEGORY.to_string()),
            description: Some(format!("{tool} (mise tool)")),
            managed_by: Some(Backend::Mise.identifier().to_string()),
            mise_version: Some(version),
            ..Package::default()
        });
    }
}

fn lookup_package<'a>(
    manifest: &'a Manifest,
    package_name: &str,
) -> Result<&'a Package, ProvisionError> {
    manifest
        .packages
        .get(package_name)
        .ok_or_else(|| ProvisionError::not_found("package", package_name))
}
