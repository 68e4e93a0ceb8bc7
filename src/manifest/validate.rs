//! Manifest invariant checks.
//!
//! Validation collects every violation instead of stopping at the first,
//! so a manifest author gets the whole list in one pass. An empty list
//! means the manifest is valid.

use std::fmt;
use std::path::Path;

use crate::backend::Backend;
use crate::common::Platform;
use crate::error::ProvisionError;

use super::query::expand_mise_tools;
use super::schema::{Manifest, Package};

/// One schema violation, tied to the field that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path to the offending field, e.g. `packages.neovim.ppa.repository`.
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every invariant of the manifest schema.
///
/// Callable on a single raw document as well as on a merged set; reference
/// checks (package -> category, profile includes -> category) are only
/// meaningful after merging.
pub fn validate(manifest: &Manifest) -> Vec<Violation> {
    let mut violations = Vec::new();

    if manifest.version.is_none() {
        violations.push(Violation::new("version", "required field is missing"));
    }

    for (name, profile) in &manifest.profiles {
        let field = format!("profiles.{name}");
        if profile.description.is_none() {
            violations.push(Violation::new(
                format!("{field}.description"),
                "required field is missing",
            ));
        }
        match (&profile.packages, &profile.includes) {
            (Some(_), Some(_)) => violations.push(Violation::new(
                &field,
                "'packages' and 'includes' are mutually exclusive",
            )),
            (None, None) => violations.push(Violation::new(
                &field,
                "profile needs either 'packages' or 'includes'",
            )),
            _ => {}
        }
        if profile.excludes.is_some() && profile.includes.is_none() {
            violations.push(Violation::new(
                format!("{field}.excludes"),
                "'excludes' requires 'includes'",
            ));
        }
        for categories in [&profile.includes, &profile.excludes].into_iter().flatten() {
            for category in categories {
                if !manifest.categories.contains_key(category) {
                    violations.push(Violation::new(
                        &field,
                        format!("references unknown category '{category}'"),
                    ));
                }
            }
        }
    }

    for (name, category) in &manifest.categories {
        let field = format!("categories.{name}");
        if category.description.is_none() {
            violations.push(Violation::new(
                format!("{field}.description"),
                "required field is missing",
            ));
        }
        match &category.priority {
            None => violations.push(Violation::new(
                format!("{field}.priority"),
                "required field is missing",
            )),
            Some(priority) if priority.is_empty() => violations.push(Violation::new(
                format!("{field}.priority"),
                "priority chain must not be empty",
            )),
            Some(priority) => {
                check_backend_identifiers(&mut violations, &format!("{field}.priority"), priority);
            }
        }
    }

    for (name, package) in &manifest.packages {
        validate_package(&mut violations, manifest, name, package);
    }

    violations
}

fn validate_package(
    violations: &mut Vec<Violation>,
    manifest: &Manifest,
    name: &str,
    package: &Package,
) {
    let field = format!("packages.{name}");

    match &package.category {
        None => violations.push(Violation::new(
            format!("{field}.category"),
            "required field is missing",
        )),
        Some(category) if !manifest.categories.contains_key(category) => {
            violations.push(Violation::new(
                format!("{field}.category"),
                format!("references unknown category '{category}'"),
            ));
        }
        _ => {}
    }

    if package.description.is_none() {
        violations.push(Violation::new(
            format!("{field}.description"),
            "required field is missing",
        ));
    }

    if let Some(priority) = &package.priority {
        check_backend_identifiers(violations, &format!("{field}.priority"), priority);
    }

    if let Some(managed_by) = &package.managed_by
        && managed_by.parse::<Backend>().is_err()
    {
        violations.push(Violation::new(
            format!("{field}.managed_by"),
            format!("unsupported backend '{managed_by}'"),
        ));
    }

    if let Some(platforms) = &package.platforms {
        for platform in platforms {
            if platform.parse::<Platform>().is_err() {
                violations.push(Violation::new(
                    format!("{field}.platforms"),
                    format!("invalid platform '{platform}'"),
                ));
            }
        }
    }

    if let Some(ppa) = &package.ppa {
        match &ppa.repository {
            None => violations.push(Violation::new(
                format!("{field}.ppa.repository"),
                "required field is missing",
            )),
            Some(repository) if !repository.starts_with("ppa:") => {
                violations.push(Violation::new(
                    format!("{field}.ppa.repository"),
                    format!("'{repository}' must start with 'ppa:'"),
                ));
            }
            _ => {}
        }
    }

    // Each config block needs at least one installable name.
    if let Some(apt) = &package.apt
        && apt.names().is_none()
    {
        violations.push(Violation::new(
            format!("{field}.apt"),
            "needs 'package' or 'packages'",
        ));
    }
    if let Some(homebrew) = &package.homebrew
        && homebrew.names().is_none()
    {
        violations.push(Violation::new(
            format!("{field}.homebrew"),
            "needs 'package' or 'packages'",
        ));
    }
    if let Some(ppa) = &package.ppa
        && ppa.names().is_none()
    {
        violations.push(Violation::new(
            format!("{field}.ppa"),
            "needs 'package' or 'packages'",
        ));
    }
}

fn check_backend_identifiers(violations: &mut Vec<Violation>, field: &str, priority: &[String]) {
    for identifier in priority {
        if identifier.parse::<Backend>().is_err() {
            violations.push(Violation::new(
                field,
                format!("unsupported backend '{identifier}'"),
            ));
        }
    }
}

/// Load, merge and validate a manifest document set.
///
/// This is the entry point behind the `schema` CLI command; shell callers
/// grep its output for "validation passed".
pub fn validate_manifest_schema<P: AsRef<Path>>(paths: &[P]) -> Result<Manifest, ProvisionError> {
    let mut manifest = super::merge::load_and_merge(paths)?;
    expand_mise_tools(&mut manifest);
    let violations = validate(&manifest);
    if violations.is_empty() {
        Ok(manifest)
    } else {
        Err(ProvisionError::Validation(violations))
    }
}
