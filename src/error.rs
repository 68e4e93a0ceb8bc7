//! Crate-wide error type.
//!
//! Errors that halt a run (bad manifest, unknown profile) are distinct
//! variants so callers can match on them; per-package installation faults
//! are not errors but [`InstallOutcome`](crate::install::InstallOutcome)
//! records, since one failing package must not abort the batch.

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::Backend;
use crate::manifest::Violation;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("could not parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("manifest validation failed:{}", render_violations(.0))]
    Validation(Vec<Violation>),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("package '{package}' has no {backend} configuration")]
    NotConfigured { package: String, backend: Backend },

    #[error("package '{package}': {reason}")]
    InvalidFormat { package: String, reason: String },

    #[error("no installable backend for '{package}'{}", render_chain(.chain))]
    Unresolvable { package: String, chain: Vec<Backend> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProvisionError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn not_configured(package: impl Into<String>, backend: Backend) -> Self {
        Self::NotConfigured {
            package: package.into(),
            backend,
        }
    }
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|violation| format!("\n  {violation}"))
        .collect()
}

fn render_chain(chain: &[Backend]) -> String {
    if chain.is_empty() {
        return String::new();
    }
    let tried: Vec<&str> = chain.iter().map(Backend::identifier).collect();
    format!(" (tried {})", tried.join(", "))
}
