//! Verification runs and the verification log.
//!
//! The log is a structured YAML document (date, user, host, issue records)
//! that round-trips through [`log_missing_packages`] and
//! [`load_missing_packages`]. When structured serialization fails for any
//! reason the log falls back to the unit-separator line format rather than
//! writing nothing.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::backend::{self, Backend, BackendContext};
use crate::common::Platform;
use crate::error::ProvisionError;
use crate::manifest::{self, Manifest};

use super::issue::{VerificationIssue, VerifyStatus};

/// Candidates to offer per fuzzy match.
const ALTERNATIVE_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationLog {
    pub date: String,
    pub user: String,
    pub host: String,
    pub packages: Vec<VerificationIssue>,
}

impl VerificationLog {
    pub fn new(packages: Vec<VerificationIssue>) -> Self {
        Self {
            date: Utc::now().to_rfc3339(),
            user: env::var("USER").unwrap_or_else(|_| "unknown".to_string()),
            host: hostname(),
            packages,
        }
    }
}

fn hostname() -> String {
    env::var("HOSTNAME")
        .ok()
        .or_else(|| {
            fs::read_to_string("/etc/hostname")
                .ok()
                .map(|s| s.trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Cross-check a batch of packages against the installed state.
///
/// Per package: resolve the backend, resolve the native name(s), check the
/// cached installed set. Installed packages produce no issue; absent ones
/// are `MISSING`, or `FUZZY` when close candidates exist in the cache.
/// Packages that cannot be resolved at all are recorded as `MISSING`.
pub fn verify_packages_batch(
    ctx: &mut BackendContext,
    manifest: &Manifest,
    packages: &[String],
    platform: Platform,
) -> Result<Vec<VerificationIssue>> {
    let mut issues = Vec::new();

    for package in packages {
        let probe = |b: Backend| b.is_available(ctx.exec, platform);
        let Ok(chosen) = backend::resolve(manifest, package, platform, &probe) else {
            issues.push(VerificationIssue::missing_unresolved(package));
            continue;
        };
        let names = match manifest::native_names(manifest, package, chosen) {
            Ok(names) => names,
            Err(_) => {
                issues.push(VerificationIssue::missing(chosen, package.clone()));
                continue;
            }
        };

        ctx.cache.init(chosen, ctx.exec)?;
        for name in &names {
            if ctx.cache.lookup(chosen, name) {
                continue;
            }
            let alternatives = ctx.cache.find_similar(chosen, name, ALTERNATIVE_LIMIT);
            // Issues carry the manifest key, not the backend-native name:
            // retry looks packages up in the manifest again.
            let issue = if alternatives.is_empty() {
                VerificationIssue::missing(chosen, package.clone())
            } else {
                VerificationIssue::fuzzy(chosen, package.clone(), alternatives)
            };
            issues.push(issue.with_native_name(name));
        }
    }

    Ok(issues)
}

impl VerificationIssue {
    /// A package no backend could be resolved for; attributed to apt as the
    /// lowest common denominator so the record still names one backend.
    fn missing_unresolved(package: &str) -> Self {
        Self::missing(Backend::Apt, package)
    }
}

/// Persist the current issues.
///
/// Structured YAML is preferred; if serialization fails the unit-separator
/// fallback lines are written instead, never nothing.
pub fn log_missing_packages(path: &Path, issues: &[VerificationIssue]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log = VerificationLog::new(issues.to_vec());
    match serde_yaml::to_string(&log) {
        Ok(yaml) => fs::write(path, yaml)?,
        Err(_) => {
            let fallback: String = issues
                .iter()
                .map(|issue| issue.encode_record())
                .collect::<Vec<_>>()
                .join("\n");
            fs::write(path, fallback)?;
        }
    }
    Ok(())
}

/// Read back the packages recorded in a verification log, for a retry run.
pub fn load_missing_packages(path: &Path) -> Result<Vec<String>, ProvisionError> {
    if !path.exists() {
        return Err(ProvisionError::not_found(
            "verification log",
            path.display().to_string(),
        ));
    }
    let content = fs::read_to_string(path)?;

    if let Ok(log) = serde_yaml::from_str::<VerificationLog>(&content) {
        return Ok(log.packages.into_iter().map(|issue| issue.package).collect());
    }

    // Fallback line format.
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(VerificationIssue::decode_record)
        .map(|issue| issue.package)
        .collect())
}

/// Pretty-print issues for the `verify` command.
pub fn report_issues(issues: &[VerificationIssue]) {
    use colored::Colorize;
    for issue in issues {
        match issue.status {
            VerifyStatus::Missing => {
                println!("{} {} ({}): missing", "✗".red(), issue.package, issue.backend);
            }
            VerifyStatus::Fuzzy => {
                println!(
                    "{} {} ({}): not found, similar: {}",
                    "?".yellow(),
                    issue.package,
                    issue.backend,
                    issue.alternatives.join(", ")
                );
            }
            VerifyStatus::Installed => {}
        }
    }
}
