//! Run-scoped cache of backend package state.
//!
//! Listing installed packages costs a subprocess per call; within one run
//! the answer does not change behind our back (we are the only writer), so
//! each backend's installed set and search index are read exactly once.
//! The cache is owned by the run and passed by reference, never a global.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;

use crate::backend::Backend;
use crate::common::Executor;

#[derive(Debug, Default)]
struct BackendCache {
    initialized: bool,
    installed: BTreeSet<String>,
    /// Candidate names for fuzzy lookups. The installed set for apt and
    /// Homebrew; the tool registry for mise, where "known" and "installed"
    /// are different things.
    search_index: Vec<String>,
}

/// Per-backend memo of installed packages and searchable names.
#[derive(Debug, Default)]
pub struct PackageCache {
    entries: HashMap<Backend, BackendCache>,
}

impl PackageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the cache for a backend by running its list commands.
    /// Idempotent: a second call is a no-op.
    pub fn init(&mut self, backend: Backend, exec: &dyn Executor) -> Result<()> {
        let entry = self.entries.entry(backend).or_default();
        if entry.initialized {
            return Ok(());
        }

        match backend {
            // apt and PPA both install debs; they share the dpkg database.
            Backend::Apt | Backend::Ppa => {
                let output = exec.read("dpkg-query", &["-W", "-f=${Package}\n"])?;
                entry.installed = output.lines().map(str::to_string).collect();
                entry.search_index = entry.installed.iter().cloned().collect();
            }
            Backend::Homebrew => {
                let formulae = exec.read("brew", &["list", "-1", "--formula"])?;
                entry.installed = formulae.lines().map(str::to_string).collect();
                // No casks on Linuxbrew; an error here just means none.
                if let Ok(casks) = exec.read("brew", &["list", "-1", "--cask"]) {
                    entry.installed.extend(casks.lines().map(str::to_string));
                }
                entry.search_index = entry.installed.iter().cloned().collect();
            }
            Backend::Mise => {
                let installed = exec.read("mise", &["ls", "--installed"])?;
                entry.installed = installed
                    .lines()
                    .filter_map(|line| line.split_whitespace().next())
                    .map(str::to_string)
                    .collect();
                let registry = exec.read("mise", &["registry"])?;
                entry.search_index = registry
                    .lines()
                    .filter_map(|line| line.split_whitespace().next())
                    .map(str::to_string)
                    .collect();
            }
        }

        entry.initialized = true;
        Ok(())
    }

    pub fn is_initialized(&self, backend: Backend) -> bool {
        self.entries
            .get(&backend)
            .is_some_and(|entry| entry.initialized)
    }

    /// Membership test against the cached installed set. Never spawns a
    /// subprocess.
    pub fn lookup(&self, backend: Backend, name: &str) -> bool {
        self.entries
            .get(&backend)
            .is_some_and(|entry| entry.installed.contains(name))
    }

    /// Record a name we just installed so later lookups in the same run see it.
    pub fn record_installed(&mut self, backend: Backend, name: &str) {
        let entry = self.entries.entry(backend).or_default();
        entry.installed.insert(name.to_string());
    }

    /// Fuzzy search over the cached index: exact matches first, then known
    /// name-normalization variants, then prefix matches, then substring
    /// matches. Never spawns a subprocess.
    pub fn find_similar(&self, backend: Backend, query: &str, limit: usize) -> Vec<String> {
        let Some(entry) = self.entries.get(&backend) else {
            return Vec::new();
        };

        let mut results: Vec<String> = Vec::new();
        let mut push = |candidate: &str, results: &mut Vec<String>| {
            if results.len() < limit && !results.iter().any(|r| r == candidate) {
                results.push(candidate.to_string());
            }
        };

        for name in &entry.search_index {
            if name == query {
                push(name, &mut results);
            }
        }
        for variant in normalize_variants(query) {
            for name in &entry.search_index {
                if *name == variant {
                    push(name, &mut results);
                }
            }
        }
        for name in &entry.search_index {
            if name.starts_with(query) {
                push(name, &mut results);
            }
        }
        for name in &entry.search_index {
            if name.contains(query) {
                push(name, &mut results);
            }
        }

        results
    }

    /// Drop every backend's cache and initialized flag.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}

/// Known-equivalent name spellings, e.g. the Debian `python-` to `python3-`
/// rename.
fn normalize_variants(query: &str) -> Vec<String> {
    let mut variants = Vec::new();
    if let Some(rest) = query.strip_prefix("python-") {
        variants.push(format!("python3-{rest}"));
    }
    if let Some(rest) = query.strip_prefix("python3-") {
        variants.push(format!("python-{rest}"));
    }
    variants
}
