//! Outcome types for installation runs.

/// What happened to a single package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The backend installed it.
    Installed,
    /// It was already present; nothing was done.
    AlreadyInstalled,
    /// The backend removed it (uninstall runs only).
    Removed,
    /// Dry-run mode: the description of the command(s) that would run.
    DryRun(String),
    /// The underlying package manager returned non-zero.
    Failed(String),
    /// Not applicable (e.g. no config block for this backend in a bulk run).
    Skipped(String),
}

/// Aggregate of one backend's bulk installation.
#[derive(Debug, Default, Clone)]
pub struct BulkSummary {
    pub count: usize,
    pub succeeded: usize,
    pub already_installed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<(String, InstallOutcome)>,
}

impl BulkSummary {
    pub fn record(&mut self, package: &str, outcome: InstallOutcome) {
        match &outcome {
            InstallOutcome::Installed | InstallOutcome::Removed | InstallOutcome::DryRun(_) => {
                self.succeeded += 1
            }
            InstallOutcome::AlreadyInstalled => self.already_installed += 1,
            InstallOutcome::Skipped(_) => self.skipped += 1,
            InstallOutcome::Failed(_) => self.failed += 1,
        }
        self.outcomes.push((package.to_string(), outcome));
    }
}

/// Aggregate of a whole orchestrator run.
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub already_installed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Dry-run command descriptions, in dispatch order.
    pub planned: Vec<String>,
    /// Per-package failure reasons, for selective retry.
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    pub fn record(&mut self, package: &str, outcome: &InstallOutcome) {
        match outcome {
            InstallOutcome::Installed | InstallOutcome::Removed => self.succeeded += 1,
            InstallOutcome::AlreadyInstalled => self.already_installed += 1,
            InstallOutcome::DryRun(plan) => {
                self.succeeded += 1;
                self.planned.push(plan.clone());
            }
            InstallOutcome::Skipped(_) => self.skipped += 1,
            InstallOutcome::Failed(reason) => {
                self.failed += 1;
                self.failures.push((package.to_string(), reason.clone()));
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_summary_counters() {
        let mut summary = BulkSummary::default();
        summary.record("git", InstallOutcome::Installed);
        summary.record("curl", InstallOutcome::AlreadyInstalled);
        summary.record("htop", InstallOutcome::Skipped("no config".into()));
        summary.record("broken", InstallOutcome::Failed("exit 100".into()));
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.already_installed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.outcomes.len(), 4);
    }

    #[test]
    fn test_run_summary_collects_failures_and_plans() {
        let mut summary = RunSummary::default();
        summary.record("git", &InstallOutcome::DryRun("sudo apt-get install -y git".into()));
        summary.record("bad", &InstallOutcome::Failed("exit 1".into()));
        assert_eq!(summary.planned.len(), 1);
        assert_eq!(summary.failures, vec![("bad".to_string(), "exit 1".to_string())]);
        assert!(!summary.is_success());
    }
}
