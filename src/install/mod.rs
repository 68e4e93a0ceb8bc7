//! The installation orchestrator and its outcome types.

pub mod orchestrator;
pub mod outcome;

pub use orchestrator::{
    install_from_manifest, load_validated_manifest, report_outcome, report_summary,
    uninstall_from_manifest,
};
pub use outcome::{BulkSummary, InstallOutcome, RunSummary};
