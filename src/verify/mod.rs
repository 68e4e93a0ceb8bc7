//! Post-install verification: reconcile manifest expectations against the
//! actually installed state and persist discrepancies for later retry.

pub mod issue;
pub mod report;

pub use issue::{VerificationIssue, VerifyStatus};
pub use report::{load_missing_packages, log_missing_packages, verify_packages_batch, VerificationLog};
