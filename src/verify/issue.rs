//! Verification issue records.
//!
//! An issue is one mismatch between what the manifest expects and what the
//! system has. The canonical serialization is structured (one YAML record
//! in the verification log); the unit-separator line format survives as the
//! plain-text fallback. The field separator must be a character that can
//! never appear in a package or repository identifier, which rules out `:`
//! (`libc6:amd64`, `ppa:...`) and `|` (used to join alternatives); ASCII
//! Unit Separator is safe.

use serde::{Deserialize, Serialize};

use crate::backend::Backend;

/// Field separator of the fallback line encoding.
pub const UNIT_SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerifyStatus {
    Installed,
    Missing,
    Fuzzy,
}

impl VerifyStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "INSTALLED",
            Self::Missing => "MISSING",
            Self::Fuzzy => "FUZZY",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "INSTALLED" => Some(Self::Installed),
            "MISSING" => Some(Self::Missing),
            "FUZZY" => Some(Self::Fuzzy),
            _ => None,
        }
    }
}

/// One recorded manifest/system mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationIssue {
    pub backend: Backend,
    /// The package name as the manifest requests it. Retry runs match this
    /// against the manifest keys, so it is never a backend-native name.
    pub package: String,
    /// The backend-native name, when it differs from the manifest key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_name: Option<String>,
    pub status: VerifyStatus,
    /// Candidate names, best first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternatives: Vec<String>,
}

impl VerificationIssue {
    pub fn missing(backend: Backend, package: impl Into<String>) -> Self {
        Self {
            backend,
            package: package.into(),
            actual_name: None,
            status: VerifyStatus::Missing,
            alternatives: Vec::new(),
        }
    }

    pub fn fuzzy(backend: Backend, package: impl Into<String>, alternatives: Vec<String>) -> Self {
        Self {
            backend,
            package: package.into(),
            actual_name: None,
            status: VerifyStatus::Fuzzy,
            alternatives,
        }
    }

    /// Record the backend-native name the check actually ran against, when
    /// it is not simply the manifest key.
    pub fn with_native_name(mut self, native: &str) -> Self {
        if native != self.package {
            self.actual_name = Some(native.to_string());
        }
        self
    }

    /// Encode as a unit-separator line (fallback format).
    pub fn encode_record(&self) -> String {
        let alternatives = self.alternatives.join("|");
        let fields = [
            self.backend.identifier(),
            self.package.as_str(),
            self.actual_name.as_deref().unwrap_or(""),
            self.status.as_str(),
            alternatives.as_str(),
        ];
        fields.join(&UNIT_SEPARATOR.to_string())
    }

    /// Decode a unit-separator line. Returns `None` for malformed records.
    pub fn decode_record(line: &str) -> Option<Self> {
        let mut fields = line.split(UNIT_SEPARATOR);
        let backend = fields.next()?.parse::<Backend>().ok()?;
        let package = fields.next()?.to_string();
        let actual = fields.next()?;
        let status = VerifyStatus::parse(fields.next()?)?;
        let alternatives = fields.next()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            backend,
            package,
            actual_name: (!actual.is_empty()).then(|| actual.to_string()),
            status,
            alternatives: if alternatives.is_empty() {
                Vec::new()
            } else {
                alternatives.split('|').map(str::to_string).collect()
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_round_trip() {
        let issue = VerificationIssue::fuzzy(
            Backend::Apt,
            "python-requests",
            vec!["python3-requests".to_string(), "pypy-requests".to_string()],
        );
        let decoded = VerificationIssue::decode_record(&issue.encode_record()).unwrap();
        assert_eq!(decoded, issue);
    }

    #[test]
    fn test_colon_in_package_name_survives() {
        // Architecture-qualified deb names contain colons.
        let issue = VerificationIssue::missing(Backend::Apt, "libc6:amd64");
        let decoded = VerificationIssue::decode_record(&issue.encode_record()).unwrap();
        assert_eq!(decoded.package, "libc6:amd64");
        assert_eq!(decoded.status, VerifyStatus::Missing);
    }

    #[test]
    fn test_missing_has_no_actual_name() {
        let issue = VerificationIssue::missing(Backend::Mise, "ruby");
        let decoded = VerificationIssue::decode_record(&issue.encode_record()).unwrap();
        assert_eq!(decoded.actual_name, None);
        assert!(decoded.alternatives.is_empty());
    }

    #[test]
    fn test_malformed_record_is_rejected() {
        assert_eq!(VerificationIssue::decode_record("garbage"), None);
        assert_eq!(VerificationIssue::decode_record(""), None);
    }

    #[test]
    fn test_yaml_serialization_is_tagged() {
        let issue = VerificationIssue::missing(Backend::Homebrew, "fzf");
        let yaml = serde_yaml::to_string(&issue).unwrap();
        assert!(yaml.contains("backend: homebrew"));
        assert!(yaml.contains("status: MISSING"));
    }
}
