//! serde types for manifest documents.
//!
//! Fields that the schema requires are still `Option` here: a missing
//! `description` or `priority` should come back from [`crate::manifest::validate`]
//! as a named violation, not die inside serde as an opaque parse error.
//! Backend identifiers and platform names are plain strings at this level
//! for the same reason.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::backend::Backend;

/// A fully parsed (but not yet validated) manifest document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ManifestVersion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub categories: BTreeMap<String, Category>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub packages: BTreeMap<String, Package>,
    /// Shorthand tool list, expanded into full mise-managed packages by
    /// [`crate::manifest::query::expand_mise_tools`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mise: Option<MiseTools>,
}

/// `version: "1.2"` and `version: 1.2` are both accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManifestVersion {
    Text(String),
    Number(f64),
}

/// An installation target: either an explicit package list or a set of
/// included/excluded categories. Never both, schema-enforced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<BTreeSet<String>>,
}

/// A package grouping carrying the default backend priority chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Package {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Overrides the category's default backend chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Vec<String>>,
    /// Restricts applicability; absence means all platforms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<BTreeSet<String>>,
    /// Shortcut for `priority: [<backend>]` without a config block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apt: Option<AptConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homebrew: Option<HomebrewConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppa: Option<PpaConfig>,
    /// Version pin for mise-managed packages; defaults to "latest".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mise_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AptConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomebrewConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
    #[serde(default)]
    pub cask: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PpaConfig {
    /// Must start with the literal prefix `ppa:`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpg_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiseTools {
    /// tool name -> pinned version ("latest" for unpinned).
    #[serde(default)]
    pub tools: BTreeMap<String, String>,
}

impl Package {
    /// Whether this package carries any configuration for the given backend.
    ///
    /// `managed_by` counts: a `managed_by: mise` package is configured for
    /// mise even without a `mise_version` field.
    pub fn has_backend(&self, backend: Backend) -> bool {
        let block = match backend {
            Backend::Apt => self.apt.is_some(),
            Backend::Homebrew => self.homebrew.is_some(),
            Backend::Ppa => self.ppa.is_some(),
            Backend::Mise => self.mise_version.is_some(),
        };
        block || self.managed_by.as_deref() == Some(backend.identifier())
    }

    /// Whether the package applies to the given platform.
    pub fn applies_to(&self, platform: crate::common::Platform) -> bool {
        match &self.platforms {
            None => true,
            Some(platforms) => platforms.contains(platform.identifier()),
        }
    }
}

fn names_from(package: &Option<String>, packages: &Option<Vec<String>>) -> Option<Vec<String>> {
    if let Some(list) = packages {
        if !list.is_empty() {
            return Some(list.clone());
        }
    }
    package.as_ref().map(|p| vec![p.clone()])
}

impl AptConfig {
    pub fn names(&self) -> Option<Vec<String>> {
        names_from(&self.package, &self.packages)
    }
}

impl HomebrewConfig {
    pub fn names(&self) -> Option<Vec<String>> {
        names_from(&self.package, &self.packages)
    }
}

impl PpaConfig {
    pub fn names(&self) -> Option<Vec<String>> {
        names_from(&self.package, &self.packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let doc = r#"
version: "1.0"
profiles:
  minimal:
    description: Bare essentials
    packages: [git, curl]
categories:
  general_tools:
    description: Everyday tools
    priority: [apt, homebrew]
packages:
  git:
    category: general_tools
    description: Version control
    apt:
      package: git
"#;
        let manifest: Manifest = serde_yaml::from_str(doc).unwrap();
        assert_eq!(
            manifest.version,
            Some(ManifestVersion::Text("1.0".to_string()))
        );
        assert!(manifest.profiles.contains_key("minimal"));
        assert!(manifest.packages["git"].apt.is_some());
    }

    #[test]
    fn test_numeric_version() {
        let manifest: Manifest = serde_yaml::from_str("version: 2\n").unwrap();
        assert_eq!(manifest.version, Some(ManifestVersion::Number(2.0)));
    }

    #[test]
    fn test_has_backend_via_managed_by() {
        let doc = "category: languages\ndescription: Ruby\nmanaged_by: mise\n";
        let package: Package = serde_yaml::from_str(doc).unwrap();
        assert!(package.has_backend(Backend::Mise));
        assert!(!package.has_backend(Backend::Apt));
    }

    #[test]
    fn test_names_prefers_plural_form() {
        let config = AptConfig {
            package: Some("single".to_string()),
            packages: Some(vec!["a".to_string(), "b".to_string()]),
        };
        assert_eq!(
            config.names(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
    }
}
