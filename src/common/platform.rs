//! Target platform detection.
//!
//! The manifest set covers two platforms: Ubuntu (and Debian-family
//! derivatives, which all speak apt) and macOS. Detection reads
//! `/etc/os-release` on Linux the same way a shell script would, but parses
//! it into a typed value once.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A platform the manifest set can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ubuntu,
    Macos,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// Returns `None` on systems that are neither macOS nor Debian-family
    /// Linux; callers are expected to surface that as an explicit error
    /// rather than guessing.
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") {
            return Some(Self::Macos);
        }

        let os_release = Path::new("/etc/os-release");
        if !os_release.exists() {
            return None;
        }

        fs::read_to_string(os_release)
            .ok()
            .and_then(|content| Self::parse_os_release(&content))
    }

    /// Parse an os-release body into a platform.
    fn parse_os_release(content: &str) -> Option<Self> {
        let mut id = String::new();
        let mut id_like = String::new();

        for line in content.lines() {
            if let Some(val) = line.strip_prefix("ID=") {
                id = val.trim_matches('"').to_string();
            } else if let Some(val) = line.strip_prefix("ID_LIKE=") {
                id_like = val.trim_matches('"').to_string();
            }
        }

        match id.as_str() {
            "ubuntu" | "debian" => Some(Self::Ubuntu),
            // Derivatives (Pop!_OS, Mint, ...) report their parent here
            _ if id_like.contains("ubuntu") || id_like.contains("debian") => Some(Self::Ubuntu),
            _ => None,
        }
    }

    /// The identifier used in manifest `platforms` lists and on the CLI.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Ubuntu => "ubuntu",
            Self::Macos => "macos",
        }
    }

    pub const ALL: [Platform; 2] = [Platform::Ubuntu, Platform::Macos];
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ubuntu" => Ok(Self::Ubuntu),
            "macos" => Ok(Self::Macos),
            other => Err(format!(
                "unknown platform '{other}' (expected 'ubuntu' or 'macos')"
            )),
        }
    }
}
