//! dotprov: manifest-driven provisioning of development tools.
//!
//! A declarative YAML manifest set (one common document plus per-platform
//! overrides) describes packages, categories and installation profiles.
//! The engine resolves a profile to a package list, picks a backend per
//! package along a priority chain (apt, Homebrew, PPA, mise), and
//! dispatches installs with dry-run and idempotence guarantees.

pub mod backend;
pub mod cache;
pub mod common;
pub mod error;
pub mod install;
pub mod manifest;
pub mod verify;
