//! Backend resolution.
//!
//! Walks a package's priority chain and picks the first backend that is
//! configured for the package and available on the target platform.
//! Resolution is deterministic: same manifest, platform and availability
//! answers always give the same backend.

use crate::common::Platform;
use crate::error::ProvisionError;
use crate::manifest::{priority_for_package, Manifest};

use super::Backend;

/// Availability probe, injectable so dry runs and tests can decouple
/// resolution from the current host.
pub type AvailabilityProbe<'a> = &'a dyn Fn(Backend) -> bool;

/// Pick the backend to use for a package on a platform.
///
/// Skips chain entries the package has no configuration for, entries not
/// supported on the platform, and entries the probe reports unavailable.
/// An exhausted chain is an `UnresolvableError`.
pub fn resolve(
    manifest: &Manifest,
    package_name: &str,
    platform: Platform,
    available: AvailabilityProbe,
) -> Result<Backend, ProvisionError> {
    let chain = priority_for_package(manifest, package_name)?;
    let package = manifest
        .packages
        .get(package_name)
        .ok_or_else(|| ProvisionError::not_found("package", package_name))?;

    for &backend in &chain {
        if !package.has_backend(backend) {
            continue;
        }
        if !backend.supported_on(platform) {
            continue;
        }
        if !available(backend) {
            continue;
        }
        return Ok(backend);
    }

    Err(ProvisionError::Unresolvable {
        package: package_name.to_string(),
        chain,
    })
}

#[cfg(test)]
pub(crate) mod tests_support {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use anyhow::{bail, Result};

    use crate::common::exec::{render_command, Executor};

    /// Executor double: canned stdout per command prefix, recorded effect
    /// commands, optional forced run failure.
    #[derive(Default)]
    pub(crate) struct FakeExec {
        present: Vec<String>,
        reads: HashMap<String, String>,
        fail: bool,
        commands: RefCell<Vec<String>>,
    }

    impl FakeExec {
        /// Canned `read` outputs keyed by command prefix, e.g.
        /// `("dpkg-query", "git\n")` or `("mise registry", "ruby\n")`.
        /// Programs appearing in the keys also count as present on PATH.
        pub fn with_installed(outputs: &[(&str, &str)]) -> Self {
            Self {
                reads: outputs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                ..Self::default()
            }
        }

        /// Make every subsequent `run` report a non-zero exit.
        pub fn fail_runs(&mut self) {
            self.fail = true;
        }

        /// Mark additional programs as present on PATH.
        pub fn mark_available(&mut self, programs: &[&str]) {
            self.present.extend(programs.iter().map(|p| p.to_string()));
        }

        /// Rendered command lines passed to `run` and `read`, in order.
        pub fn commands(&self) -> Vec<String> {
            self.commands.borrow().clone()
        }
    }

    impl Executor for FakeExec {
        fn has_command(&self, program: &str) -> bool {
            self.present.iter().any(|p| p == program)
                || self
                    .reads
                    .keys()
                    .any(|k| k == program || k.starts_with(&format!("{program} ")))
        }

        fn run(&self, program: &str, args: &[&str]) -> Result<bool> {
            self.commands
                .borrow_mut()
                .push(render_command(program, args));
            Ok(!self.fail)
        }

        fn read(&self, program: &str, args: &[&str]) -> Result<String> {
            let rendered = render_command(program, args);
            self.commands.borrow_mut().push(rendered.clone());
            let best = self
                .reads
                .iter()
                .filter(|(key, _)| rendered.starts_with(key.as_str()))
                .max_by_key(|(key, _)| key.len());
            match best {
                Some((_, output)) => Ok(output.clone()),
                None => bail!("no canned output for '{rendered}'"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        serde_yaml::from_str(
            r#"
version: "1.0"
categories:
  general_tools:
    description: Tools
    priority: [apt, homebrew]
packages:
  git:
    category: general_tools
    description: Version control
    apt:
      package: git
    homebrew:
      package: git
  curl:
    category: general_tools
    description: URL transfer tool
    apt:
      package: curl
  ruby:
    category: general_tools
    description: Ruby runtime
    managed_by: mise
"#,
        )
        .unwrap()
    }

    fn all(_: Backend) -> bool {
        true
    }

    #[test]
    fn test_first_available_backend_wins() {
        let backend = resolve(&manifest(), "git", Platform::Ubuntu, &all).unwrap();
        assert_eq!(backend, Backend::Apt);
    }

    #[test]
    fn test_falls_through_when_apt_unavailable() {
        let no_apt = |backend: Backend| backend != Backend::Apt;
        let backend = resolve(&manifest(), "git", Platform::Ubuntu, &no_apt).unwrap();
        assert_eq!(backend, Backend::Homebrew);
    }

    #[test]
    fn test_macos_skips_apt_entirely() {
        let backend = resolve(&manifest(), "git", Platform::Macos, &all).unwrap();
        assert_eq!(backend, Backend::Homebrew);
    }

    #[test]
    fn test_never_returns_unconfigured_backend() {
        // curl has no homebrew block; with apt unavailable the chain is
        // exhausted rather than falling through to homebrew.
        let no_apt = |backend: Backend| backend != Backend::Apt;
        let err = resolve(&manifest(), "curl", Platform::Ubuntu, &no_apt).unwrap_err();
        assert!(matches!(err, ProvisionError::Unresolvable { .. }));
    }

    #[test]
    fn test_managed_by_resolves_to_mise() {
        let backend = resolve(&manifest(), "ruby", Platform::Ubuntu, &all).unwrap();
        assert_eq!(backend, Backend::Mise);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let m = manifest();
        for _ in 0..3 {
            assert_eq!(
                resolve(&m, "git", Platform::Ubuntu, &all).unwrap(),
                Backend::Apt
            );
        }
    }

    #[test]
    fn test_unknown_package_is_not_found() {
        let err = resolve(&manifest(), "nope", Platform::Ubuntu, &all).unwrap_err();
        assert!(matches!(err, ProvisionError::NotFound { .. }));
    }
}
