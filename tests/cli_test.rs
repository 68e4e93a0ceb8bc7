mod common;

use anyhow::Result;
use common::{run_dotprov, TestEnvironment};

const BASIC_MANIFEST: &str = r#"
version: "1.2"

profiles:
  minimal:
    description: Bare essentials
    packages: [git, curl]
  empty:
    description: Nothing at all
    packages: []

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
    homebrew:
      package: git
  curl:
    category: general_tools
    description: URL transfer tool
    apt:
      package: curl
    homebrew:
      package: curl
"#;

const PPA_MANIFEST: &str = r#"
version: "1.2"

profiles:
  editors:
    description: Editor setup
    packages: [neovim]

categories:
  editors:
    description: Editors
    priority: [ppa, apt]

packages:
  neovim:
    category: editors
    description: Neovim from the upstream PPA
    platforms: [ubuntu]
    ppa:
      repository: "ppa:neovim-ppa/unstable"
      package: neovim
      gpg_key: "https://example.com/neovim.asc"
"#;

const INVALID_MANIFEST: &str = r#"
version: "1.2"

categories:
  general_tools:
    description: Everyday tools
    priority: [snap]
"#;

#[test]
fn test_schema_accepts_valid_manifest() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("common.yaml", BASIC_MANIFEST)?;

    let output = run_dotprov(&["--platform", "ubuntu", "schema", &manifest])?;
    assert_eq!(output.exit_code, 0, "schema failed: {}", output.stderr);
    assert!(output.stdout.contains("validation passed"));
    Ok(())
}

#[test]
fn test_schema_rejects_unknown_backend_in_priority() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("bad.yaml", INVALID_MANIFEST)?;

    let output = run_dotprov(&["--platform", "ubuntu", "schema", &manifest])?;
    assert_ne!(output.exit_code, 0);
    assert!(
        output.stderr.contains("snap"),
        "expected the offending backend id in: {}",
        output.stderr
    );
    Ok(())
}

#[test]
fn test_install_dry_run_plans_apt_commands() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("common.yaml", BASIC_MANIFEST)?;

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "ubuntu",
        "install",
        "minimal",
        "--dry-run",
    ])?;
    assert_eq!(output.exit_code, 0, "install failed: {}", output.stderr);
    assert!(output.stdout.contains("git"));
    assert!(output.stdout.contains("curl"));
    assert!(output.stdout.contains("apt-get install"));
    assert!(output.stdout.contains("2 package(s)"));
    Ok(())
}

#[test]
fn test_install_unknown_profile_fails() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("common.yaml", BASIC_MANIFEST)?;

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "ubuntu",
        "install",
        "workstation",
        "--dry-run",
    ])?;
    assert_ne!(output.exit_code, 0);
    assert!(output.stderr.contains("workstation"));
    Ok(())
}

#[test]
fn test_install_empty_profile_succeeds() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("common.yaml", BASIC_MANIFEST)?;

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "ubuntu",
        "install",
        "empty",
        "--dry-run",
    ])?;
    assert_eq!(output.exit_code, 0, "install failed: {}", output.stderr);
    assert!(output.stdout.contains("0 package(s)"));
    Ok(())
}

#[test]
fn test_ppa_dry_run_plans_repository_setup() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("common.yaml", PPA_MANIFEST)?;

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "ubuntu",
        "install",
        "editors",
        "--dry-run",
    ])?;
    assert_eq!(output.exit_code, 0, "install failed: {}", output.stderr);
    assert!(output.stdout.contains("add-apt-repository"));
    assert!(output.stdout.contains("gpg"));
    assert!(output.stdout.contains("https://example.com/neovim.asc"));
    assert!(output.stdout.contains("ppa:neovim-ppa/unstable"));
    Ok(())
}

#[test]
fn test_uninstall_dry_run_plans_removal() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("common.yaml", BASIC_MANIFEST)?;

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "ubuntu",
        "uninstall",
        "minimal",
        "--dry-run",
    ])?;
    assert_eq!(output.exit_code, 0, "uninstall failed: {}", output.stderr);
    assert!(output.stdout.contains("apt-get remove"));
    Ok(())
}

#[test]
fn test_retry_dry_run_reads_verification_log() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("common.yaml", BASIC_MANIFEST)?;

    let log_path = env.path().join("missing_packages.yaml");
    std::fs::write(
        &log_path,
        r#"date: "2026-08-29T10:00:00+00:00"
user: tester
host: testhost
packages:
- backend: apt
  package: git
  status: MISSING
"#,
    )?;

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "ubuntu",
        "retry",
        "--log",
        log_path.to_str().unwrap(),
        "--dry-run",
    ])?;
    assert_eq!(output.exit_code, 0, "retry failed: {}", output.stderr);
    assert!(output.stdout.contains("git"));
    assert!(output.stdout.contains("apt-get install"));
    Ok(())
}

#[test]
fn test_retry_continues_past_unresolvable_package() -> Result<()> {
    let env = TestEnvironment::new()?;
    // lonely only has a homebrew block but sits on an apt-only chain, so it
    // can never resolve; git must still be processed after it.
    let manifest = env.write_manifest(
        "common.yaml",
        r#"
version: "1.2"
profiles:
  minimal:
    description: Bare essentials
    packages: [git, lonely]
categories:
  general_tools:
    description: Everyday tools
    priority: [apt]
packages:
  git:
    category: general_tools
    description: Version control
    apt:
      package: git
  lonely:
    category: general_tools
    description: Homebrew-only entry
    homebrew:
      package: lonely
"#,
    )?;

    let log_path = env.path().join("missing_packages.yaml");
    std::fs::write(
        &log_path,
        r#"date: "2026-08-29T10:00:00+00:00"
user: tester
host: testhost
packages:
- backend: apt
  package: lonely
  status: MISSING
- backend: apt
  package: git
  status: MISSING
"#,
    )?;

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "ubuntu",
        "retry",
        "--log",
        log_path.to_str().unwrap(),
        "--dry-run",
    ])?;
    // The unresolvable package fails the run but not the batch.
    assert_ne!(output.exit_code, 0);
    assert!(output.stdout.contains("apt-get install -y git"));
    assert!(output.stderr.contains("lonely"));
    Ok(())
}

#[test]
fn test_retry_without_log_reports_missing_file() -> Result<()> {
    let env = TestEnvironment::new()?;
    let manifest = env.write_manifest("common.yaml", BASIC_MANIFEST)?;
    let log_path = env.path().join("nonexistent.yaml");

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "ubuntu",
        "retry",
        "--log",
        log_path.to_str().unwrap(),
        "--dry-run",
    ])?;
    assert_ne!(output.exit_code, 0);
    assert!(output.stderr.contains("verification log"));
    Ok(())
}

#[test]
fn test_verify_exits_nonzero_when_issues_found() -> Result<()> {
    let env = TestEnvironment::new()?;
    // An apt-only package cannot resolve on macos, so verification records
    // it as missing without touching any package manager.
    let manifest = env.write_manifest(
        "common.yaml",
        r#"
version: "1.2"
profiles:
  minimal:
    description: Bare essentials
    packages: [git]
categories:
  general_tools:
    description: Everyday tools
    priority: [apt]
packages:
  git:
    category: general_tools
    description: Version control
    apt:
      package: git
"#,
    )?;
    let log_path = env.path().join("missing_packages.yaml");

    let output = run_dotprov(&[
        "--manifest",
        &manifest,
        "--platform",
        "macos",
        "verify",
        "minimal",
        "--log",
        log_path.to_str().unwrap(),
    ])?;
    assert_ne!(output.exit_code, 0);
    assert!(output.stdout.contains("1 issue(s) logged"));
    assert!(log_path.exists());
    Ok(())
}

#[test]
fn test_later_manifest_document_wins() -> Result<()> {
    let env = TestEnvironment::new()?;
    let common = env.write_manifest("common.yaml", BASIC_MANIFEST)?;
    // Override git to carry a different apt name.
    let overlay = env.write_manifest(
        "overlay.yaml",
        r#"
version: "1.2"
packages:
  git:
    category: general_tools
    description: Version control, pinned build
    apt:
      package: git-custom
"#,
    )?;

    let output = run_dotprov(&[
        "--manifest",
        &common,
        "--manifest",
        &overlay,
        "--platform",
        "ubuntu",
        "install",
        "minimal",
        "--dry-run",
    ])?;
    assert_eq!(output.exit_code, 0, "install failed: {}", output.stderr);
    assert!(output.stdout.contains("git-custom"));
    Ok(())
}
