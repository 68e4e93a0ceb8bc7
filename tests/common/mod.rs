use anyhow::Result;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Scratch directory holding manifest documents fed to the binary under
/// test. Dropped (and deleted) at the end of each test.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a manifest document and return its path as a CLI argument.
    pub fn write_manifest(&self, name: &str, body: &str) -> Result<String> {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, body)?;
        Ok(path.to_string_lossy().into_owned())
    }
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run the compiled binary with the given arguments and capture its output.
pub fn run_dotprov(args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_dotprov"))
        .args(args)
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
