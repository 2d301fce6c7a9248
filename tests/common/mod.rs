// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Output of one logmerge invocation
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// A scratch directory that logmerge runs inside, so the default
/// `config.ini` and `res.txt` resolve there
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Write `config.ini` from `label = path` pairs plus optional raw lines
    pub fn write_config(&self, sources: &[(&str, &str)], extra: &str) {
        let mut content = String::new();
        for (label, file) in sources {
            content.push_str(&format!("{} = {}\n", label, self.file(file).display()));
        }
        content.push_str(extra);
        self.write("config.ini", content);
    }

    pub fn read_output(&self) -> String {
        self.read("res.txt")
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.file(name)).expect("Failed to read output file")
    }

    /// Run the logmerge binary with `args` from inside this workspace
    pub fn run(&self, args: &[&str]) -> RunOutput {
        let output = Command::new(env!("CARGO_BIN_EXE_logmerge"))
            .args(args)
            .current_dir(self.path())
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .expect("Failed to execute logmerge");

        RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }
}
