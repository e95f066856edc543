//! Shared test infrastructure for integration tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tempfile::TempDir;

/// Captured outcome of one `cmdflow` run.
#[derive(Debug)]
pub struct RunOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    #[allow(dead_code)]
    pub elapsed_secs: f64,
}

impl RunOutput {
    /// Parse stdout as a single JSON document.
    #[allow(dead_code)]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout.trim())
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }

    /// Parse stdout as a stream of JSON documents, one per dispatched command.
    #[allow(dead_code)]
    pub fn json_stream(&self) -> Vec<serde_json::Value> {
        serde_json::Deserializer::from_str(&self.stdout)
            .into_iter::<serde_json::Value>()
            .map(|doc| doc.unwrap_or_else(|err| panic!("bad JSON ({err}): {}", self.stdout)))
            .collect()
    }
}

/// Isolated workspace with its own config file, so a developer's
/// `$CMDFLOW_CONFIG` or user config never leaks into a test.
pub struct Sandbox {
    pub dir: TempDir,
    pub config: PathBuf,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let config = dir.path().join("config.json");
        std::fs::write(&config, "{\"schema_version\": 1}\n").expect("write config");
        Self { dir, config }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Run `cmdflow --config <sandbox config> <args>` with optional stdin.
    pub fn run(&self, args: &[&str], stdin: Option<&str>) -> RunOutput {
        let start = Instant::now();
        let mut child = Command::new(env!("CARGO_BIN_EXE_cmdflow"))
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .env_remove("CMDFLOW_CONFIG")
            .env_remove("CMDFLOW_LOG")
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn cmdflow");
        if let Some(input) = stdin {
            child
                .stdin
                .take()
                .expect("stdin pipe")
                .write_all(input.as_bytes())
                .expect("write stdin");
        }
        let output = child.wait_with_output().expect("wait for cmdflow");
        RunOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        }
    }
}
