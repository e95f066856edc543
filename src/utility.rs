//! External utility invocation.
//!
//! Utilities are executables addressed by category and name. A utility is
//! looked up as `<utilities_dir>/<category>/<name>` first, then as
//! `cmdflow-<category>-<name>` on `PATH`. Invocation never returns `Err`;
//! failures come back as a non-success [`UtilityOutput`] for the calling
//! workflow to turn into an error.
use serde::Serialize;
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilityOutput {
    pub success: bool,
    pub stdout: String,
    /// Parsed stdout when the utility printed JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UtilityOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        let stdout = stdout.into();
        let data = serde_json::from_str(stdout.trim()).ok();
        Self {
            success: true,
            stdout,
            data,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            data: None,
            error: Some(error.into()),
        }
    }

    /// JSON payload if the utility printed one, else trimmed stdout.
    pub fn payload(&self) -> Value {
        self.data
            .clone()
            .unwrap_or_else(|| Value::String(self.stdout.trim().to_string()))
    }
}

pub trait UtilityInvoker {
    fn invoke(&self, category: &str, name: &str, args: &[String]) -> UtilityOutput;
}

/// Runs utilities as child processes and waits for them to exit.
#[derive(Debug, Clone, Default)]
pub struct ProcessInvoker {
    root: Option<PathBuf>,
}

impl ProcessInvoker {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, category: &str, name: &str) -> Option<PathBuf> {
        if !is_single_component(category) || !is_single_component(name) {
            return None;
        }
        if let Some(root) = &self.root {
            let candidate = root.join(category).join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        which::which(format!("cmdflow-{category}-{name}")).ok()
    }
}

impl UtilityInvoker for ProcessInvoker {
    fn invoke(&self, category: &str, name: &str, args: &[String]) -> UtilityOutput {
        let utility = format!("{category}/{name}");
        let Some(program) = self.resolve(category, name) else {
            return UtilityOutput::failed(format!("utility {utility} not found"));
        };

        let start = Instant::now();
        let output = match Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                return UtilityOutput::failed(format!("spawn {}: {err}", program.display()));
            }
        };
        let elapsed_ms = start.elapsed().as_millis();

        tracing::info!(
            utility = %utility,
            elapsed_ms,
            success = output.status.success(),
            stdout_bytes = output.stdout.len(),
            "utility invoke complete"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return UtilityOutput::failed(format!(
                "exited with status {}: {}",
                output.status,
                stderr.trim()
            ));
        }
        UtilityOutput::ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

fn is_single_component(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
