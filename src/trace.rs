//! Pipeline trace records and the optional `--save` sink.
use crate::command::Params;
use crate::error::DispatchError;
use crate::phase::PhaseResults;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Extension every trace file must carry.
pub const TRACE_EXTENSION: &str = "json";

/// Everything a successful dispatch produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineTrace {
    pub command: String,
    pub params: Params,
    pub phase_results: PhaseResults,
    pub result: Value,
    /// Epoch milliseconds.
    pub timestamp: u64,
}

/// A save target must be absolute and end in `.json`.
pub fn validate_save_path(path: &Path) -> Result<(), DispatchError> {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TRACE_EXTENSION));
    if path.is_absolute() && has_extension && path.file_name().is_some() {
        return Ok(());
    }
    Err(DispatchError::invalid_with(
        "save",
        &path.display().to_string(),
        format!("an absolute path ending in .{TRACE_EXTENSION}"),
    ))
}

/// Write the trace as pretty JSON, replacing any existing file atomically.
pub fn write_trace(path: &Path, trace: &PipelineTrace) -> Result<(), DispatchError> {
    let failure = |reason: String| DispatchError::PersistenceFailure {
        path: path.to_path_buf(),
        reason,
    };
    let json = serde_json::to_string_pretty(trace)
        .map_err(|err| failure(format!("serialize trace: {err}")))?;
    let parent = path
        .parent()
        .ok_or_else(|| failure("path has no parent directory".to_string()))?;
    fs::create_dir_all(parent)
        .map_err(|err| failure(format!("create {}: {err}", parent.display())))?;

    let mut staged = tempfile::NamedTempFile::new_in(parent)
        .map_err(|err| failure(format!("stage trace: {err}")))?;
    staged
        .write_all(json.as_bytes())
        .and_then(|()| staged.write_all(b"\n"))
        .map_err(|err| failure(format!("write staged trace: {err}")))?;
    staged
        .persist(path)
        .map_err(|err| failure(format!("publish trace: {}", err.error)))?;

    tracing::info!(path = %path.display(), command = %trace.command, "wrote trace");
    Ok(())
}
