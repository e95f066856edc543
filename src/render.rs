//! Rendering dispatch outcomes for the terminal.
//!
//! Results render in the session's output format. Verbosity adds pipeline
//! detail: `medium` lists the phases that ran, `high` includes their outputs.
use crate::error::DispatchError;
use crate::phase::phase_results_value;
use crate::session::{OutputFormat, SessionSettings, Verbosity};
use crate::trace::PipelineTrace;
use anyhow::{Context, Result};
use serde_json::{json, Value};

pub fn render_success(trace: &PipelineTrace, settings: &SessionSettings, force_json: bool) -> Result<String> {
    let format = if force_json {
        OutputFormat::Json
    } else {
        settings.format
    };
    let phases: Vec<&str> = trace.phase_results.keys().map(|phase| phase.as_str()).collect();

    let rendered = match format {
        OutputFormat::Json => {
            let value = match settings.verbosity {
                Verbosity::High => json!({
                    "result": trace.result,
                    "phase_results": phase_results_value(&trace.phase_results),
                }),
                Verbosity::Medium => json!({"result": trace.result, "phases": phases}),
                Verbosity::Low | Verbosity::Off => trace.result.clone(),
            };
            serde_json::to_string_pretty(&value).context("serialize result")?
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (key, value) in flatten(&trace.result) {
                out.push_str(&format!("{key}: {value}\n"));
            }
            push_pipeline_detail(&mut out, trace, settings.verbosity, &phases, "")?;
            out.trim_end().to_string()
        }
        OutputFormat::Markdown => {
            let action = trace.result["action"].as_str().unwrap_or("result");
            let mut out = format!("## {} ({action})\n\n", trace.command);
            for (key, value) in flatten(&trace.result) {
                out.push_str(&format!("- **{key}**: {value}\n"));
            }
            push_pipeline_detail(&mut out, trace, settings.verbosity, &phases, "### ")?;
            out.trim_end().to_string()
        }
    };
    Ok(rendered)
}

fn push_pipeline_detail(
    out: &mut String,
    trace: &PipelineTrace,
    verbosity: Verbosity,
    phases: &[&str],
    heading: &str,
) -> Result<()> {
    match verbosity {
        Verbosity::Medium => {
            out.push_str(&format!("\n{heading}phases: {}\n", phases.join(" -> ")));
        }
        Verbosity::High => {
            let detail = serde_json::to_string_pretty(&phase_results_value(&trace.phase_results))
                .context("serialize phase results")?;
            out.push_str(&format!("\n{heading}phase results:\n{detail}\n"));
        }
        Verbosity::Low | Verbosity::Off => {}
    }
    Ok(())
}

pub fn render_error(err: &DispatchError, force_json: bool) -> String {
    if force_json {
        let envelope = json!({"success": false, "error": err.to_string(), "kind": err.kind()});
        return envelope.to_string();
    }
    format!("error: {err}")
}

/// Dotted `key: value` pairs; scalars print bare, strings unquoted.
fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    flatten_into("", value, &mut pairs);
    pairs
}

fn flatten_into(prefix: &str, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(&path, child, pairs);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(&format!("{prefix}[{index}]"), child, pairs);
            }
        }
        Value::String(text) => pairs.push((prefix.to_string(), text.clone())),
        other => pairs.push((prefix.to_string(), other.to_string())),
    }
}
