use super::{success, unhandled};
use crate::error::DispatchError;
use crate::phase::{ExecutionContext, PhaseOutcome, Workflow};
use crate::session::{OutputFormat, SettingsUpdate, Verbosity};
use serde_json::json;

const COMMANDS: &[&str] = &[
    "output:verbosity",
    "output:format",
    "output:reset",
    "output:settings",
];

/// Session verbosity and output format.
pub struct OutputWorkflow;

impl Workflow for OutputWorkflow {
    fn category(&self) -> &str {
        "output"
    }

    fn supported_commands(&self) -> &[&'static str] {
        COMMANDS
    }

    fn run_workflow(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        let result = match ctx.action() {
            "verbosity" => {
                let raw = ctx.params.text_or_positional("level").ok_or_else(|| {
                    DispatchError::missing(
                        "level",
                        format!("expected one of: {}", Verbosity::NAMES.join(", ")),
                    )
                })?;
                let level = Verbosity::parse_param("level", raw)?;
                let previous = ctx.settings.verbosity;
                ctx.settings.set(SettingsUpdate {
                    verbosity: Some(level),
                    ..SettingsUpdate::default()
                });
                success(
                    "verbosity-set",
                    json!({"previous": previous, "verbosity": level}),
                )
            }
            "format" => {
                let raw = ctx.params.text_or_positional("format").ok_or_else(|| {
                    DispatchError::missing(
                        "format",
                        format!("expected one of: {}", OutputFormat::NAMES.join(", ")),
                    )
                })?;
                let format = OutputFormat::parse_param("format", raw)?;
                let previous = ctx.settings.format;
                ctx.settings.set(SettingsUpdate {
                    format: Some(format),
                    ..SettingsUpdate::default()
                });
                success("format-set", json!({"previous": previous, "format": format}))
            }
            "reset" => {
                ctx.settings.reset();
                success("reset", json!({"settings": ctx.settings}))
            }
            "settings" => success("settings", json!({"settings": ctx.settings})),
            other => return Err(unhandled("output", other, COMMANDS)),
        };
        ctx.result = Some(result);
        Ok(json!({"status": "completed", "handler": ctx.action()}))
    }
}
