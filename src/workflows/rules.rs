use super::{success, unhandled};
use crate::error::DispatchError;
use crate::phase::{ExecutionContext, PhaseOutcome, Workflow};
use serde_json::{json, Value};

const COMMANDS: &[&str] = &["rules:list", "rules:check"];

/// List loaded rule-sets and check ad-hoc data against them.
pub struct RulesWorkflow;

impl Workflow for RulesWorkflow {
    fn category(&self) -> &str {
        "rules"
    }

    fn supported_commands(&self) -> &[&'static str] {
        COMMANDS
    }

    fn run_workflow(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        let result = match ctx.action() {
            "list" => success("listed", json!({"rule_sets": ctx.services.rules.names()})),
            "check" => {
                let sets: Vec<String> = ctx
                    .params
                    .text("sets")
                    .unwrap_or_default()
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                if sets.is_empty() {
                    return Err(DispatchError::missing(
                        "sets",
                        "at least one comma-separated rule-set name",
                    ));
                }
                let raw = ctx
                    .params
                    .non_blank("data")
                    .ok_or_else(|| DispatchError::missing("data", "a JSON object to check"))?;
                let data: Value = serde_json::from_str(raw)
                    .ok()
                    .filter(Value::is_object)
                    .ok_or_else(|| DispatchError::invalid_with("data", raw, "a JSON object"))?;
                success("checked", json!({"valid": true, "sets": sets, "data": data}))
            }
            other => return Err(unhandled("rules", other, COMMANDS)),
        };
        ctx.result = Some(result);
        Ok(json!({"status": "completed", "handler": ctx.action()}))
    }

    fn run_validation(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        if ctx.action() != "check" {
            return Ok(crate::phase::completed());
        }
        let sets: Vec<String> = ctx
            .result_field("sets")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let names: Vec<&str> = sets.iter().map(String::as_str).collect();
        let data = ctx.result_field("data").cloned().unwrap_or(Value::Null);
        ctx.require_rules(&names, &data)
    }
}
