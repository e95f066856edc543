use super::{success, unhandled};
use crate::error::DispatchError;
use crate::phase::{ExecutionContext, PhaseOutcome, Workflow};
use serde_json::{json, Value};

const COMMANDS: &[&str] = &["utility:run"];

/// Run a named external utility.
///
/// The invocation is planned in the `workflow` phase, checked in `validation`,
/// and only executed in `output`, so a rejected plan never spawns anything.
pub struct UtilityWorkflow;

impl Workflow for UtilityWorkflow {
    fn category(&self) -> &str {
        "utility"
    }

    fn supported_commands(&self) -> &[&'static str] {
        COMMANDS
    }

    fn run_workflow(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        if ctx.action() != "run" {
            return Err(unhandled("utility", ctx.action(), COMMANDS));
        }
        let category = ctx
            .params
            .non_blank("category")
            .ok_or_else(|| DispatchError::missing("category", "name the utility's category"))?;
        let name = ctx
            .params
            .non_blank("name")
            .ok_or_else(|| DispatchError::missing("name", "name the utility to run"))?;
        let plan = json!({
            "category": category,
            "name": name,
            "args": ctx.params.positionals,
        });
        ctx.result = Some(success("ran", json!({"utility": plan})));
        Ok(json!({"status": "completed", "handler": "run"}))
    }

    fn run_validation(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        let plan = ctx.result_field("utility").cloned().unwrap_or(Value::Null);
        ctx.require_rules(&["utility"], &plan)
    }

    fn run_output(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        let plan = ctx.result_field("utility").cloned().unwrap_or(Value::Null);
        let category = plan["category"].as_str().unwrap_or_default();
        let name = plan["name"].as_str().unwrap_or_default();
        let args: Vec<String> = ctx.params.positionals.clone();
        let utility = format!("{category}/{name}");

        let output = ctx.services.utilities.invoke(category, name, &args);
        if !output.success {
            return Err(DispatchError::UtilityExecutionFailure {
                utility,
                reason: output.error.unwrap_or_else(|| "no error reported".to_string()),
            });
        }
        if let Some(Value::Object(result)) = ctx.result.as_mut() {
            result.insert("output".to_string(), output.payload());
        }
        Ok(json!({"status": "completed", "utility": utility}))
    }
}
