use super::{success, unhandled};
use crate::error::DispatchError;
use crate::phase::{ExecutionContext, PhaseOutcome, Workflow};
use serde_json::{json, Value};

const COMMANDS: &[&str] = &["message:new", "message:send"];

/// Compose messages to agents; `send` hands them to the `message/send` utility.
pub struct MessageWorkflow;

impl Workflow for MessageWorkflow {
    fn category(&self) -> &str {
        "message"
    }

    fn supported_commands(&self) -> &[&'static str] {
        COMMANDS
    }

    fn run_workflow(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        let content = ctx
            .params
            .non_blank("message")
            .map(str::to_string)
            .or_else(|| {
                let words = ctx.params.positionals.join(" ");
                (!words.trim().is_empty()).then(|| words.trim().to_string())
            })
            .ok_or_else(|| {
                DispatchError::missing("message", "pass --message <text> or the text as positional words")
            })?;
        let to = ctx
            .params
            .non_blank("to")
            .map(str::to_string)
            .unwrap_or_else(|| ctx.settings.active_agent.clone());
        let message = json!({"content": content, "to": to});

        let action = match ctx.action() {
            "new" => "created",
            "send" => "sent",
            other => return Err(unhandled("message", other, COMMANDS)),
        };
        ctx.result = Some(success(action, json!({"message": message})));
        Ok(json!({"status": "completed", "handler": ctx.action()}))
    }

    fn run_validation(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        let message = ctx.result_field("message").cloned().unwrap_or(Value::Null);
        ctx.require_rules(&["message"], &message)
    }

    fn run_output(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        if ctx.action() != "send" {
            return Ok(crate::phase::completed());
        }
        let field = |name: &str| {
            ctx.result_field("message")
                .and_then(|message| message.get(name))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let args = vec![field("to"), field("content")];
        let output = ctx.services.utilities.invoke("message", "send", &args);
        if !output.success {
            return Err(DispatchError::UtilityExecutionFailure {
                utility: "message/send".to_string(),
                reason: output.error.unwrap_or_else(|| "no error reported".to_string()),
            });
        }
        if let Some(Value::Object(result)) = ctx.result.as_mut() {
            result.insert("delivery".to_string(), output.payload());
        }
        Ok(json!({"status": "completed", "utility": "message/send"}))
    }
}
