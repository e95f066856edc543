use super::{success, unhandled};
use crate::error::DispatchError;
use crate::phase::{ExecutionContext, PhaseOutcome, Workflow};
use serde_json::json;

const COMMANDS: &[&str] = &["meta:context", "meta:status", "meta:commands"];

/// Global context annotations and engine introspection.
pub struct MetaWorkflow;

impl MetaWorkflow {
    fn context(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        let chosen: Vec<&str> = ["add", "list", "clear"]
            .into_iter()
            .filter(|name| ctx.params.contains(name))
            .collect();
        if chosen.len() != 1 {
            return Err(DispatchError::missing(
                "add",
                "meta:context takes exactly one of --add <text>, --list, --clear",
            ));
        }

        let result = match chosen[0] {
            "add" => {
                let content = ctx
                    .params
                    .non_blank("add")
                    .map(str::to_string)
                    .ok_or_else(|| DispatchError::missing("add", "context text must not be empty"))?;
                ctx.require_rules(&["context"], &json!({"content": content}))?;
                let entry = ctx.context_store.add(ctx.command.as_str(), &content)?.clone();
                success("context-added", json!({"entry": entry, "count": ctx.context_store.len()}))
            }
            "list" => {
                let entries = ctx.global_context().to_vec();
                success(
                    "context-listed",
                    json!({"count": entries.len(), "entries": entries}),
                )
            }
            _ => {
                let cleared = ctx.context_store.clear();
                success("context-cleared", json!({"cleared": cleared}))
            }
        };
        ctx.result = Some(result);
        Ok(json!({"status": "completed", "handler": "context"}))
    }
}

impl Workflow for MetaWorkflow {
    fn category(&self) -> &str {
        "meta"
    }

    fn supported_commands(&self) -> &[&'static str] {
        COMMANDS
    }

    /// Context visible to this command, including earlier commands' notes.
    fn run_parameters(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        Ok(json!({
            "status": "completed",
            "visible_context_entries": ctx.global_context().len(),
        }))
    }

    fn run_workflow(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        match ctx.action() {
            "context" => self.context(ctx),
            "status" => {
                let categories: Vec<&String> = ctx.catalog.keys().collect();
                ctx.result = Some(success(
                    "status",
                    json!({
                        "settings": ctx.settings,
                        "context_entries": ctx.context_store.len(),
                        "categories": categories,
                    }),
                ));
                Ok(json!({"status": "completed", "handler": "status"}))
            }
            "commands" => {
                ctx.result = Some(success("commands", json!({"commands": ctx.catalog})));
                Ok(json!({"status": "completed", "handler": "commands"}))
            }
            other => Err(unhandled("meta", other, COMMANDS)),
        }
    }
}
