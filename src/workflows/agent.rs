use super::{success, unhandled};
use crate::error::DispatchError;
use crate::phase::{ExecutionContext, PhaseOutcome, Workflow};
use crate::session::SettingsUpdate;
use serde_json::json;

const COMMANDS: &[&str] = &["agent:switch", "agent:list", "agent:current"];

/// Inspect personas and change the active agent.
pub struct AgentWorkflow;

impl AgentWorkflow {
    fn switch(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        let name = ctx
            .params
            .text_or_positional("name")
            .map(str::to_string)
            .ok_or_else(|| DispatchError::missing("name", "pass --name <agent> or the agent as a positional"))?;
        ctx.require_rules(&["agent"], &json!({"name": name}))?;
        if !ctx.services.personas.exists(&name) {
            let known = ctx.services.personas.names();
            return Err(DispatchError::invalid_with(
                "name",
                &name,
                format!("a known agent ({})", known.join(", ")),
            ));
        }

        let previous = ctx.settings.active_agent.clone();
        ctx.settings.set(SettingsUpdate {
            active_agent: Some(name.clone()),
            ..SettingsUpdate::default()
        });
        tracing::info!(previous = %previous, active = %name, "active agent switched");
        ctx.result = Some(success(
            "switched",
            json!({"previous": previous, "active": name}),
        ));
        Ok(json!({"status": "completed", "handler": "switch"}))
    }
}

impl Workflow for AgentWorkflow {
    fn category(&self) -> &str {
        "agent"
    }

    fn supported_commands(&self) -> &[&'static str] {
        COMMANDS
    }

    fn run_workflow(&self, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        match ctx.action() {
            "switch" => self.switch(ctx),
            "list" => {
                let agents = ctx.services.personas.names();
                ctx.result = Some(success(
                    "listed",
                    json!({"agents": agents, "active": ctx.settings.active_agent}),
                ));
                Ok(json!({"status": "completed", "handler": "list"}))
            }
            "current" => {
                ctx.result = Some(success(
                    "current",
                    json!({"agent": ctx.settings.active_agent}),
                ));
                Ok(json!({"status": "completed", "handler": "current"}))
            }
            other => Err(unhandled("agent", other, COMMANDS)),
        }
    }
}
