//! The five-phase pipeline every workflow runs.
//!
//! Phases run strictly in [`Phase::ALL`] order. A phase that returns `Err`
//! aborts the rest of the pipeline and the error reaches the caller as is.
//! Workflows override only the phases they care about; the rest record
//! `{"status": "completed"}`.
use crate::command::{Command, Params};
use crate::context_store::{context_too_long, exceeds_context_limit, GlobalContextEntry, GlobalContextStore};
use crate::error::DispatchError;
use crate::personas::PersonaDirectory;
use crate::rules::RuleBook;
use crate::session::SessionSettings;
use crate::trace::validate_save_path;
use crate::utility::UtilityInvoker;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initialization,
    Parameters,
    Workflow,
    Validation,
    Output,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Initialization,
        Phase::Parameters,
        Phase::Workflow,
        Phase::Validation,
        Phase::Output,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialization => "initialization",
            Self::Parameters => "parameters",
            Self::Workflow => "workflow",
            Self::Validation => "validation",
            Self::Output => "output",
        }
    }
}

/// Phase outputs keyed by phase; iteration follows pipeline order.
pub type PhaseResults = BTreeMap<Phase, Value>;

pub type PhaseOutcome = Result<Value, DispatchError>;

/// Category name to the commands its workflow supports.
pub type Catalog = BTreeMap<String, Vec<String>>;

/// Collaborators the engine consumes but does not implement.
pub struct Services {
    pub personas: Box<dyn PersonaDirectory>,
    pub utilities: Box<dyn UtilityInvoker>,
    pub rules: RuleBook,
}

/// Per-dispatch state handed through every phase.
pub struct ExecutionContext<'a> {
    pub command: Command,
    /// Params with the global `save` and `context` flags removed.
    pub params: Params,
    pub save: Option<PathBuf>,
    /// The `--context` text supplied with this command.
    pub note: Option<String>,
    pub phase_results: PhaseResults,
    pub result: Option<Value>,
    pub settings: &'a mut SessionSettings,
    pub context_store: &'a mut GlobalContextStore,
    pub services: &'a Services,
    pub catalog: &'a Catalog,
}

impl ExecutionContext<'_> {
    /// Annotations accumulated so far, including those from earlier commands.
    pub fn global_context(&self) -> &[GlobalContextEntry] {
        self.context_store.list()
    }

    pub fn action(&self) -> &str {
        self.command.action()
    }

    /// Run the named rule-sets and fail with every violation at once.
    pub fn require_rules(&self, sets: &[&str], data: &Value) -> PhaseOutcome {
        let verdict = self.services.rules.evaluate(sets, data);
        if !verdict.valid {
            return Err(DispatchError::ValidationFailure {
                errors: verdict.errors,
            });
        }
        Ok(json!({"status": "completed", "rule_sets": sets}))
    }

    /// The `workflow` phase result, for phases that run after it.
    pub fn result_field(&self, field: &str) -> Option<&Value> {
        self.result.as_ref().and_then(|result| result.get(field))
    }
}

/// Output recorded by phases with nothing to report.
pub fn completed() -> Value {
    json!({"status": "completed"})
}

/// A category handler. Every phase has a no-op default.
pub trait Workflow {
    /// Category this workflow serves, e.g. `message`.
    fn category(&self) -> &str;

    /// Full command strings, e.g. `message:new`.
    fn supported_commands(&self) -> &[&'static str];

    fn is_supported_command(&self, command: &Command) -> bool {
        self.supported_commands().contains(&command.as_str())
    }

    fn run_initialization(&self, _ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        Ok(completed())
    }

    /// Runs after the global `save`/`context` checks have passed.
    fn run_parameters(&self, _ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        Ok(completed())
    }

    /// Expected to set `ctx.result`.
    fn run_workflow(&self, _ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        Ok(completed())
    }

    fn run_validation(&self, _ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        Ok(completed())
    }

    fn run_output(&self, _ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
        Ok(completed())
    }
}

/// Run all phases in order.
///
/// Returns `ctx.result` when a phase set it, else the accumulated phase results.
pub fn execute(workflow: &dyn Workflow, ctx: &mut ExecutionContext<'_>) -> Result<Value, DispatchError> {
    for phase in Phase::ALL {
        tracing::debug!(command = %ctx.command, phase = phase.as_str(), "phase start");
        let output = run_phase(workflow, phase, ctx)?;
        ctx.phase_results.insert(phase, output);
    }
    Ok(match &ctx.result {
        Some(result) => result.clone(),
        None => phase_results_value(&ctx.phase_results),
    })
}

fn run_phase(workflow: &dyn Workflow, phase: Phase, ctx: &mut ExecutionContext<'_>) -> PhaseOutcome {
    match phase {
        Phase::Initialization => workflow.run_initialization(ctx),
        Phase::Parameters => {
            check_global_params(ctx)?;
            workflow.run_parameters(ctx)
        }
        Phase::Workflow => workflow.run_workflow(ctx),
        Phase::Validation => workflow.run_validation(ctx),
        Phase::Output => workflow.run_output(ctx),
    }
}

/// Checks every command gets regardless of category.
fn check_global_params(ctx: &ExecutionContext<'_>) -> Result<(), DispatchError> {
    if let Some(path) = &ctx.save {
        validate_save_path(path)?;
    }
    if let Some(note) = &ctx.note {
        if note.trim().is_empty() {
            return Err(DispatchError::invalid_with("context", note, "non-blank text"));
        }
        if exceeds_context_limit(note) {
            return Err(context_too_long(note));
        }
    }
    Ok(())
}

pub fn phase_results_value(results: &PhaseResults) -> Value {
    Value::Object(
        results
            .iter()
            .map(|(phase, output)| (phase.as_str().to_string(), output.clone()))
            .collect(),
    )
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
