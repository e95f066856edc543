//! Command routing.
//!
//! The orchestrator owns the workflow registry, the session settings, and the
//! global context store. One dispatch runs to completion before the next
//! starts (`dispatch` takes `&mut self`).
use crate::command::{Command, ParamValue, Params, CONTEXT_FLAG, SAVE_FLAG};
use crate::context_store::{now_epoch_ms, GlobalContextStore};
use crate::error::DispatchError;
use crate::phase::{self, Catalog, ExecutionContext, PhaseResults, Services, Workflow};
use crate::session::SessionSettings;
use crate::trace::{write_trace, PipelineTrace};
use crate::workflows;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

pub struct Orchestrator {
    workflows: BTreeMap<String, Box<dyn Workflow>>,
    catalog: Catalog,
    settings: SessionSettings,
    context: GlobalContextStore,
    services: Services,
}

impl Orchestrator {
    /// An orchestrator with every built-in category registered.
    pub fn new(services: Services) -> Self {
        let mut orchestrator = Self::empty(services);
        for workflow in workflows::builtin() {
            orchestrator.register(workflow);
        }
        orchestrator
    }

    /// An orchestrator with no categories.
    pub fn empty(services: Services) -> Self {
        Self {
            workflows: BTreeMap::new(),
            catalog: Catalog::new(),
            settings: SessionSettings::default(),
            context: GlobalContextStore::new(),
            services,
        }
    }

    /// Register a workflow under its category, returning any it replaced.
    pub fn register(&mut self, workflow: Box<dyn Workflow>) -> Option<Box<dyn Workflow>> {
        let category = workflow.category().to_string();
        let commands = workflow
            .supported_commands()
            .iter()
            .map(|command| command.to_string())
            .collect();
        self.catalog.insert(category.clone(), commands);
        self.workflows.insert(category, workflow)
    }

    pub fn categories(&self) -> Vec<&str> {
        self.workflows.keys().map(String::as_str).collect()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn reset_settings(&mut self) {
        self.settings.reset();
    }

    pub fn context_store(&self) -> &GlobalContextStore {
        &self.context
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Route `command` to its workflow and return the workflow's result.
    pub fn dispatch(&mut self, command: &str, params: Params) -> Result<Value, DispatchError> {
        self.dispatch_traced(command, params)
            .map(|trace| trace.result)
    }

    /// Like [`Orchestrator::dispatch`], returning the full pipeline trace.
    pub fn dispatch_traced(
        &mut self,
        command: &str,
        params: Params,
    ) -> Result<PipelineTrace, DispatchError> {
        let start = Instant::now();
        let outcome = self.run(command, params);
        let elapsed_ms = start.elapsed().as_millis();
        match &outcome {
            Ok(_) => tracing::info!(command, elapsed_ms, "dispatch complete"),
            Err(err) => tracing::info!(command, elapsed_ms, kind = err.kind(), "dispatch failed"),
        }
        outcome
    }

    fn run(&mut self, raw: &str, params: Params) -> Result<PipelineTrace, DispatchError> {
        let command = Command::parse(raw)?;
        let workflow = self
            .workflows
            .get(command.category())
            .ok_or_else(|| DispatchError::UnknownCategory {
                category: command.category().to_string(),
                known: self.catalog.keys().cloned().collect::<Vec<_>>().join(", "),
            })?;
        if !workflow.is_supported_command(&command) {
            return Err(DispatchError::UnsupportedCommand {
                command: command.to_string(),
                workflow: workflow.category().to_string(),
                supported: workflow.supported_commands().join(", "),
            });
        }
        tracing::debug!(command = %command, category = command.category(), "dispatch start");

        let recorded_params = params.clone();
        let mut params = params;
        let save = take_global(&mut params, SAVE_FLAG).map(PathBuf::from);
        let note = take_global(&mut params, CONTEXT_FLAG);
        // Blank notes are rejected by the parameters phase, never stored.
        if let Some(note) = note.as_deref().filter(|note| !note.trim().is_empty()) {
            if let Err(err) = self.context.add(command.as_str(), note) {
                tracing::warn!(command = %command, error = %err, "context not recorded");
            }
        }

        let mut ctx = ExecutionContext {
            command: command.clone(),
            params,
            save,
            note,
            phase_results: PhaseResults::new(),
            result: None,
            settings: &mut self.settings,
            context_store: &mut self.context,
            services: &self.services,
            catalog: &self.catalog,
        };
        let result = phase::execute(workflow.as_ref(), &mut ctx)?;
        let save = ctx.save.take();
        let trace = PipelineTrace {
            command: command.to_string(),
            params: recorded_params,
            phase_results: ctx.phase_results,
            result,
            timestamp: now_epoch_ms(),
        };
        if let Some(path) = save {
            write_trace(&path, &trace)?;
        }
        Ok(trace)
    }
}

/// Remove a global flag; a bare `--flag` counts as an empty value.
fn take_global(params: &mut Params, name: &str) -> Option<String> {
    match params.flags.remove(name)? {
        ParamValue::Text(value) => Some(value),
        ParamValue::Flag(_) => Some(String::new()),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
