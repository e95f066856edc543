//! Command dispatch and the five-phase workflow pipeline.
//!
//! A command string `category:action` is routed by the [`Orchestrator`] to
//! the [`Workflow`] registered for its category, which then runs
//! initialization, parameters, workflow, validation, and output in order.
pub mod command;
pub mod config;
pub mod context_store;
pub mod error;
pub mod orchestrator;
pub mod personas;
pub mod phase;
pub mod render;
pub mod rules;
pub mod session;
pub mod trace;
pub mod utility;
pub mod workflows;

pub use command::{Command, ParamValue, Params};
pub use context_store::{GlobalContextEntry, GlobalContextStore};
pub use error::DispatchError;
pub use orchestrator::Orchestrator;
pub use phase::{ExecutionContext, Phase, PhaseOutcome, Services, Workflow};
pub use rules::{RuleBook, Verdict};
pub use session::{OutputFormat, SessionSettings, Verbosity};
pub use trace::PipelineTrace;
