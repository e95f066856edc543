//! Built-in category handlers.
//!
//! Each workflow declares its commands and branches on the action inside its
//! `workflow` phase. Adding a category means adding a module here and listing
//! it in [`builtin`].
mod agent;
mod message;
mod meta;
mod output;
mod rules;
mod utility;

pub use agent::AgentWorkflow;
pub use message::MessageWorkflow;
pub use meta::MetaWorkflow;
pub use output::OutputWorkflow;
pub use rules::RulesWorkflow;
pub use utility::UtilityWorkflow;

use crate::error::DispatchError;
use crate::phase::Workflow;
use serde_json::{Map, Value};

pub fn builtin() -> Vec<Box<dyn Workflow>> {
    vec![
        Box::new(AgentWorkflow),
        Box::new(MessageWorkflow),
        Box::new(MetaWorkflow),
        Box::new(OutputWorkflow),
        Box::new(RulesWorkflow),
        Box::new(UtilityWorkflow),
    ]
}

/// `{success: true, action, ...payload}`.
pub(crate) fn success(action: &str, payload: Value) -> Value {
    let mut object = Map::new();
    object.insert("success".to_string(), Value::Bool(true));
    object.insert("action".to_string(), Value::String(action.to_string()));
    if let Value::Object(fields) = payload {
        object.extend(fields);
    }
    Value::Object(object)
}

/// Reached only if a workflow's action match falls out of sync with its
/// declared command list.
pub(crate) fn unhandled(category: &str, action: &str, supported: &[&str]) -> DispatchError {
    DispatchError::UnsupportedCommand {
        command: format!("{category}:{action}"),
        workflow: category.to_string(),
        supported: supported.join(", "),
    }
}
