//! Error taxonomy for command dispatch.
//!
//! Every variant is fatal to the current command only. The `Display` text is
//! the sole user-visible diagnostic, so messages carry the offending values.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("malformed command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("unknown command category '{category}' (registered categories: {known})")]
    UnknownCategory { category: String, known: String },

    #[error("command '{command}' is not supported by the {workflow} workflow (supported: {supported})")]
    UnsupportedCommand {
        command: String,
        workflow: String,
        supported: String,
    },

    #[error("missing required parameter --{name}: {hint}")]
    MissingParameter { name: String, hint: String },

    #[error("invalid value '{value}' for --{name} (expected {expected})")]
    InvalidParameter {
        name: String,
        value: String,
        expected: String,
    },

    #[error("validation failed: {}", errors.join("; "))]
    ValidationFailure { errors: Vec<String> },

    #[error("utility {utility} failed: {reason}")]
    UtilityExecutionFailure { utility: String, reason: String },

    #[error("failed to write trace file {}: {reason}", path.display())]
    PersistenceFailure { path: PathBuf, reason: String },
}

impl DispatchError {
    pub(crate) fn missing(name: &str, hint: impl Into<String>) -> Self {
        Self::MissingParameter {
            name: name.to_string(),
            hint: hint.into(),
        }
    }

    /// Value outside a fixed enumeration.
    pub(crate) fn invalid(name: &str, value: &str, expected: &[&str]) -> Self {
        Self::invalid_with(name, value, format!("one of: {}", expected.join(", ")))
    }

    pub(crate) fn invalid_with(name: &str, value: &str, expected: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Stable label used in logs and the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCommand { .. } => "invalid_command",
            Self::UnknownCategory { .. } => "unknown_category",
            Self::UnsupportedCommand { .. } => "unsupported_command",
            Self::MissingParameter { .. } | Self::InvalidParameter { .. } => {
                "missing_or_invalid_parameter"
            }
            Self::ValidationFailure { .. } => "validation_failure",
            Self::UtilityExecutionFailure { .. } => "utility_execution_failure",
            Self::PersistenceFailure { .. } => "persistence_failure",
        }
    }
}
