//! Session settings owned by the orchestrator.
//!
//! Created with the orchestrator, changed only by the agent and output
//! commands, and reset to [`SessionSettings::default`] on request.
use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AGENT: &str = "discussion-moderator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verbosity {
    Low,
    Medium,
    High,
    #[default]
    Off,
}

impl Verbosity {
    pub const NAMES: [&'static str; 4] = ["low", "medium", "high", "off"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Off => "off",
        }
    }

    /// Parse a level supplied through the named flag.
    pub fn parse_param(flag: &str, raw: &str) -> Result<Self, DispatchError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "off" => Ok(Self::Off),
            _ => Err(DispatchError::invalid(flag, raw, &Self::NAMES)),
        }
    }
}

impl FromStr for Verbosity {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_param("level", s)
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Markdown,
    #[default]
    Text,
}

impl OutputFormat {
    pub const NAMES: [&'static str; 3] = ["json", "markdown", "text"];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "markdown",
            Self::Text => "text",
        }
    }

    pub fn parse_param(flag: &str, raw: &str) -> Result<Self, DispatchError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "markdown" => Ok(Self::Markdown),
            "text" => Ok(Self::Text),
            _ => Err(DispatchError::invalid(flag, raw, &Self::NAMES)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_param("format", s)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub active_agent: String,
    pub verbosity: Verbosity,
    pub format: OutputFormat,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            active_agent: DEFAULT_AGENT.to_string(),
            verbosity: Verbosity::default(),
            format: OutputFormat::default(),
        }
    }
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub active_agent: Option<String>,
    pub verbosity: Option<Verbosity>,
    pub format: Option<OutputFormat>,
}

impl SessionSettings {
    pub fn get(&self) -> &Self {
        self
    }

    pub fn set(&mut self, update: SettingsUpdate) {
        if let Some(agent) = update.active_agent {
            self.active_agent = agent;
        }
        if let Some(verbosity) = update.verbosity {
            self.verbosity = verbosity;
        }
        if let Some(format) = update.format {
            self.format = format;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = SessionSettings::default();
        assert_eq!(settings.active_agent, "discussion-moderator");
        assert_eq!(settings.verbosity, Verbosity::Off);
        assert_eq!(settings.format, OutputFormat::Text);
    }

    #[test]
    fn set_applies_only_given_fields_and_reset_restores() {
        let mut settings = SessionSettings::default();
        settings.set(SettingsUpdate {
            verbosity: Some(Verbosity::High),
            ..SettingsUpdate::default()
        });
        assert_eq!(settings.verbosity, Verbosity::High);
        assert_eq!(settings.format, OutputFormat::Text);

        settings.set(SettingsUpdate {
            active_agent: Some("architect".to_string()),
            format: Some(OutputFormat::Json),
            ..SettingsUpdate::default()
        });
        assert_eq!(settings.active_agent, "architect");

        settings.reset();
        assert_eq!(settings, SessionSettings::default());
    }

    #[test]
    fn enumerations_reject_unknown_values() {
        let err = "extreme".parse::<Verbosity>().expect_err("invalid level");
        assert!(err.to_string().contains("low, medium, high, off"));
        let err = "yaml".parse::<OutputFormat>().expect_err("invalid format");
        assert!(err.to_string().contains("json, markdown, text"));
        assert_eq!("Markdown".parse::<OutputFormat>().ok(), Some(OutputFormat::Markdown));
    }
}
