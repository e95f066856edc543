//! Command strings and their parameters.
//!
//! A command is `<category>:<action>`; parameters are `--flag value` pairs,
//! bare boolean flags, and positional tokens in the order given.
use crate::error::DispatchError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Global flag naming a trace file to write after a successful dispatch.
pub const SAVE_FLAG: &str = "save";
/// Global flag carrying a free-text annotation for the global context store.
pub const CONTEXT_FLAG: &str = "context";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    raw: String,
    split: usize,
}

impl Command {
    pub fn parse(raw: &str) -> Result<Self, DispatchError> {
        let invalid = |reason: &str| DispatchError::InvalidCommand {
            command: raw.to_string(),
            reason: reason.to_string(),
        };
        let split = raw
            .find(':')
            .ok_or_else(|| invalid("expected <category>:<action>"))?;
        if raw[split + 1..].contains(':') {
            return Err(invalid("expected exactly one ':' separator"));
        }
        if raw[..split].trim().is_empty() {
            return Err(invalid("category is empty"));
        }
        if raw[split + 1..].trim().is_empty() {
            return Err(invalid("action is empty"));
        }
        Ok(Self {
            raw: raw.to_string(),
            split,
        })
    }

    pub fn category(&self) -> &str {
        &self.raw[..self.split]
    }

    pub fn action(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for Command {
    type Err = DispatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Command {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Text(String),
}

/// Flags plus ordered positional tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub flags: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positionals: Vec<String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style text flag, mostly for callers embedding the engine.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.flags
            .insert(name.to_string(), ParamValue::Text(value.into()));
        self
    }

    pub fn with_flag(mut self, name: &str) -> Self {
        self.flags.insert(name.to_string(), ParamValue::Flag(true));
        self
    }

    pub fn with_positional(mut self, token: impl Into<String>) -> Self {
        self.positionals.push(token.into());
        self
    }

    /// Text value of a flag. Boolean flags have no text.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.flags.get(name) {
            Some(ParamValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Non-blank text value, trimmed.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.text(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// True for `--name`, `--name true`, or any non-empty text other than "false".
    pub fn is_set(&self, name: &str) -> bool {
        match self.flags.get(name) {
            Some(ParamValue::Flag(value)) => *value,
            Some(ParamValue::Text(value)) => !value.is_empty() && value != "false",
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }

    pub fn take_text(&mut self, name: &str) -> Option<String> {
        match self.flags.remove(name) {
            Some(ParamValue::Text(value)) => Some(value),
            Some(ParamValue::Flag(_)) | None => None,
        }
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positionals.get(index).map(String::as_str)
    }

    /// Flag text, falling back to the first positional token.
    pub fn text_or_positional(&self, name: &str) -> Option<&str> {
        self.non_blank(name).or_else(|| {
            self.positional(0)
                .map(str::trim)
                .filter(|value| !value.is_empty())
        })
    }

    /// Parse command-line style tokens into params.
    ///
    /// `--flag value` and `--flag=value` produce text; a `--flag` followed by
    /// another flag or the end of input is boolean. `--` ends flag parsing.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|token| token.as_ref().to_string())
            .collect();
        let mut params = Self::default();
        let mut index = 0;
        let mut flags_done = false;
        while index < tokens.len() {
            let token = &tokens[index];
            index += 1;
            if flags_done {
                params.positionals.push(token.clone());
                continue;
            }
            if token == "--" {
                flags_done = true;
                continue;
            }
            let Some(name) = token.strip_prefix("--").filter(|name| !name.is_empty()) else {
                params.positionals.push(token.clone());
                continue;
            };
            if let Some((name, value)) = name.split_once('=') {
                params
                    .flags
                    .insert(name.to_string(), ParamValue::Text(value.to_string()));
                continue;
            }
            match tokens.get(index) {
                Some(next) if !next.starts_with("--") => {
                    params
                        .flags
                        .insert(name.to_string(), ParamValue::Text(next.clone()));
                    index += 1;
                }
                _ => {
                    params.flags.insert(name.to_string(), ParamValue::Flag(true));
                }
            }
        }
        params
    }
}

/// Split a full command line (`category:action --flag value ...`) into a
/// command string and its params, honoring shell quoting.
pub fn parse_line(line: &str) -> Result<(String, Params), DispatchError> {
    let tokens = shell_words::split(line).map_err(|err| DispatchError::InvalidCommand {
        command: line.to_string(),
        reason: format!("unbalanced quoting ({err})"),
    })?;
    let mut tokens = tokens.into_iter();
    let command = tokens.next().ok_or_else(|| DispatchError::InvalidCommand {
        command: line.to_string(),
        reason: "empty command line".to_string(),
    })?;
    Ok((command, Params::from_tokens(tokens)))
}
