//! Declarative rule-sets and the evaluator that checks data against them.
//!
//! Rule-sets are plain JSON keyed by set name. The built-in sets ship with the
//! binary; a configured rules file can add sets or replace them by name.
mod evaluate;
mod formats;

pub use evaluate::Verdict;
pub use formats::FORMAT_NAMES;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const DEFAULT_RULES_JSON: &str = include_str!("../../rules/default.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Compare a numeric or length property of the field.
    Constraint,
    /// Field must exist and be non-empty.
    Presence,
    /// Field must match the named format in `value`.
    Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Max,
    Min,
    Equals,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub id: String,
    pub kind: RuleKind,
    /// Dotted path into the data record.
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    pub message: String,
}

/// Named rule-sets available to workflows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleBook {
    sets: BTreeMap<String, Vec<Rule>>,
}

impl RuleBook {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The rule-sets embedded in the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(DEFAULT_RULES_JSON).context("parse built-in rule-sets")
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let sets: BTreeMap<String, Vec<Rule>> =
            serde_json::from_str(text).context("parse rule-set JSON")?;
        Ok(Self { sets })
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read rule-sets {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("load rule-sets {}", path.display()))
    }

    /// Add or replace sets by name.
    pub fn merge(&mut self, other: RuleBook) {
        self.sets.extend(other.sets);
    }

    pub fn insert(&mut self, name: &str, rules: Vec<Rule>) {
        self.sets.insert(name.to_string(), rules);
    }

    pub fn get(&self, name: &str) -> Option<&[Rule]> {
        self.sets.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> Vec<&str> {
        self.sets.keys().map(String::as_str).collect()
    }

    /// Check every rule of every named set against `data`.
    ///
    /// All failures are collected; nothing short-circuits and nothing errors.
    pub fn evaluate(&self, set_names: &[&str], data: &Value) -> Verdict {
        evaluate::evaluate(self, set_names, data)
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
