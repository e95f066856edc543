use super::formats::{matches_format, FORMAT_NAMES};
use super::{Operator, Rule, RuleBook, RuleKind};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub valid: bool,
    pub errors: Vec<String>,
}

pub(super) fn evaluate(book: &RuleBook, set_names: &[&str], data: &Value) -> Verdict {
    let mut errors = Vec::new();
    for name in set_names {
        let Some(rules) = book.get(name) else {
            errors.push(format!("unknown rule-set '{name}'"));
            continue;
        };
        for rule in rules {
            if let Err(message) = check_rule(rule, data) {
                tracing::debug!(rule_set = %name, rule = %rule.id, "rule failed");
                errors.push(message);
            }
        }
    }
    Verdict {
        valid: errors.is_empty(),
        errors,
    }
}

fn check_rule(rule: &Rule, data: &Value) -> Result<(), String> {
    let field = lookup(data, &rule.field);
    match rule.kind {
        RuleKind::Presence => {
            if field.is_some_and(is_present) {
                Ok(())
            } else {
                Err(rule.message.clone())
            }
        }
        RuleKind::Constraint => {
            // Absent fields are left to presence rules.
            let Some(field) = field.filter(|value| !value.is_null()) else {
                return Ok(());
            };
            check_constraint(rule, field)
        }
        RuleKind::Format => {
            let Some(field) = field.filter(|value| !value.is_null()) else {
                return Ok(());
            };
            let Some(format) = rule.value.as_str() else {
                return Err(format!("rule {}: format rule needs a format name", rule.id));
            };
            let Some(text) = field.as_str() else {
                return Err(rule.message.clone());
            };
            match matches_format(format, text) {
                Some(true) => Ok(()),
                Some(false) => Err(rule.message.clone()),
                None => Err(format!(
                    "rule {}: unknown format '{format}' (known: {})",
                    rule.id,
                    FORMAT_NAMES.join(", ")
                )),
            }
        }
    }
}

fn check_constraint(rule: &Rule, field: &Value) -> Result<(), String> {
    let Some(operator) = rule.operator else {
        return Err(format!("rule {}: constraint rule has no operator", rule.id));
    };
    let passed = match operator {
        Operator::Max | Operator::Min => {
            let Some(limit) = rule.value.as_f64() else {
                return Err(format!("rule {}: {operator:?} needs a numeric value", rule.id));
            };
            let Some(measure) = measure(field) else {
                return Err(rule.message.clone());
            };
            if operator == Operator::Max {
                measure <= limit
            } else {
                measure >= limit
            }
        }
        Operator::Equals => match rule.value.as_f64() {
            Some(expected) => measure(field) == Some(expected),
            None => field == &rule.value,
        },
        Operator::Contains => match (field, &rule.value) {
            (Value::String(text), Value::String(needle)) => text.contains(needle.as_str()),
            (Value::Array(items), needle) => items.contains(needle),
            _ => false,
        },
    };
    if passed {
        Ok(())
    } else {
        Err(rule.message.clone())
    }
}

/// Numbers measure as themselves; strings by character count; collections by length.
fn measure(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => Some(text.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        Value::Bool(_) | Value::Null => None,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => !text.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(data, |current, segment| current.get(segment))
}
