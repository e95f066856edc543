use chrono::NaiveDate;
use regex::Regex;
use std::path::Path;

/// Names accepted in the `value` of a `format` rule.
pub const FORMAT_NAMES: [&str; 8] = [
    "agent-name",
    "identifier",
    "absolute-path",
    "non-blank",
    "email",
    "url",
    "json",
    "date",
];

/// `None` when the format name is unknown.
pub(crate) fn matches_format(format: &str, text: &str) -> Option<bool> {
    let matched = match format {
        "agent-name" => Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$")
            .expect("regex for agent names")
            .is_match(text),
        "identifier" => Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$")
            .expect("regex for identifiers")
            .is_match(text),
        "absolute-path" => Path::new(text).is_absolute(),
        "non-blank" => !text.trim().is_empty(),
        "email" => Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("regex for email addresses")
            .is_match(text),
        // Scheme and host both required.
        "url" => url::Url::parse(text).is_ok_and(|parsed| parsed.has_host()),
        "json" => serde_json::from_str::<serde_json::Value>(text).is_ok(),
        "date" => NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok(),
        _ => return None,
    };
    Some(matched)
}
