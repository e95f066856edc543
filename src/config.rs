//! Engine configuration.
//!
//! A small JSON file pointing the engine at its collaborators. Every field is
//! optional; without a file the built-in personas and rule-sets are used and
//! utilities are looked up on `PATH`.
use crate::personas::{FsPersonas, PersonaDirectory, StaticPersonas};
use crate::phase::Services;
use crate::rules::RuleBook;
use crate::utility::ProcessInvoker;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CMDFLOW_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub schema_version: u32,
    /// Directory of `<name>.md` persona records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personas_dir: Option<PathBuf>,
    /// Root of `<category>/<name>` utility executables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilities_dir: Option<PathBuf>,
    /// JSON rule-sets merged over the built-in ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,
}

pub fn default_config() -> Config {
    Config {
        schema_version: CONFIG_SCHEMA_VERSION,
        personas_dir: None,
        utilities_dir: None,
        rules_path: None,
    }
}

/// `<config dir>/cmdflow/config.json`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cmdflow").join("config.json"))
}

/// Resolve the config in effect: explicit path, then `CMDFLOW_CONFIG`, then
/// the default location if a file exists there, else built-in defaults.
pub fn load_effective(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|value| !value.is_empty()) {
        return load_config(Path::new(&path)).with_context(|| format!("load config from ${CONFIG_ENV}"));
    }
    match default_config_path() {
        Some(path) if path.is_file() => load_config(&path),
        _ => Ok(default_config()),
    }
}

/// Load, validate, and resolve relative paths against the file's directory.
pub fn load_config(path: &Path) -> Result<Config> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let mut config: Config =
        serde_json::from_slice(&bytes).with_context(|| format!("parse config {}", path.display()))?;
    validate_config(&config)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    for field in [
        &mut config.personas_dir,
        &mut config.utilities_dir,
        &mut config.rules_path,
    ] {
        if let Some(value) = field.as_mut() {
            if value.is_relative() {
                *value = base.join(&*value);
            }
        }
    }
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    for (label, value) in [
        ("personas_dir", &config.personas_dir),
        ("utilities_dir", &config.utilities_dir),
        ("rules_path", &config.rules_path),
    ] {
        if value
            .as_ref()
            .is_some_and(|path| path.as_os_str().to_string_lossy().trim().is_empty())
        {
            return Err(anyhow!("{label} must be non-empty when set"));
        }
    }
    Ok(())
}

/// Pretty JSON stub written by `cmdflow init`.
pub fn config_stub() -> Result<String> {
    serde_json::to_string_pretty(&default_config()).context("serialize config stub")
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Wire the collaborators a config names.
pub fn build_services(config: &Config) -> Result<Services> {
    let personas: Box<dyn PersonaDirectory> = match &config.personas_dir {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(anyhow!("personas_dir {} is not a directory", dir.display()));
            }
            Box::new(FsPersonas::new(dir.clone()))
        }
        None => Box::new(StaticPersonas::builtin()),
    };

    let mut rules = RuleBook::builtin()?;
    if let Some(path) = &config.rules_path {
        rules.merge(RuleBook::load_file(path)?);
    }

    Ok(Services {
        personas,
        utilities: Box::new(ProcessInvoker::new(config.utilities_dir.clone())),
        rules,
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
