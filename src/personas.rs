//! Agent persona records.
//!
//! The engine only asks whether a persona exists and which names are known.
//! Persona content lives elsewhere.
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Personas available when no persona directory is configured.
pub const BUILTIN_PERSONAS: [&str; 5] = [
    "architect",
    "code-reviewer",
    "discussion-moderator",
    "product-manager",
    "qa-engineer",
];

pub trait PersonaDirectory {
    fn exists(&self, name: &str) -> bool;

    /// Known names, sorted.
    fn names(&self) -> Vec<String>;
}

/// Fixed in-memory roster.
#[derive(Debug, Clone)]
pub struct StaticPersonas {
    names: BTreeSet<String>,
}

impl StaticPersonas {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_PERSONAS)
    }
}

impl PersonaDirectory for StaticPersonas {
    fn exists(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

/// Personas stored as `<root>/<name>.md`.
#[derive(Debug, Clone)]
pub struct FsPersonas {
    root: PathBuf,
}

impl FsPersonas {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, name: &str) -> Option<PathBuf> {
        // Names are single path components; anything else cannot be a record.
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => {
                Some(self.root.join(format!("{name}.md")))
            }
            _ => None,
        }
    }
}

impl PersonaDirectory for FsPersonas {
    fn exists(&self, name: &str) -> bool {
        self.record_path(name).is_some_and(|path| path.is_file())
    }

    fn names(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.root) else {
            tracing::debug!(root = %self.root.display(), "persona directory unreadable");
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .filter_map(|path| {
                path.file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect();
        names.sort();
        names
    }
}
