use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::registry::Registry;

// ── Documents ────────────────────────────────────────────────────────────────

/// How the host exposes a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    /// Run only when a user asks for it by name (e.g. `/commit`).
    ExplicitCommand,
    /// Picked by the model when its description matches the request.
    ModelInvokedSkill,
}

impl std::fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExplicitCommand => write!(f, "command"),
            Self::ModelInvokedSkill => write!(f, "skill"),
        }
    }
}

/// One instruction document. The body is opaque text and never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Unique within the owning collection.
    pub name: String,
    pub description: String,
    pub invocation_mode: InvocationMode,
    /// Markdown body with any frontmatter removed.
    pub body: String,
    /// File the document was read from.
    pub path: PathBuf,
    /// Usage hint shown next to a command (`argument-hint`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument_hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_tools: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

impl Document {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            invocation_mode: self.invocation_mode,
        }
    }

    pub fn is_skill(&self) -> bool {
        self.invocation_mode == InvocationMode::ModelInvokedSkill
    }
}

/// Listing row returned by [`Registry::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub name: String,
    pub description: String,
    pub invocation_mode: InvocationMode,
}

// ── Collections ──────────────────────────────────────────────────────────────

/// A named group of documents distributed together (one plugin directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub path: PathBuf,
    /// Documents in discovery order.
    pub documents: Vec<Document>,
}

impl Collection {
    pub fn get(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.name == name)
    }

    pub fn summaries(&self) -> Vec<DocumentSummary> {
        self.documents.iter().map(Document::summary).collect()
    }

    pub fn count(&self, mode: InvocationMode) -> usize {
        self.documents
            .iter()
            .filter(|d| d.invocation_mode == mode)
            .count()
    }
}

// ── Load results ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A non-fatal finding from a scan. The registry stays usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub path: PathBuf,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn info(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Output of one scan: the registry plus everything that was skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub registry: Registry,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoadReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}
