//! Registry of instruction documents: discovery, parsing, and lookup.
//!
//! A root directory holds one collection (plugin) per subdirectory, or a
//! `.claude-plugin/marketplace.json` listing them. Each collection holds
//! explicit commands (`commands/*.md`) and model-invoked skills
//! (`skills/<name>/SKILL.md` with YAML frontmatter). Document bodies are
//! opaque text; nothing here executes them.

pub mod discover;
pub mod error;
pub mod formats;
pub mod marketplace;
pub mod parse;
pub mod prompt_gen;
pub mod registry;
pub mod types;
#[cfg(feature = "file-watcher")]
pub mod watcher;

pub use {
    discover::{FsRegistryLoader, LoadOptions, RegistryLoader, load_root, load_roots},
    error::{Error, Result},
    registry::Registry,
    types::{
        Collection, Diagnostic, Document, DocumentSummary, InvocationMode, LoadReport, Severity,
    },
};
