//! Collection layout detection.
//!
//! A collection is a plugin directory. It may carry a Claude Code style
//! `.claude-plugin/plugin.json`, keep commands under `commands/` and skills
//! under `skills/<name>/SKILL.md`, or just hold loose `.md` commands at its
//! top level. This module works out which files are documents and in what
//! order they should be discovered.

use std::{
    collections::HashSet,
    path::{Component, Path, PathBuf},
};

use serde::Deserialize;

use crate::{error::Result, types::InvocationMode};

/// Relative location of a plugin manifest inside a collection directory.
pub const PLUGIN_MANIFEST: &str = ".claude-plugin/plugin.json";

/// Top-level markdown files that are never documents in a flat collection.
const NON_DOCUMENT_FILES: &[&str] = &["README.md", "CHANGELOG.md", "LICENSE.md", "CLAUDE.md"];

// ── Plugin manifest ─────────────────────────────────────────────────────────

/// Metadata from `.claude-plugin/plugin.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<PluginAuthor>,
    /// Explicit command files, relative to the collection directory.
    #[serde(default)]
    pub commands: Option<PathList>,
    /// Explicit skill directories (or `SKILL.md` files), relative to the collection.
    #[serde(default)]
    pub skills: Option<PathList>,
}

/// Author field can be a string or an object with `name` (and optionally `email`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PluginAuthor {
    Simple(String),
    Object { name: String },
}

impl PluginAuthor {
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(s) => s,
            Self::Object { name } => name,
        }
    }
}

/// `commands` / `skills` accept a single path or a list of paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathList {
    One(String),
    Many(Vec<String>),
}

impl PathList {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::One(p) => vec![p.as_str()],
            Self::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

/// Read `.claude-plugin/plugin.json`. `Ok(None)` when the file is absent.
pub fn read_plugin_manifest(collection_dir: &Path) -> Result<Option<PluginManifest>> {
    let path = collection_dir.join(PLUGIN_MANIFEST);
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

// ── Layout ──────────────────────────────────────────────────────────────────

/// How documents are arranged inside a collection directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionLayout {
    /// `commands/*.md` and/or `skills/<name>/SKILL.md`.
    Structured,
    /// Loose `*.md` commands at the top level.
    Flat,
}

pub fn detect_layout(collection_dir: &Path) -> CollectionLayout {
    if collection_dir.join("commands").is_dir() || collection_dir.join("skills").is_dir() {
        CollectionLayout::Structured
    } else {
        CollectionLayout::Flat
    }
}

/// A file that should be parsed as a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub path: PathBuf,
    pub mode: InvocationMode,
}

/// List the document files of a collection in discovery order.
///
/// Commands come before skills. Within each group, paths listed in the
/// plugin manifest come first in listed order, then everything else found
/// on disk in file-name order.
pub fn document_files(
    collection_dir: &Path,
    manifest: Option<&PluginManifest>,
) -> Vec<DocumentFile> {
    let layout = detect_layout(collection_dir);

    let commands = match layout {
        CollectionLayout::Structured => markdown_files(&collection_dir.join("commands")),
        CollectionLayout::Flat => markdown_files(collection_dir)
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| !NON_DOCUMENT_FILES.contains(&n))
            })
            .collect(),
    };
    let skills = match layout {
        CollectionLayout::Structured => skill_files(&collection_dir.join("skills")),
        CollectionLayout::Flat => Vec::new(),
    };

    let listed_commands = listed_paths(
        collection_dir,
        manifest.and_then(|m| m.commands.as_ref()),
        |p| p.is_file() && is_markdown(p),
    );
    let listed_skills = listed_paths(
        collection_dir,
        manifest.and_then(|m| m.skills.as_ref()),
        |p| p.is_file() && is_markdown(p),
    );

    let mut files = Vec::new();
    push_ordered(
        &mut files,
        listed_commands,
        commands,
        InvocationMode::ExplicitCommand,
    );
    push_ordered(
        &mut files,
        listed_skills,
        skills,
        InvocationMode::ModelInvokedSkill,
    );
    files
}

fn push_ordered(
    out: &mut Vec<DocumentFile>,
    listed: Vec<PathBuf>,
    found: Vec<PathBuf>,
    mode: InvocationMode,
) {
    let mut seen = HashSet::new();
    for path in listed.into_iter().chain(found) {
        if seen.insert(path.clone()) {
            out.push(DocumentFile { path, mode });
        }
    }
}

/// Resolve manifest-listed paths against the collection directory.
///
/// Skill entries may name either the skill directory or its `SKILL.md`.
/// Entries escaping the collection, or not matching `accept`, are dropped.
fn listed_paths(
    collection_dir: &Path,
    list: Option<&PathList>,
    accept: impl Fn(&Path) -> bool,
) -> Vec<PathBuf> {
    let Some(list) = list else {
        return Vec::new();
    };
    list.paths()
        .into_iter()
        .filter_map(|raw| {
            let rel = Path::new(raw);
            if rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
            {
                tracing::debug!(path = raw, "ignoring manifest path outside collection");
                return None;
            }
            let mut path = collection_dir.join(rel);
            if path.is_dir() {
                path = path.join("SKILL.md");
            }
            normalize(&path)
        })
        .filter(|p| accept(p))
        .collect()
}

/// Strip `.` components so `./commands/a.md` and `commands/a.md` compare equal.
fn normalize(path: &Path) -> Option<PathBuf> {
    let normalized: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    (!normalized.as_os_str().is_empty()).then_some(normalized)
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
}

/// `*.md` files directly inside `dir`, sorted by file name.
fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_markdown(p))
        .filter_map(|p| normalize(&p))
        .collect();
    files.sort();
    files
}

/// `<dir>/<name>/SKILL.md` files, sorted by skill directory name.
fn skill_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Vec::new(),
    };
    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .map(|p| p.join("SKILL.md"))
        .filter(|p| p.is_file())
        .filter_map(|p| normalize(&p))
        .collect();
    files.sort();
    files
}
