use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    formats::{self, DocumentFile, PluginManifest},
    marketplace::{self, EntryLocation},
    parse::{self, Parsed},
    registry::{QUALIFIER, Registry},
    types::{Collection, Diagnostic, InvocationMode, LoadReport},
};

/// Knobs for a scan.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Fail on the first malformed document instead of skipping it.
    pub strict: bool,
    /// Honour `.claude-plugin/marketplace.json` at each root.
    pub use_marketplace: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict: false,
            use_marketplace: true,
        }
    }
}

/// Builds a registry from some backing store.
#[async_trait]
pub trait RegistryLoader: Send + Sync {
    /// Scan and return the registry plus non-fatal diagnostics.
    async fn load(&self) -> Result<LoadReport>;
}

/// Filesystem loader over one or more root directories.
pub struct FsRegistryLoader {
    roots: Vec<PathBuf>,
    options: LoadOptions,
}

impl FsRegistryLoader {
    pub fn new(roots: Vec<PathBuf>, options: LoadOptions) -> Self {
        Self { roots, options }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

#[async_trait]
impl RegistryLoader for FsRegistryLoader {
    async fn load(&self) -> Result<LoadReport> {
        load_roots(&self.roots, &self.options)
    }
}

/// Scan every root and build one registry.
///
/// Roots that do not exist contribute nothing. Collection names must be
/// unique across all roots.
pub fn load_roots(roots: &[PathBuf], options: &LoadOptions) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for root in roots {
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "skipping missing root");
            continue;
        }
        for dir in collection_dirs(root, options, &mut report.diagnostics) {
            if let Some(collection) = load_collection(&dir, options, &mut report.diagnostics)? {
                report.registry.insert(collection)?;
            }
        }
    }

    tracing::info!(
        collections = report.registry.len(),
        documents = report.registry.document_count(),
        diagnostics = report.diagnostics.len(),
        "registry loaded"
    );
    Ok(report)
}

/// Convenience for a single root with default options.
pub fn load_root(root: &Path) -> Result<LoadReport> {
    load_roots(&[root.to_path_buf()], &LoadOptions::default())
}

/// Collection directories under a root, from the marketplace listing when
/// there is a usable one, otherwise every visible subdirectory by name.
fn collection_dirs(
    root: &Path,
    options: &LoadOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<PathBuf> {
    if options.use_marketplace {
        match marketplace::read_marketplace(root) {
            Ok(Some(listing)) => {
                let mut dirs = Vec::new();
                for entry in &listing.plugins {
                    match listing.locate(root, entry) {
                        EntryLocation::Local(dir) => dirs.push(dir),
                        EntryLocation::Missing(dir) => diagnostics.push(Diagnostic::warning(
                            &dir,
                            format!("marketplace entry '{}' points to a missing directory", entry.name),
                        )),
                        EntryLocation::Remote(kind) => diagnostics.push(Diagnostic::info(
                            root.join(marketplace::MARKETPLACE_MANIFEST),
                            format!("skipping '{}': {kind} sources are not loaded", entry.name),
                        )),
                        EntryLocation::Invalid(reason) => diagnostics.push(Diagnostic::warning(
                            root.join(marketplace::MARKETPLACE_MANIFEST),
                            format!("skipping '{}': {reason}", entry.name),
                        )),
                    }
                }
                return dirs;
            },
            Ok(None) => {},
            Err(e) => {
                tracing::warn!(root = %root.display(), %e, "invalid marketplace listing");
                diagnostics.push(Diagnostic::warning(
                    root.join(marketplace::MARKETPLACE_MANIFEST),
                    format!("invalid marketplace listing, scanning directories instead: {e}"),
                ));
            },
        }
    }

    let entries = match std::fs::read_dir(root) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(root = %root.display(), %e, "failed to read root");
            return Vec::new();
        },
    };
    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| !n.starts_with('.'))
        })
        .collect();
    dirs.sort();
    dirs
}

/// Parse one collection directory. `Ok(None)` when it holds no documents.
fn load_collection(
    dir: &Path,
    options: &LoadOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Option<Collection>> {
    let manifest = match formats::read_plugin_manifest(dir) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), %e, "invalid plugin manifest");
            diagnostics.push(Diagnostic::warning(
                dir.join(formats::PLUGIN_MANIFEST),
                format!("invalid plugin manifest, using directory name: {e}"),
            ));
            None
        },
    };

    let Some(name) = collection_name(dir, manifest.as_ref()) else {
        diagnostics.push(Diagnostic::warning(dir, "collection directory has no usable name"));
        return Ok(None);
    };
    if name.contains(QUALIFIER) {
        tracing::warn!(dir = %dir.display(), %name, "skipping unaddressable collection");
        diagnostics.push(Diagnostic::warning(
            dir,
            format!("collection name '{name}' contains '{QUALIFIER}'"),
        ));
        return Ok(None);
    }

    let mut documents = Vec::new();
    for file in formats::document_files(dir, manifest.as_ref()) {
        match read_document(&file) {
            Ok(Parsed { document, warnings }) => {
                for warning in warnings {
                    tracing::warn!(path = %file.path.display(), %warning, "document header problem");
                    diagnostics.push(Diagnostic::warning(&file.path, warning));
                }
                documents.push(document);
            },
            Err(Error::MalformedDocument { path, reason }) if !options.strict => {
                tracing::warn!(path = %path.display(), %reason, "skipping malformed document");
                diagnostics.push(Diagnostic::warning(path, reason));
            },
            Err(Error::Io(e)) if !options.strict => {
                tracing::warn!(path = %file.path.display(), %e, "failed to read document");
                diagnostics.push(Diagnostic::warning(&file.path, format!("unreadable: {e}")));
            },
            Err(e) => return Err(e),
        }
    }

    if documents.is_empty() {
        tracing::debug!(collection = %name, "omitting empty collection");
        return Ok(None);
    }

    let manifest = manifest.unwrap_or_default();
    Ok(Some(Collection {
        name,
        description: manifest.description,
        version: manifest.version,
        author: manifest.author.as_ref().map(|a| a.name().to_string()),
        path: dir.to_path_buf(),
        documents,
    }))
}

fn collection_name(dir: &Path, manifest: Option<&PluginManifest>) -> Option<String> {
    manifest
        .and_then(|m| m.name.as_deref())
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .or_else(|| dir.file_name().and_then(|n| n.to_str()))
        .map(String::from)
}

fn read_document(file: &DocumentFile) -> Result<Parsed> {
    let content = std::fs::read_to_string(&file.path)?;
    match file.mode {
        InvocationMode::ExplicitCommand => parse::parse_command(&content, &file.path),
        InvocationMode::ModelInvokedSkill => parse::parse_skill(&content, &file.path),
    }
}
