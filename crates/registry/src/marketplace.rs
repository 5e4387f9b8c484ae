//! Marketplace listings.
//!
//! A root may carry `.claude-plugin/marketplace.json` enumerating the
//! collections it distributes. When present, the listing decides which
//! plugin directories are loaded and in what order.

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::{error::Result, formats::PluginAuthor};

/// Relative location of the marketplace listing inside a root.
pub const MARKETPLACE_MANIFEST: &str = ".claude-plugin/marketplace.json";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Marketplace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub owner: Option<PluginAuthor>,
    #[serde(default)]
    pub metadata: MarketplaceMetadata,
    #[serde(default)]
    pub plugins: Vec<MarketplaceEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketplaceMetadata {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Base directory prepended to bare relative plugin sources.
    #[serde(default, rename = "pluginRoot")]
    pub plugin_root: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketplaceEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub source: PluginSource,
}

/// Where a listed plugin lives. Only local paths can be loaded.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PluginSource {
    Path(String),
    /// `{ "source": "github", "repo": "..." }` and similar remote forms.
    Remote(serde_json::Value),
}

/// Outcome of resolving one marketplace entry against its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLocation {
    Local(PathBuf),
    Missing(PathBuf),
    Remote(String),
    Invalid(String),
}

/// Read `.claude-plugin/marketplace.json` from a root. `Ok(None)` when absent.
pub fn read_marketplace(root: &Path) -> Result<Option<Marketplace>> {
    let path = root.join(MARKETPLACE_MANIFEST);
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

impl Marketplace {
    /// Resolve an entry's source to a directory under `root`.
    pub fn locate(&self, root: &Path, entry: &MarketplaceEntry) -> EntryLocation {
        let raw = match &entry.source {
            PluginSource::Path(p) => p.as_str(),
            PluginSource::Remote(v) => {
                let kind = v
                    .get("source")
                    .and_then(|s| s.as_str())
                    .unwrap_or("unknown");
                return EntryLocation::Remote(kind.to_string());
            },
        };

        let rel = Path::new(raw);
        if rel
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return EntryLocation::Invalid(format!("source '{raw}' escapes the marketplace root"));
        }

        let base = match &self.metadata.plugin_root {
            Some(plugin_root) if !raw.starts_with("./") => root.join(plugin_root),
            _ => root.to_path_buf(),
        };
        let dir: PathBuf = base
            .join(rel)
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();

        if dir.is_dir() {
            EntryLocation::Local(dir)
        } else {
            EntryLocation::Missing(dir)
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn marketplace(json: &str) -> Marketplace {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_read_marketplace_absent() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(read_marketplace(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_read_marketplace() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".claude-plugin")).unwrap();
        std::fs::write(
            tmp.path().join(MARKETPLACE_MANIFEST),
            r#"{"name":"team-tools","owner":{"name":"Platform"},"plugins":[{"name":"frontend","source":"./plugins/frontend"}]}"#,
        )
        .unwrap();
        let m = read_marketplace(tmp.path()).unwrap().unwrap();
        assert_eq!(m.name.as_deref(), Some("team-tools"));
        assert_eq!(m.owner.unwrap().name(), "Platform");
        assert_eq!(m.plugins.len(), 1);
    }

    #[test]
    fn test_locate_local_and_missing() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("plugins/frontend")).unwrap();
        let m = marketplace(
            r#"{"plugins":[
                {"name":"frontend","source":"./plugins/frontend"},
                {"name":"backend","source":"./plugins/backend"}
            ]}"#,
        );
        assert_eq!(
            m.locate(tmp.path(), &m.plugins[0]),
            EntryLocation::Local(tmp.path().join("plugins/frontend"))
        );
        assert_eq!(
            m.locate(tmp.path(), &m.plugins[1]),
            EntryLocation::Missing(tmp.path().join("plugins/backend"))
        );
    }

    #[test]
    fn test_locate_plugin_root() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("plugins/testing")).unwrap();
        let m = marketplace(
            r#"{"metadata":{"pluginRoot":"./plugins"},"plugins":[{"name":"testing","source":"testing"}]}"#,
        );
        assert_eq!(
            m.locate(tmp.path(), &m.plugins[0]),
            EntryLocation::Local(tmp.path().join("plugins/testing"))
        );
    }

    #[test]
    fn test_locate_remote() {
        let m = marketplace(
            r#"{"plugins":[{"name":"ext","source":{"source":"github","repo":"acme/ext"}}]}"#,
        );
        assert_eq!(
            m.locate(Path::new("/root"), &m.plugins[0]),
            EntryLocation::Remote("github".into())
        );
    }

    #[test]
    fn test_locate_rejects_escape() {
        let m = marketplace(r#"{"plugins":[{"name":"x","source":"../elsewhere"}]}"#);
        assert!(matches!(
            m.locate(Path::new("/root"), &m.plugins[0]),
            EntryLocation::Invalid(_)
        ));
    }
}
