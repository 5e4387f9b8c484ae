use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybookConfig {
    pub registry: RegistryConfig,
    pub logging: LoggingConfig,
}

/// Where documents live and how strictly they are loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Root directories to scan. Relative paths resolve against the config file.
    pub roots: Vec<PathBuf>,
    /// Treat malformed documents as fatal instead of skipping them.
    pub strict: bool,
    /// Honour `.claude-plugin/marketplace.json` listings.
    #[serde(default = "default_true")]
    pub use_marketplace: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            strict: false,
            use_marketplace: true,
        }
    }
}

impl RegistryConfig {
    /// Make relative roots absolute against `base` (the config file's directory).
    pub fn resolve_roots(&mut self, base: &Path) {
        for root in &mut self.roots {
            if root.is_relative() {
                *root = base.join(&*root);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scan_current_dir() {
        let cfg = PlaybookConfig::default();
        assert_eq!(cfg.registry.roots, vec![PathBuf::from(".")]);
        assert!(!cfg.registry.strict);
        assert!(cfg.registry.use_marketplace);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let cfg: PlaybookConfig = toml::from_str("[registry]\nstrict = true\n").unwrap();
        assert!(cfg.registry.strict);
        assert!(cfg.registry.use_marketplace);
        assert_eq!(cfg.registry.roots, vec![PathBuf::from(".")]);
        assert!(!cfg.logging.json);
    }

    #[test]
    fn resolve_roots_only_touches_relative_paths() {
        let mut registry = RegistryConfig {
            roots: vec![PathBuf::from("plugins"), PathBuf::from("/abs/docs")],
            ..RegistryConfig::default()
        };
        registry.resolve_roots(Path::new("/etc/playbook"));
        assert_eq!(
            registry.roots,
            vec![
                PathBuf::from("/etc/playbook/plugins"),
                PathBuf::from("/abs/docs")
            ]
        );
    }
}
