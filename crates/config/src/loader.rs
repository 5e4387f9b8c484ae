use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::PlaybookConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "playbook.toml",
    "playbook.yaml",
    "playbook.yml",
    "playbook.json",
];

/// Load config from the given path (any supported format).
///
/// Relative registry roots are resolved against the file's directory.
pub fn load_config(path: &Path) -> anyhow::Result<PlaybookConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    let mut config = parse_config(&raw, path)?;
    if let Some(base) = path.parent() {
        config.registry.resolve_roots(base);
    }
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./playbook.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/playbook/playbook.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PlaybookConfig::default()` if no config file is found.
pub fn discover_and_load() -> PlaybookConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    PlaybookConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/playbook/
    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/playbook/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "playbook").map(|d| d.config_dir().to_path_buf())
}

/// Apply `PLAYBOOK_*` environment variables on top of a loaded config.
///
/// - `PLAYBOOK_ROOT`: search-path style list of roots (replaces config roots)
/// - `PLAYBOOK_STRICT`: `1`/`true` enables strict loading
/// - `PLAYBOOK_LOG_JSON`: `1`/`true` switches to JSON logs
pub fn apply_env_overrides(config: &mut PlaybookConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut PlaybookConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(roots) = lookup("PLAYBOOK_ROOT").filter(|v| !v.trim().is_empty()) {
        config.registry.roots = std::env::split_paths(&roots).collect();
    }
    if let Some(strict) = lookup("PLAYBOOK_STRICT") {
        config.registry.strict = is_truthy(&strict);
    }
    if let Some(json) = lookup("PLAYBOOK_LOG_JSON") {
        config.logging.json = is_truthy(&json);
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PlaybookConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_toml_and_resolves_roots() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("playbook.toml");
        std::fs::write(
            &path,
            "[registry]\nroots = [\"plugins\"]\nstrict = true\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.registry.roots, vec![tmp.path().join("plugins")]);
        assert!(cfg.registry.strict);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn loads_yaml_and_json() {
        let tmp = tempfile::tempdir().unwrap();

        let yaml = tmp.path().join("playbook.yaml");
        std::fs::write(&yaml, "registry:\n  use_marketplace: false\n").unwrap();
        assert!(!load_config(&yaml).unwrap().registry.use_marketplace);

        let json = tmp.path().join("playbook.json");
        std::fs::write(&json, r#"{"logging":{"json":true}}"#).unwrap();
        assert!(load_config(&json).unwrap().logging.json);
    }

    #[test]
    fn rejects_unknown_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("playbook.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/playbook.toml")).is_err());
    }

    #[test]
    fn env_overrides_replace_values() {
        let mut cfg = PlaybookConfig::default();
        let lookup = |name: &str| match name {
            "PLAYBOOK_ROOT" => Some("/a/plugins".to_string()),
            "PLAYBOOK_STRICT" => Some("true".to_string()),
            "PLAYBOOK_LOG_JSON" => Some("0".to_string()),
            _ => None,
        };
        apply_env_overrides_with(&mut cfg, lookup);
        assert_eq!(cfg.registry.roots, vec![PathBuf::from("/a/plugins")]);
        assert!(cfg.registry.strict);
        assert!(!cfg.logging.json);
    }

    #[test]
    fn blank_root_override_is_ignored() {
        let mut cfg = PlaybookConfig::default();
        apply_env_overrides_with(&mut cfg, |name| {
            (name == "PLAYBOOK_ROOT").then(|| "  ".to_string())
        });
        assert_eq!(cfg.registry.roots, vec![PathBuf::from(".")]);
    }
}
