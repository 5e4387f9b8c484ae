//! Configuration loading and env substitution.
//!
//! Config files: `playbook.toml`, `playbook.yaml`, or `playbook.json`
//! Searched in `./` then `~/.config/playbook/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{LoggingConfig, PlaybookConfig, RegistryConfig},
};
