mod check_commands;
mod doc_commands;
#[cfg(feature = "file-watcher")]
mod watch_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    playbook_config::{LoggingConfig, PlaybookConfig},
    playbook_registry::{FsRegistryLoader, LoadOptions, RegistryLoader},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "playbook", version, about = "Playbook — command and skill registry")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Overrides RUST_LOG and config.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Root directory to scan. Repeat for several roots; overrides config.
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Config file (default: ./playbook.toml, then ~/.config/playbook/).
    #[arg(long, global = true, env = "PLAYBOOK_CONFIG")]
    config: Option<PathBuf>,

    /// Fail on malformed documents instead of skipping them.
    #[arg(long, global = true, default_value_t = false)]
    strict: bool,

    /// Ignore `.claude-plugin/marketplace.json` and scan directories instead.
    #[arg(long, global = true, default_value_t = false)]
    no_marketplace: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List collections, or the documents of one collection.
    List {
        /// Collection name.
        collection: Option<String>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Show one document: `show <collection> <name>` or `show <collection:name>`.
    Show {
        /// Collection, `collection:name`, or a bare document name.
        reference: String,
        /// Document name when the collection is given separately.
        name: Option<String>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Load the tree and report problems. Exits non-zero on fatal errors.
    Check {
        /// Also show informational diagnostics.
        #[arg(long)]
        verbose: bool,
        /// Treat warnings as failures.
        #[arg(long)]
        deny_warnings: bool,
    },
    /// Print the `<available_skills>` block for model prompts.
    Prompt,
    /// Rescan whenever documents change.
    #[cfg(feature = "file-watcher")]
    Watch,
}

/// Merge config file, environment, and CLI flags (in increasing precedence).
fn resolve_config(cli: &Cli) -> anyhow::Result<PlaybookConfig> {
    let mut config = match &cli.config {
        Some(path) => playbook_config::load_config(path)?,
        None => playbook_config::discover_and_load(),
    };
    playbook_config::apply_env_overrides(&mut config);

    if !cli.roots.is_empty() {
        config.registry.roots = cli.roots.clone();
    }
    if cli.strict {
        config.registry.strict = true;
    }
    if cli.no_marketplace {
        config.registry.use_marketplace = false;
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    Ok(config)
}

/// Filter directive: `--log-level`, then `RUST_LOG`, then the config file.
fn filter_directive(flag: Option<&str>, rust_log: Option<String>, configured: &str) -> String {
    flag.map(String::from)
        .or_else(|| rust_log.filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| configured.to_string())
}

/// Initialise tracing. Logs go to stderr so stdout stays parseable.
fn init_telemetry(logging: &LoggingConfig, level_flag: Option<&str>) {
    let directive = filter_directive(
        level_flag,
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        &logging.level,
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("invalid log filter '{directive}': {e}; using info");
        EnvFilter::new("info")
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn loader(config: &PlaybookConfig) -> FsRegistryLoader {
    FsRegistryLoader::new(
        config.registry.roots.clone(),
        LoadOptions {
            strict: config.registry.strict,
            use_marketplace: config.registry.use_marketplace,
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    init_telemetry(&config.logging, cli.log_level.as_deref());
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        roots = ?config.registry.roots,
        "playbook starting"
    );

    let loader = loader(&config);
    match cli.command {
        Commands::List { collection, json } => {
            let report = loader.load().await?;
            doc_commands::handle_list(&report.registry, collection.as_deref(), json)
        },
        Commands::Show {
            reference,
            name,
            json,
        } => {
            let report = loader.load().await?;
            doc_commands::handle_show(&report.registry, &reference, name.as_deref(), json)
        },
        Commands::Check {
            verbose,
            deny_warnings,
        } => check_commands::check(loader.load().await, verbose, deny_warnings),
        Commands::Prompt => {
            let report = loader.load().await?;
            doc_commands::handle_prompt(&report.registry);
            Ok(())
        },
        #[cfg(feature = "file-watcher")]
        Commands::Watch => watch_commands::watch(&loader).await,
    }
}
