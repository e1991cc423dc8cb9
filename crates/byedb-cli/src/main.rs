mod cli;
mod repl;

use std::process::ExitCode;
use std::sync::Arc;

use byedb_ai::BackendPool;
use byedb_common::UserId;
use byedb_config::schema::LoggingConfig;
use byedb_config::ByedbConfig;
use byedb_session::{InMemorySqlite, QueryService};
use tracing_subscriber::EnvFilter;

/// Load environment variables from a .env file (KEY=VALUE lines).
/// Variables already set in the process win.
fn load_dotenv() {
    let manifest_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        std::path::PathBuf::from(".env"),
        // Workspace root, two levels up from crates/byedb-cli/
        manifest_dir.join("..").join("..").join(".env"),
    ];

    for path in &candidates {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if std::env::var(key).is_err() {
                        std::env::set_var(key, value);
                    }
                }
            }
            return;
        }
    }
}

/// `--log-level` beats `RUST_LOG`, which beats the config file.
fn init_logging(flag: Option<&str>, logging: &LoggingConfig) {
    let fallback = || EnvFilter::new(logging.level.directive());
    let filter = match flag {
        Some(level) => EnvFilter::try_new(format!("byedb={level}")).unwrap_or_else(|_| fallback()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    let args = cli::parse();

    let loaded = match &args.config {
        Some(path) => byedb_config::load_config_from(path),
        None => byedb_config::load_config(),
    };
    let (config, load_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) if args.config.is_none() => (ByedbConfig::default(), Some(e)),
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    if args.print_config {
        if let Some(e) = load_error {
            eprintln!("Config load failed, showing defaults: {e}");
        }
        println!("{}", byedb_config::config_to_json(&config));
        return ExitCode::SUCCESS;
    }

    init_logging(args.log_level.as_deref(), &config.logging);
    tracing::info!("ByeDB v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        tracing::warn!("Config load failed, using defaults: {e}");
    }

    let pool = match BackendPool::from_config(&config) {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            tracing::error!("Failed to set up backends: {e}");
            return ExitCode::FAILURE;
        }
    };
    if pool.is_empty() {
        tracing::warn!(
            "No backends configured; set {} or {} or add [[backends]] to the config",
            byedb_config::env::GEMINI_KEYS_VAR,
            byedb_config::env::GITHUB_TOKENS_VAR,
        );
    }
    tracing::info!(backends = pool.len(), "Backend pool ready");

    let service = QueryService::from_config(&config, pool.clone(), Arc::new(InMemorySqlite));
    let mode = args.mode.unwrap_or(config.agent.default_mode);
    repl::Repl::new(service, pool, UserId::from(args.user), mode)
        .run()
        .await;

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
