/*
[INPUT]:  CLI arguments, YAML configuration file, FIRETODO_* environment
[OUTPUT]: Interactive todo session against the configured Firebase project
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use firetodo_adapter::{ClientConfig, FirebaseAuth, FirebaseClient, FirestoreStore};
use firetodo_app::{AppConfig, SessionOptions, TodoSession, notify};

#[derive(Parser, Debug)]
#[command(name = "firetodo", version, about = "Todo list synced with a Firebase project")]
struct Cli {
    #[arg(long = "config", value_name = "PATH")]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,
    /// Write logs to a file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Validate configuration and exit
    #[arg(long = "check")]
    check: bool,
    /// Create a configuration file interactively and exit
    #[arg(long = "init", value_name = "PATH", conflicts_with = "check")]
    init: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let _log_guard = init_tracing(&args.log_level, args.log_file.as_deref())?;

    if let Some(output) = args.init {
        return tokio::task::spawn_blocking(move || cli::init::run_init(output))
            .await
            .context("init task")?;
    }

    let config = AppConfig::load(args.config_path.as_deref()).context("load config")?;
    config.validate().context("validate config")?;
    info!(
        project_id = %config.project_id(),
        collection = %config.tasks_collection,
        "configuration loaded"
    );

    if args.check {
        println!("configuration OK");
        return Ok(());
    }

    let client = FirebaseClient::with_config_and_base_urls(
        ClientConfig::default(),
        config.api_key(),
        config.project_id(),
        &config.base_urls(),
    )
    .context("create firebase client")?;

    let auth = Arc::new(match config.session_persistence() {
        Some(persistence) => {
            info!(path = %persistence.path().display(), "sign-in persistence enabled");
            FirebaseAuth::with_persistence(client.clone(), persistence)
        }
        None => FirebaseAuth::new(client.clone()),
    });
    let store = Arc::new(FirestoreStore::new(client, auth.clone()));

    let (notifier, notifications) = notify::channel();
    let session = TodoSession::new(
        auth,
        store,
        notifier,
        SessionOptions {
            collection: config.tasks_collection.clone(),
            ..SessionOptions::default()
        },
    );
    let printer = tokio::spawn(cli::print_notifications(notifications));

    session.init().await;
    let result = cli::interactive::run_interactive(&session).await;

    session.shutdown().await;
    drop(session);
    let _ = printer.await;
    info!("session closed");

    result
}

fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|err| anyhow!(err))
            .context("initialize tracing subscriber")?;
        return Ok(None);
    };

    let file_name = path.file_name().context("log file path must name a file")?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_defaults_to_info() {
        let cli = Cli::try_parse_from(["firetodo"]).unwrap();
        assert_eq!(cli.log_level, "info");
        assert!(cli.config_path.is_none());
        assert!(!cli.check);
    }

    #[test]
    fn test_init_conflicts_with_check() {
        assert!(Cli::try_parse_from(["firetodo", "--check", "--init", "out.yaml"]).is_err());
    }
}
