pub mod account;
pub mod api;
pub mod cli;
pub mod events;
pub mod models;
pub mod polling;
pub mod render;
pub mod report;
pub mod scoring;
pub mod settings;
pub mod store;
mod utils;

use std::{process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};

use api::{AnalysisApi, ApiClientConfig, HttpApiClient};
use cli::{Cli, Commands, TerminalSink};
use polling::{PollConfig, ResultsController};
use settings::SettingsStore;
use store::{ResultsCache, SqliteStore};

const DEBUG_ENV: &str = "SITEAUDIT_DEBUG";

pub struct AppState {
    pub api: Arc<dyn AnalysisApi>,
    pub cache: ResultsCache,
    pub controller: ResultsController,
    pub settings: SettingsStore,
}

impl AppState {
    pub fn new(settings: SettingsStore) -> Result<Self> {
        let effective = settings.effective();
        effective.validate()?;

        let api: Arc<dyn AnalysisApi> = Arc::new(
            HttpApiClient::new(ApiClientConfig::from(&effective))
                .context("Failed to configure API client")?,
        );
        let store = SqliteStore::open(effective.resolved_store_path())?;
        let cache = ResultsCache::new(Arc::new(store));

        let controller = ResultsController::new(
            api.clone(),
            cache.clone(),
            Arc::new(TerminalSink::new(cli::renderer())),
            PollConfig {
                interval: effective.poll_interval(),
                max_attempts: effective.max_attempts,
            },
        );

        Ok(Self {
            api,
            cache,
            controller,
            settings,
        })
    }
}

fn init_logging() {
    let debug = std::env::var(DEBUG_ENV)
        .map(|value| matches!(value.trim(), "1" | "true"))
        .unwrap_or(false);
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // RUST_LOG still refines individual modules.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

async fn run_command(cli: Cli) -> Result<()> {
    let path = match cli.config {
        Some(path) => path,
        None => SettingsStore::default_path()?,
    };
    let settings = SettingsStore::new(path)?;

    match cli.command {
        // Settings edits must work even when the API settings are broken.
        Commands::Config { command } => cli::config_command(command, &settings),
        command => {
            let app = AppState::new(settings)?;
            cli::dispatch(command, &app).await
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    info!("siteaudit {} starting", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("Failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run_command(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Top-level context is the user-facing message.
            eprintln!("{err}");
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
