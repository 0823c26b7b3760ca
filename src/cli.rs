use std::{io::IsTerminal, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};

use crate::{
    account,
    events::{EventSink, ViewEvent},
    polling::{ResultsState, ViewStatus},
    render::Renderer,
    settings::SettingsStore,
    AppState,
};

/// Scan websites for accessibility and SEO issues.
#[derive(Parser, Debug)]
#[command(name = "siteaudit", version, about = "Website accessibility and SEO audits")]
pub struct Cli {
    /// Path to the settings file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show,
    /// Store the API token used for signed-in requests
    SetToken { token: String },
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new scan and wait for its results
    Scan { url: String },

    /// Wait for an existing analysis to finish
    Results { analysis_id: String },

    /// Show the last results kept in the session cache
    Show,

    /// Show the report for an analysis
    Report { analysis_id: String },

    /// Unlock the detailed report for an analysis
    Upgrade { analysis_id: String },

    /// Download the detailed report as PDF
    Download {
        analysis_id: String,
        /// Output file. Defaults to `siteaudit-<id>.pdf`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Permanently delete the signed-in account
    DeleteAccount,

    /// Inspect or update settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Prints poll progress and notices to stderr while a command runs.
pub struct TerminalSink {
    renderer: Renderer,
}

impl TerminalSink {
    pub fn new(renderer: Renderer) -> Self {
        Self { renderer }
    }
}

impl EventSink for TerminalSink {
    fn emit(&self, event: ViewEvent) {
        debug!("view event: {}", event.name());
        match event {
            ViewEvent::AnalysisUpdated {
                analysis,
                attempt,
                max_attempts,
            } => eprintln!("{}", self.renderer.progress(&analysis, attempt, max_attempts)),
            ViewEvent::Notice { message } => eprintln!("! {message}"),
            ViewEvent::PollFinished { .. } | ViewEvent::ReportChanged { .. } => {}
        }
    }
}

pub fn renderer() -> Renderer {
    Renderer::new(std::io::stdout().is_terminal())
}

pub async fn dispatch(command: Commands, app: &AppState) -> Result<()> {
    let renderer = renderer();

    match command {
        Commands::Scan { url } => {
            let analysis_id = app.controller.start_scan(&url).await?;
            println!("Started analysis {analysis_id}");
            let state = wait_for_results(app).await;
            print!("{}", renderer.results(&state));
        }
        Commands::Results { analysis_id } => {
            app.controller.open(&analysis_id).await?;
            let state = wait_for_results(app).await;
            print!("{}", renderer.results(&state));
        }
        Commands::Show => {
            let state = app.controller.restore_cached().await;
            print!("{}", renderer.results(&state));
        }
        Commands::Report { analysis_id } => {
            let state = ensure_report(app, &analysis_id).await?;
            print!("{}", renderer.results(&state));
        }
        Commands::Upgrade { analysis_id } => {
            ensure_report(app, &analysis_id).await?;
            app.controller.upgrade_report().await?;
            print!("{}", renderer.results(&app.controller.snapshot().await));
        }
        Commands::Download {
            analysis_id,
            output,
        } => {
            ensure_report(app, &analysis_id).await?;
            let dest = output.unwrap_or_else(|| default_pdf_path(&analysis_id));
            let written = app.controller.download_report(&dest).await?;
            println!("Saved {written} bytes to {}", dest.display());
        }
        Commands::DeleteAccount => {
            account::delete_account(app.api.as_ref(), &app.cache).await?;
            println!("Your account has been deleted.");
        }
        Commands::Config { command } => config_command(command, &app.settings)?,
    }

    Ok(())
}

/// Waits for the running poll, disposing the view on Ctrl-C.
async fn wait_for_results(app: &AppState) -> ResultsState {
    let state = tokio::select! {
        state = app.controller.wait() => state,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, stopping poll");
            app.controller.dispose().await;
            app.controller.snapshot().await
        }
    };

    if state.status != ViewStatus::Completed {
        return state;
    }

    // The failure is already recorded as a notice on the view.
    if let Err(err) = app.controller.load_report().await {
        warn!("Report unavailable: {err:#}");
    }
    app.controller.snapshot().await
}

/// Attaches to `analysis_id` and fetches the overview report when the
/// cache holds none. A cached detailed report is never downgraded.
async fn ensure_report(app: &AppState, analysis_id: &str) -> Result<ResultsState> {
    let state = app.controller.attach(analysis_id).await?;
    if state.report.is_some() {
        return Ok(state);
    }

    app.controller.load_report().await?;
    Ok(app.controller.snapshot().await)
}

fn default_pdf_path(analysis_id: &str) -> PathBuf {
    let safe: String = analysis_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    PathBuf::from(format!("siteaudit-{safe}.pdf"))
}

pub fn config_command(command: ConfigCommands, settings: &SettingsStore) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let mut effective = settings.effective();
            if effective.api_token.is_some() {
                effective.api_token = Some("********".into());
            }
            println!("# {}", settings.path().display());
            println!(
                "{}",
                serde_json::to_string_pretty(&effective).context("failed to render settings")?
            );
        }
        ConfigCommands::SetToken { token } => {
            settings.update_api_token(Some(token))?;
            println!("Token saved to {}", settings.path().display());
        }
    }
    Ok(())
}
