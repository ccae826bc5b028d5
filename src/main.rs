mod client;
mod config;
mod controller;
mod error;
mod events;
mod logging;
mod response;
mod session;
#[cfg(test)]
mod testing;
mod ui;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{HttpQueryService, QueryService};
use crate::config::Config;
use crate::controller::ConversationController;
use crate::events::{SubmitOrigin, SubmitOutcome};
use crate::session::SessionId;
use crate::ui::conversation::ConversationManager;
use crate::ui::conversation::history::plain_text;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(version)]
#[command(about = "Chat with an agentic RAG service from the terminal", long_about = None)]
struct Cli {
    /// Base address of the query service
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Session id to use instead of a generated one
    #[arg(long, global = true)]
    session: Option<String>,

    /// Config file (defaults to ~/.ragchat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Clear the server-side memory of a session
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.base_url, cli.session);

    match cli.command {
        None => run_tui(config).await,
        Some(Commands::Ask { question }) => {
            logging::init_stderr()?;
            ask_once(&config, &question.join(" ")).await
        }
        Some(Commands::Reset) => {
            logging::init_stderr()?;
            reset_remote(&config).await
        }
    }
}

async fn run_tui(config: Config) -> Result<()> {
    let _log_guard = logging::init_file(&config.logs_dir())?;

    let service = HttpQueryService::new(&config).context("Failed to create HTTP client")?;
    let session = SessionId::from_user(config.session_id.as_deref());
    tracing::info!(session = %session, base_url = %service.base_url(), "starting chat");

    let controller = ConversationController::new(Arc::new(service), session);
    let manager = ConversationManager::new(controller, config.service_url(), config.ui.show_facts);

    ui::app::run(manager, Duration::from_millis(config.ui.tick_rate_ms)).await
}

async fn ask_once(config: &Config, question: &str) -> Result<()> {
    let service = HttpQueryService::new(config).context("Failed to create HTTP client")?;
    let session = SessionId::from_user(config.session_id.as_deref());
    let mut controller = ConversationController::new(Arc::new(service), session);

    if !controller.submit(question, SubmitOrigin::Composer) {
        bail!("question is empty");
    }

    match controller.wait().await {
        Some(SubmitOutcome::Appended { index }) => {
            print!("{}", plain_text(&controller.history()[index], config.ui.show_facts));
            Ok(())
        }
        Some(SubmitOutcome::Failed(err)) => Err(anyhow::Error::from(err)
            .context(format!("Failed to ask {}", config.service_url()))),
        None => bail!("no request was in flight"),
    }
}

async fn reset_remote(config: &Config) -> Result<()> {
    let Some(session_id) = config.session_id.as_deref() else {
        bail!("reset needs a session id: pass --session or set session_id in the config file");
    };

    let service = HttpQueryService::new(config).context("Failed to create HTTP client")?;
    let session = SessionId::from_user(Some(session_id));
    service
        .reset_session(&session)
        .await
        .with_context(|| format!("Failed to reset session '{session}'"))?;

    println!("Session '{session}' reset.");
    Ok(())
}
