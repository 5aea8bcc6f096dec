mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use flowbot_messaging::{ChatId, MessageTransport, RecordingTransport, TelegramClient};
use flowbot_workflow::{BotIdentity, ExecutionContext, ExecutionResult, WorkflowEngine};

use crate::config::RunnerConfig;
use crate::error::RunnerError;

#[derive(Parser, Debug)]
#[command(
    name = "flowbot-runner",
    version,
    about = "Run a chat workflow definition against a single message"
)]
struct Cli {
    /// Path to the workflow definition JSON
    #[arg(short, long)]
    definition: PathBuf,

    /// Incoming message text (callback data with --callback)
    #[arg(short, long, default_value = "/start")]
    text: String,

    /// Chat to reply into
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    chat_id: i64,

    /// Display name of the sender
    #[arg(long)]
    user_name: Option<String>,

    /// Treat the text as an inline button tap
    #[arg(long)]
    callback: bool,

    /// Log outbound messages instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Path to a config file
    #[arg(short, long, env = "FLOWBOT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match RunnerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli, &config).await {
        Ok(result) if result.is_failed() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(report) => {
            error!(error = %report, "runner failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: &RunnerConfig) -> flowbot_core::Result<ExecutionResult, RunnerError> {
    let definition =
        std::fs::read_to_string(&cli.definition).map_err(|e| RunnerError::ReadDefinition {
            path: cli.definition.display().to_string(),
            reason: e.to_string(),
        })?;

    let token = config.telegram.token.clone().unwrap_or_default();
    let transport: Arc<dyn MessageTransport> = if cli.dry_run {
        Arc::new(RecordingTransport::new())
    } else {
        if token.is_empty() {
            return Err(RunnerError::MissingToken.into());
        }
        let client = TelegramClient::with_settings(token.as_str(), &config.telegram.settings())
            .map_err(|e| RunnerError::Transport {
                reason: e.to_string(),
            })?;
        Arc::new(client)
    };

    let mut context = ExecutionContext::new(ChatId(cli.chat_id), cli.text.as_str())
        .with_bot(BotIdentity { id: None, token })
        .with_callback(cli.callback);
    if let Some(user_name) = &cli.user_name {
        context = context.with_user_name(user_name.as_str());
    }

    info!(
        definition = %cli.definition.display(),
        chat_id = %context.chat_id,
        dry_run = cli.dry_run,
        "running workflow"
    );
    let result = WorkflowEngine::new(transport)
        .run_definition(Some(&definition), &context)
        .await;
    info!(status = %result.status, steps = result.steps.len(), "workflow finished");

    let json = serde_json::to_string_pretty(&result).map_err(|e| RunnerError::Output {
        reason: e.to_string(),
    })?;
    println!("{json}");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "flowbot-runner",
            "--definition",
            "flow.json",
            "--text",
            "hello",
            "--chat-id",
            "-100123",
            "--callback",
            "--dry-run",
        ])
        .expect("parse");

        assert_eq!(cli.definition, PathBuf::from("flow.json"));
        assert_eq!(cli.text, "hello");
        assert_eq!(cli.chat_id, -100_123);
        assert!(cli.callback);
        assert!(cli.dry_run);
    }

    #[test]
    fn text_defaults_to_start() {
        let cli = Cli::try_parse_from(["flowbot-runner", "-d", "flow.json"]).expect("parse");
        assert_eq!(cli.text, "/start");
        assert!(!cli.dry_run);
    }
}
