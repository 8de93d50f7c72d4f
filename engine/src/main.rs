// Recall
// Main entry point for the recall binary

use clap::Parser;
use recall_engine::cli::{Cli, Command, SecretAction};
use recall_engine::config::Config;
use recall_engine::handlers::{
    handle_ask, handle_chat, handle_demo, handle_eval, handle_secret_remove, handle_secret_set,
    handle_tools, OutputFormat,
};
use recall_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Credentials may come from a .env file in the working directory
    dotenvy::dotenv().ok();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Evaluation needs neither configuration nor credentials
    if let Some(Command::Eval { expression }) = &cli.command {
        return handle_eval(expression.clone(), format);
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_or_create_at(path)?,
        None => Config::load_or_create()?,
    };
    if let Some(level) = &cli.log {
        config.core.log_level = level.clone();
    }

    // RUST_LOG still takes precedence over both
    init_telemetry_with_level(&config.core.log_level, config.core.log_file.as_deref())?;

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");
    tracing::info!("Recall v{} ({} - {})", version, commit, timestamp);

    let user_id = cli.user.clone().unwrap_or_else(|| config.session.user_id.clone());

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => handle_chat(&config, &user_id).await,

        Command::Ask { query } => handle_ask(query, &config, &user_id, format).await,

        Command::Demo => handle_demo(&config, &user_id, format).await,

        Command::Tools => handle_tools(&config, format).await,

        Command::Eval { expression } => handle_eval(expression, format),

        Command::Secret { action } => match action {
            SecretAction::Set { name, value } => handle_secret_set(name, value),
            SecretAction::Remove { name } => handle_secret_remove(name),
        },
    }
}
