//! autochat CLI — the main entry point.
//!
//! Commands:
//! - `chat`    — Single message or interactive chat
//! - `agent`   — Run the task-management agent on an objective
//! - `onboard` — Write a default config file

use std::num::{NonZeroU32, NonZeroUsize};
use std::path::PathBuf;

use autochat_agent::ContentType;
use autochat_config::AppConfig;
use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(
    name = "autochat",
    about = "autochat — LLM chat assistant and task-management agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// System prompt preset: general, email, code, blog, todoist or custom
        #[arg(long, default_value = "general")]
        content_type: ContentType,

        /// Extra instructions appended to the system prompt
        #[arg(long)]
        prompt: Option<String>,

        /// Text file to include as context (repeatable)
        #[arg(long = "document", value_name = "PATH")]
        documents: Vec<PathBuf>,

        /// Sampling temperature (overrides config)
        #[arg(long)]
        temperature: Option<f32>,

        /// Messages sent per request, system prompt included (overrides config)
        #[arg(long)]
        history_len: Option<NonZeroUsize>,
    },

    /// Let the agent work on an objective against your task list
    Agent {
        /// What the agent should achieve
        objective: String,

        /// Maximum tool invocations (overrides config)
        #[arg(long)]
        max_actions: Option<NonZeroU32>,

        /// Use an in-memory sample board instead of Todoist
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Commands::Onboard = cli.command {
        logging::init(cli.verbose, None);
        return commands::onboard::run().await;
    }

    let config = AppConfig::load()?;
    let log_file = config.logging.file.as_ref().map(|file| {
        if file.is_relative() {
            AppConfig::config_dir().join(file)
        } else {
            file.clone()
        }
    });
    let _guard = logging::init(cli.verbose, log_file.as_deref());

    match cli.command {
        Commands::Onboard => {}
        Commands::Chat {
            message,
            content_type,
            prompt,
            documents,
            temperature,
            history_len,
        } => {
            let args = commands::chat::ChatArgs {
                message,
                content_type,
                prompt,
                documents,
                temperature,
                history_len,
            };
            commands::chat::run(&config, args).await?
        }
        Commands::Agent {
            objective,
            max_actions,
            dry_run,
        } => commands::agent::run(&config, &objective, max_actions, dry_run).await?,
    }

    Ok(())
}
