//! Surveyor CLI, the main entry point.
//!
//! Commands:
//! - `onboard`  Write a default config
//! - `chat`     Interactive conversation with the assistant
//! - `ask`      Single question, Ctrl-C cancels
//! - `analyze`  Check a question's wording offline
//! - `compare`  Look a variable up across surveys
//! - `doctor`   Diagnose config, data and provider

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "surveyor",
    about = "Surveyor: an assistant for designing survey questions",
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
    Chat,

    /// Ask a single question
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,
    },

    /// Check a survey question for common wording problems
    Analyze {
        /// The question text
        question: String,
    },

    /// Show how a variable appears across surveys
    Compare {
        /// Variable name, e.g. jobsat
        varname: String,
    },

    /// Diagnose configuration, data files and provider
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat => commands::chat::run().await?,
        Commands::Ask { message } => commands::ask::run(message).await?,
        Commands::Analyze { question } => commands::analyze::run(&question)?,
        Commands::Compare { varname } => commands::compare::run(&varname)?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
