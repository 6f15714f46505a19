//! `surveyor chat` runs an interactive session.
//!
//! The session keeps role-tagged history and hands it to the orchestrator
//! with each new message, the same way a chat front end would.

use std::io::Write;

use surveyor_core::message::HistoryRecord;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CliResult, build_orchestrator, load_config};

pub async fn run() -> CliResult {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;

    println!();
    println!("  Surveyor: interactive mode");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Tools:     find_related_words, search_survey_questions,");
    println!("             analyze_question, compare_across_surveys");
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut history: Vec<HistoryRecord> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "exit" | "quit") {
            break;
        }

        eprint!("  ...");
        match orchestrator.respond(&history, message).await {
            Ok(reply) => {
                eprint!("\r     \r");
                println!();
                for line in reply.lines() {
                    println!("  Assistant > {line}");
                }
                println!();
                history.push(HistoryRecord::new("user", message));
                history.push(HistoryRecord::new("assistant", reply));
            }
            Err(e) => {
                eprint!("\r     \r");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}
