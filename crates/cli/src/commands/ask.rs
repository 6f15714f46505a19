//! `surveyor ask` answers a single message.

use surveyor_agent::TurnStatus;
use surveyor_core::Error;
use surveyor_core::message::Conversation;
use tokio_util::sync::CancellationToken;

use super::{CliResult, build_orchestrator, load_config};

pub async fn run(message: String) -> CliResult {
    let config = load_config()?;
    let orchestrator = build_orchestrator(&config)?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut conversation = Conversation::new();
    eprint!("  Thinking...");
    let result = orchestrator.run(&mut conversation, &message, &cancel).await;
    eprint!("\r              \r");

    match result {
        Ok(outcome) => {
            println!("{}", outcome.reply);
            if outcome.status != TurnStatus::Answered {
                eprintln!("  [{:?}] after {} model call(s)", outcome.status, outcome.model_calls);
            }
            Ok(())
        }
        Err(Error::Cancelled) => {
            eprintln!("  Cancelled.");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
