use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::{ConversationController, ConversationUpdate, SendOutcome};
use crate::domain::Role;

const PROMPT: &str = "You: ";

/// Interactive chat on stdin/stdout.
///
/// Replies stream onto the terminal as updates arrive. `/clear` resets the
/// conversation, `/exit` quits and Ctrl-C aborts the reply in flight.
pub async fn run_interactive(mut controller: ConversationController) -> Result<()> {
    println!(
        "Chatting with '{}'. Type /clear to start over, /exit or Ctrl-D to quit.",
        controller.model()
    );

    let updates = controller.subscribe();
    let renderer = tokio::spawn(render_updates(updates));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt()?;

    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match line.trim() {
            "/exit" | "/quit" => break,
            "/clear" => {
                controller.clear()?;
                println!("Conversation cleared.");
                print_prompt()?;
                continue;
            }
            _ => {}
        }

        let cancel = CancellationToken::new();
        let interrupt = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        let outcome = controller.send_with_cancel(&line, cancel).await;
        interrupt.abort();

        if outcome.is_ignored() {
            print_prompt()?;
        }
    }

    drop(controller);
    renderer.await.context("Renderer task failed")?;
    println!();
    Ok(())
}

/// Send one prompt and print the final reply. Errors if the send failed,
/// after printing the fallback reply.
pub async fn run_single(mut controller: ConversationController, prompt: &str) -> Result<()> {
    let spinner = spinner();
    let outcome = controller.send(prompt).await;
    spinner.finish_and_clear();

    let reply = controller
        .state()
        .messages()
        .last()
        .filter(|m| m.role() == Role::Assistant)
        .map(|m| m.content().to_string());

    match outcome {
        SendOutcome::Ignored => Err(anyhow!("Nothing to send")),
        SendOutcome::Completed => {
            println!("{}", reply.unwrap_or_default());
            Ok(())
        }
        SendOutcome::Failed(e) => {
            println!("{}", reply.unwrap_or_default());
            Err(anyhow!(e).context("Chat request failed"))
        }
    }
}

/// Print updates as they arrive. Streamed content is written as deltas;
/// a replacement that does not extend what was printed starts a new line.
async fn render_updates(mut updates: mpsc::UnboundedReceiver<ConversationUpdate>) {
    let mut spinner: Option<ProgressBar> = None;
    let mut printed = String::new();

    while let Some(update) = updates.recv().await {
        match update {
            ConversationUpdate::MessageAppended(message) if message.role() == Role::Assistant => {
                printed.clear();
                spinner = Some(self::spinner());
            }
            ConversationUpdate::MessageAppended(_) => {}
            ConversationUpdate::ContentUpdated { content, .. } => {
                if let Some(s) = spinner.take() {
                    s.finish_and_clear();
                    print!("Assistant: ");
                }
                match content.strip_prefix(printed.as_str()) {
                    Some(delta) => print!("{}", delta),
                    None => print!("\nAssistant: {}", content),
                }
                printed = content;
                let _ = std::io::stdout().flush();
            }
            ConversationUpdate::ErrorRecorded(error) => {
                if let Some(s) = spinner.as_ref() {
                    s.suspend(|| eprintln!("Error: {}", error));
                } else {
                    eprintln!("\nError: {}", error);
                }
            }
            ConversationUpdate::LoadingChanged(true) => {}
            ConversationUpdate::LoadingChanged(false) => {
                if let Some(s) = spinner.take() {
                    s.finish_and_clear();
                }
                println!("\n");
            }
            ConversationUpdate::InputReady => {
                let _ = print_prompt();
            }
            ConversationUpdate::Cleared => {
                printed.clear();
                debug!("Conversation cleared");
            }
        }
    }
}

fn print_prompt() -> Result<()> {
    print!("{}", PROMPT);
    std::io::stdout().flush().context("Failed to flush stdout")
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
        .template("{spinner} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message("Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}
