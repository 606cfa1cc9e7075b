//! Chat loop orchestration: health check, banner, input loop, and the
//! send-then-fetch exchange for each query.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use uuid::Uuid;

use agentline_types::conversation::{AgentRequest, MessageType};

use crate::cli::client::AgentClient;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

pub const CLI_USER_ID: &str = "cli-user";

pub fn new_session_id() -> String {
    format!("cli-session-{}", Uuid::new_v4())
}

fn new_request_id() -> String {
    format!("cli-request-{}", Uuid::new_v4())
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Run a chat against the service behind `client`.
///
/// With `query` set, sends that one query and returns; otherwise runs the
/// interactive loop.
pub async fn run_chat(
    client: &AgentClient,
    session_id: Option<String>,
    query: Option<String>,
) -> anyhow::Result<()> {
    let health = match client.health().await {
        Ok(health) => health,
        Err(e) => {
            eprintln!();
            eprintln!("  {} Agent is not running at {}", style("!").red().bold(), client.base_url());
            eprintln!(
                "  Start it with: {}",
                style("agentline serve").yellow()
            );
            eprintln!();
            return Err(e);
        }
    };
    debug!(version = %health.version, "agent service is up");

    let renderer = ChatRenderer::new();
    let mut session_id = session_id.unwrap_or_else(new_session_id);

    if let Some(query) = query {
        println!("  {} {}", style("Session ID:").blue().bold(), session_id);
        println!("  {} {}", style("Query:").green().bold(), query);
        exchange(client, &renderer, &session_id, &query).await;
        return Ok(());
    }

    print_welcome_banner(client.base_url(), &health.version, &session_id);

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) = ChatInput::new(prompt)
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("  {}", style("Type 'exit' or press Ctrl+D to leave.").dim());
                continue;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                match commands::parse(&text) {
                    Some(ChatCommand::Exit) => break,
                    Some(ChatCommand::Help) => commands::print_help(),
                    Some(ChatCommand::Clear) => chat_input.clear(),
                    Some(ChatCommand::New) => {
                        session_id = new_session_id();
                        println!("\n  {} {}\n", style("New session:").bold(), style(&session_id).dim());
                    }
                    Some(ChatCommand::Session) => {
                        println!("\n  {} {}\n", style("Session:").bold(), session_id);
                    }
                    Some(ChatCommand::History) => print_history(client, &session_id).await,
                    Some(ChatCommand::Unknown(name)) => {
                        println!(
                            "\n  {} Unknown command: {}. Type /help for available commands.\n",
                            style("?").yellow().bold(),
                            style(name).dim()
                        );
                    }
                    None => exchange(client, &renderer, &session_id, &text).await,
                }
            }
        }
    }

    chat_input.flush();
    println!("\n  {}", style("Exiting session. Goodbye!").blue().bold());
    Ok(())
}

/// Send one query and render the reply. Failures are printed, not returned,
/// so the loop keeps going.
async fn exchange(client: &AgentClient, renderer: &ChatRenderer, session_id: &str, query: &str) {
    let request = AgentRequest {
        query: query.to_string(),
        user_id: CLI_USER_ID.to_string(),
        request_id: new_request_id(),
        session_id: session_id.to_string(),
    };

    let waiting = spinner("thinking...");
    let sent = client.send_query(&request).await;
    let latest = match &sent {
        Ok(_) => client.latest_message(session_id).await,
        Err(_) => Ok(None),
    };
    waiting.finish_and_clear();

    match sent {
        Ok(response) if !response.success => {
            println!("  {} The agent reported a failure.", style("!").yellow().bold());
        }
        Ok(_) => {}
        Err(e) => {
            println!("  {} Failed to send query: {e:#}", style("!").red().bold());
            return;
        }
    }

    match latest {
        Ok(Some(message)) if message.message_type == MessageType::Ai => {
            println!();
            println!("  {}", style("Agent:").blue().bold());
            println!("{}", renderer.render(&message.content));
        }
        Ok(_) => println!("  {} No response received from agent.", style("!").red().bold()),
        Err(e) => println!("  {} Error retrieving response: {e:#}", style("!").red().bold()),
    }
}

async fn print_history(client: &AgentClient, session_id: &str) {
    match client.messages(session_id, Some(20)).await {
        Ok(messages) if messages.is_empty() => {
            println!("\n  {}\n", style("No messages yet.").dim());
        }
        Ok(messages) => {
            println!();
            for message in &messages {
                let label = match message.message_type {
                    MessageType::Human => style("You").green().bold(),
                    MessageType::Ai => style("Agent").cyan().bold(),
                };
                println!("  {} {}", label, preview(&message.content, 100));
            }
            println!();
        }
        Err(e) => println!("\n  {} {e:#}\n", style("!").red().bold()),
    }
}

/// First `max` characters of `text` on one line.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max {
        let cut: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_cli_prefixes() {
        assert!(new_session_id().starts_with("cli-session-"));
        assert!(new_request_id().starts_with("cli-request-"));
        assert_ne!(new_session_id(), new_session_id());
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("two\nlines", 20), "two lines");
        assert_eq!(preview("héllo wörld", 8), "héllo...");
    }
}
