//! In-chat commands.
//!
//! Bare `exit`, `quit` and `q` end the session; everything else that is a
//! command starts with `/`.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    /// Clear the terminal screen.
    Clear,
    Exit,
    /// Switch to a fresh session id.
    New,
    /// Show this session's messages.
    History,
    /// Print the current session id.
    Session,
    Unknown(String),
}

/// Parse user input as a command. `None` means the input is a query.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit" | "q") {
        return Some(ChatCommand::Exit);
    }
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        "/history" => Some(ChatCommand::History),
        "/session" => Some(ChatCommand::Session),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}     {}", style("/help").cyan(), "Show this help message");
    println!("  {}    {}", style("/clear").cyan(), "Clear the screen");
    println!("  {}      {}", style("/new").cyan(), "Start a new session");
    println!("  {}  {}", style("/history").cyan(), "Show this session's messages");
    println!("  {}  {}", style("/session").cyan(), "Show the session id");
    println!("  {}      {}", style("exit").cyan(), "End the chat (also quit, q, Ctrl+D)");
    println!();
}
