//! Session CLI commands: history table and clear with confirmation.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use agentline_types::conversation::{MessageType, StoredMessage};

use super::chat::loop_runner::preview;
use super::client::AgentClient;

/// Print a session's messages, oldest first.
///
/// ```bash
/// agentline history cli-session-1234
/// agentline history cli-session-1234 --limit 20 --json
/// ```
pub async fn show_history(
    client: &AgentClient,
    session_id: &str,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let messages = client.messages(session_id, limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!();
        println!(
            "  {} No messages found for session '{}'.",
            style("i").blue().bold(),
            style(session_id).cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  Messages for '{}'", style(session_id).cyan().bold());
    println!();
    println!("{}", history_table(&messages));
    println!();
    println!(
        "  {} message{}",
        style(messages.len()).bold(),
        if messages.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

fn history_table(messages: &[StoredMessage]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Time").fg(Color::White),
        Cell::new("From").fg(Color::White),
        Cell::new("Message").fg(Color::White),
        Cell::new("Confidence").fg(Color::White),
        Cell::new("Sentiment").fg(Color::White),
    ]);

    for message in messages {
        let from = match message.message_type {
            MessageType::Human => Cell::new("human").fg(Color::Green),
            MessageType::Ai => Cell::new("ai").fg(Color::Cyan),
        };
        let field = |key: &str| {
            message
                .data
                .as_ref()
                .and_then(|d| d.get(key))
                .map(|v| match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_default()
        };

        table.add_row(vec![
            Cell::new(message.created_at.format("%Y-%m-%d %H:%M:%S").to_string())
                .fg(Color::DarkGrey),
            from,
            Cell::new(preview(&message.content, 80)),
            Cell::new(field("confidence")).fg(Color::DarkGrey),
            Cell::new(field("sentiment")).fg(Color::DarkGrey),
        ]);
    }

    table
}

/// Delete a session after confirmation (skipped with `--yes`).
pub async fn clear_session(client: &AgentClient, session_id: &str, yes: bool, json: bool) -> Result<()> {
    if !yes && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete every message of session '{session_id}'? This cannot be undone"
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  {}", style("Cancelled.").dim());
            return Ok(());
        }
    }

    let deleted = client.clear_session(session_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "session_id": session_id, "deleted_messages": deleted })
        );
    } else {
        println!();
        println!(
            "  {} Deleted {} message{} from '{}'",
            style("✓").green().bold(),
            style(deleted).bold(),
            if deleted == 1 { "" } else { "s" },
            style(session_id).cyan()
        );
        println!();
    }
    Ok(())
}
