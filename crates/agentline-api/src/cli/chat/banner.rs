//! Welcome banner for interactive sessions.

use console::style;

pub fn print_welcome_banner(service_url: &str, version: &str, session_id: &str) {
    println!();
    println!("  {} {}", style("*").cyan().bold(), style("Agentline chat").cyan().bold());
    println!(
        "  {}",
        style("Type your messages to chat with the agent.").dim()
    );
    println!();
    println!(
        "  {}  {} {}",
        style("Service:").bold(),
        style(service_url).dim(),
        style(format!("(v{version})")).dim()
    );
    println!("  {}  {}", style("Session:").bold(), style(session_id).dim());
    println!();
    println!(
        "  {}",
        style("Type 'exit' or 'quit' to end the session, /help for commands").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}
