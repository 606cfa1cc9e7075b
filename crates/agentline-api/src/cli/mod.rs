//! CLI command definitions for the `agentline` binary.
//!
//! `serve` runs the HTTP service; `chat`, `history` and `clear` are clients
//! of a running service; `extract` runs the extraction cascade offline.

pub mod chat;
pub mod client;
pub mod extract;
pub mod session;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use secrecy::SecretString;

use client::DEFAULT_URL;

/// Conversational agent service with structured reply extraction.
#[derive(Parser)]
#[command(name = "agentline", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the agent service lives and how to authenticate to it.
#[derive(Args, Debug, Clone)]
pub struct ServiceArgs {
    /// Base URL of the agent service.
    #[arg(long, env = "AGENTLINE_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Bearer token for protected routes.
    #[arg(long, env = "API_BEARER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl ServiceArgs {
    pub fn client(&self) -> anyhow::Result<client::AgentClient> {
        client::AgentClient::new(&self.url, self.token.clone().map(SecretString::from))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Port to listen on (overrides config and AGENTLINE_PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config and AGENTLINE_HOST).
        #[arg(long)]
        host: Option<String>,
    },

    /// Chat with a running agent service.
    Chat {
        /// Reuse a session id instead of starting a new one.
        #[arg(short, long)]
        session: Option<String>,

        /// Send a single query and exit.
        #[arg(short, long)]
        query: Option<String>,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Run response extraction on text (argument, --file, or stdin).
    Extract {
        /// Raw model output to extract from.
        text: Option<String>,

        /// Read the raw output from a file.
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,
    },

    /// Show the messages of a session.
    History {
        session_id: String,

        /// Maximum number of messages.
        #[arg(long)]
        limit: Option<i64>,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Delete a session and its short-term memory.
    Clear {
        session_id: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        #[command(flatten)]
        service: ServiceArgs,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Default tracing directive for the CLI verbosity flags.
pub fn verbosity_directive(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,agentline=debug",
        _ => "trace",
    }
}
