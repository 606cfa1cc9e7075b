//! Agentline CLI and REST API entry point.
//!
//! Binary name: `agentline`
//!
//! Parses CLI arguments, installs tracing, then either starts the REST API
//! server or runs a client command against one.

mod cli;
mod http;
mod state;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;

use agentline_infra::config::{Secrets, load_dotenv, logging_from_env, resolve_config};
use agentline_infra::filesystem::resolve_data_dir;
use agentline_observe::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands, verbosity_directive};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Before tracing, so AGENTLINE_LOG_* in .env apply. Its own logs are lost.
    load_dotenv();

    let env = |key: &str| std::env::var(key).ok();
    let logging = logging_from_env(env)?;
    let options = TracingOptions::from_config(&logging, verbosity_directive(cli.verbose, cli.quiet));
    if let Err(e) = init_tracing(&options) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "agentline", &mut std::io::stdout());
        }

        Commands::Extract { text, file } => {
            cli::extract::run_extract(text, file)?;
        }

        Commands::Chat {
            session,
            query,
            service,
        } => {
            let client = service.client()?;
            cli::chat::loop_runner::run_chat(&client, session, query).await?;
        }

        Commands::History {
            session_id,
            limit,
            service,
        } => {
            let client = service.client()?;
            cli::session::show_history(&client, &session_id, limit, cli.json).await?;
        }

        Commands::Clear {
            session_id,
            yes,
            service,
        } => {
            let client = service.client()?;
            cli::session::clear_session(&client, &session_id, yes, cli.json).await?;
        }

        Commands::Serve { port, host } => {
            let data_dir = resolve_data_dir();
            let mut config = resolve_config(&data_dir)
                .await
                .context("invalid configuration")?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            let secrets = Secrets::from_env(|key| std::env::var(key).ok());
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let state = AppState::init(config, &data_dir, secrets).await?;

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            tracing::info!(%addr, data_dir = %data_dir.display(), "agentline listening");
            if !cli.quiet {
                println!(
                    "  {} Agentline API listening on {}",
                    console::style("⚡").bold(),
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state.clone());

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            state.flush_memory().await;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
