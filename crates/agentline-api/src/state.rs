//! Application state wiring the agent service together.
//!
//! The agent service is generic over its repository; AppState pins it to the
//! SQLite implementation.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;

use agentline_core::agent::{AgentService, AgentSettings};
use agentline_core::memory::manager::MemoryManager;
use agentline_core::memory::snapshot::SnapshotStore;
use agentline_infra::config::{Secrets, memory_dir};
use agentline_infra::llm::{create_provider, upstream_model};
use agentline_infra::memory::{JsonSnapshotStore, SnapshotWriter};
use agentline_infra::sqlite::conversation::SqliteConversationRepository;
use agentline_infra::sqlite::pool::{DatabasePool, database_url};
use agentline_types::config::AgentConfig;

use crate::http::extractors::auth::hash_token;

pub type ConcreteAgentService = AgentService<SqliteConversationRepository>;

/// Shared state for REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent_service: Arc<ConcreteAgentService>,
    /// SHA-256 hex of `API_BEARER_TOKEN`; `None` when it is not configured.
    pub bearer_digest: Option<String>,
    pub config: Arc<AgentConfig>,
    /// Background snapshot writer; `None` when persistence is off.
    pub memory_writer: Option<Arc<SnapshotWriter>>,
}

impl AppState {
    /// Connect to the store, restore short-term memory, and build the
    /// provider.
    pub async fn init(config: AgentConfig, data_dir: &Path, secrets: Secrets) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db_pool = DatabasePool::new(&database_url(data_dir))
            .await
            .context("failed to open conversation database")?;

        let memory_writer = if config.memory.persistence_enabled {
            let dir = memory_dir(&config, data_dir);
            let store = JsonSnapshotStore::new(&dir)
                .with_context(|| format!("failed to prepare memory directory {}", dir.display()))?;
            Some(SnapshotWriter::spawn(store))
        } else {
            None
        };
        let snapshot = memory_writer
            .clone()
            .map(|writer| writer as Arc<dyn SnapshotStore>);
        let memory = Arc::new(MemoryManager::new(&config.memory, snapshot));

        let llm = create_provider(&config.llm, secrets.openai_api_key)
            .context("failed to configure the LLM provider (is OPENAI_API_KEY set?)")?;

        if secrets.bearer_token.is_none() {
            tracing::warn!("API_BEARER_TOKEN is not set; protected routes will fail");
        }

        let service = AgentService::new(
            SqliteConversationRepository::new(db_pool),
            llm,
            memory,
            settings_from(&config),
        );

        let mut state = Self::new(
            service,
            secrets.bearer_token.as_ref().map(|t| t.expose_secret().to_string()),
            config,
        );
        state.memory_writer = memory_writer;
        Ok(state)
    }

    pub fn new(service: ConcreteAgentService, bearer_token: Option<String>, config: AgentConfig) -> Self {
        Self {
            agent_service: Arc::new(service),
            bearer_digest: bearer_token.as_deref().map(hash_token),
            config: Arc::new(config),
            memory_writer: None,
        }
    }

    /// Wait for pending short-term memory snapshots to reach disk.
    pub async fn flush_memory(&self) {
        if let Some(writer) = &self.memory_writer {
            if let Err(e) = writer.flush().await {
                tracing::warn!(error = %e, "failed to flush short-term memory");
            }
        }
    }
}

fn settings_from(config: &AgentConfig) -> AgentSettings {
    AgentSettings {
        model: upstream_model(&config.llm),
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
        history_limit: config.llm.history_limit,
    }
}
