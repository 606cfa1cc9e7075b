//! Agent service: one request in, one persisted exchange out.
//!
//! `AgentService` ties the conversation store, short-term memory, the LLM
//! provider, and the extraction cascade together. A request never fails at
//! the transport level; problems surface as `success: false` plus an
//! apology message stored in the session.

use std::collections::HashMap;
use std::sync::Arc;

use agentline_types::conversation::{
    AgentRequest, AgentResponse, ExtractionTestResponse, MessageType, StoredMessage,
};
use agentline_types::error::RepositoryError;
use agentline_types::extraction::{DEFAULT_CONFIDENCE, ExtractedResult, Sentiment};
use agentline_types::llm::{CompletionRequest, Message, MessageRole};
use agentline_types::memory::MemoryRole;
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::prompt::{SYSTEM_PROMPT, Turn, build_prompt, fit_to_budget, format_history};
use crate::extract::{Tier, extract_with_trace};
use crate::llm::box_provider::BoxLlmProvider;
use crate::memory::manager::MemoryManager;
use crate::repository::ConversationRepository;

/// Stored as the assistant turn when the model call or the request fails.
pub const ERROR_RESPONSE: &str = "I apologize, but I encountered an error processing your request.";

/// Request shaping for every completion call.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    /// Stored messages replayed into the prompt when memory is cold.
    pub history_limit: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("conversation store error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct AgentService<R: ConversationRepository> {
    repo: R,
    llm: BoxLlmProvider,
    memory: Arc<MemoryManager>,
    settings: AgentSettings,
}

impl<R: ConversationRepository> AgentService<R> {
    pub fn new(
        repo: R,
        llm: BoxLlmProvider,
        memory: Arc<MemoryManager>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            repo,
            llm,
            memory,
            settings,
        }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn memory(&self) -> &MemoryManager {
        &self.memory
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    /// Handle one user query end to end.
    ///
    /// On success the session gains a human turn and an assistant turn whose
    /// `data` holds the request id, confidence and sentiment. A failed model
    /// call still counts as success with the apology as the reply. Any store
    /// failure yields `success: false` and a best-effort apology turn carrying
    /// the error text.
    #[tracing::instrument(
        skip(self, request),
        fields(session_id = %request.session_id, request_id = %request.request_id)
    )]
    pub async fn process(&self, request: &AgentRequest) -> AgentResponse {
        match self.run_exchange(request).await {
            Ok(result) => {
                info!(
                    confidence = result.confidence,
                    sentiment = %result.sentiment,
                    "agent request completed"
                );
                AgentResponse { success: true }
            }
            Err(e) => {
                error!(error = %e, "agent request failed");
                let failure = StoredMessage::new(
                    request.session_id.clone(),
                    MessageType::Ai,
                    ERROR_RESPONSE,
                    Some(json!({
                        "error": e.to_string(),
                        "request_id": request.request_id,
                    })),
                );
                if let Err(store_err) = self.repo.append_message(&failure).await {
                    error!(error = %store_err, "failed to store error reply");
                }
                AgentResponse { success: false }
            }
        }
    }

    async fn run_exchange(&self, request: &AgentRequest) -> Result<ExtractedResult, AgentError> {
        let history = self.load_history(&request.session_id).await?;

        let human = StoredMessage::new(
            request.session_id.clone(),
            MessageType::Human,
            request.query.clone(),
            None,
        );
        self.repo.append_message(&human).await?;
        self.memory.store_message(
            &request.session_id,
            &request.user_id,
            &request.query,
            MemoryRole::Human,
            HashMap::new(),
        );

        let prompt = build_prompt(&history, &request.query);
        let result = self.complete(prompt).await;

        let data = json!({
            "request_id": request.request_id,
            "confidence": result.confidence,
            "sentiment": result.sentiment,
        });
        let reply = StoredMessage::new(
            request.session_id.clone(),
            MessageType::Ai,
            result.response.clone(),
            Some(data.clone()),
        );
        self.repo.append_message(&reply).await?;

        let metadata: HashMap<String, serde_json::Value> = match data {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        self.memory.store_message(
            &request.session_id,
            &request.user_id,
            &result.response,
            MemoryRole::Ai,
            metadata,
        );

        Ok(result)
    }

    /// Prompt history for a session: short-term memory when it has anything
    /// for the session, the conversation store otherwise. Trimmed to the
    /// memory token budget.
    async fn load_history(&self, session_id: &str) -> Result<String, RepositoryError> {
        let limit = self.settings.history_limit as usize;
        let remembered = self.memory.get_conversation_history(session_id, Some(limit));

        let turns: Vec<Turn> = if remembered.is_empty() {
            let stored = self
                .repo
                .recent_messages(session_id, self.settings.history_limit)
                .await?;
            debug!(count = stored.len(), "history loaded from conversation store");
            stored.iter().map(Turn::from).collect()
        } else {
            debug!(count = remembered.len(), "history loaded from short-term memory");
            remembered.iter().map(Turn::from).collect()
        };

        let turns = fit_to_budget(turns, self.memory.token_limit());
        Ok(format_history(&turns))
    }

    /// Run the model and reduce its output to a triple. Provider errors
    /// degrade to the apology reply.
    async fn complete(&self, prompt: String) -> ExtractedResult {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![Message {
                role: MessageRole::User,
                content: prompt,
            }],
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            json_output: self.llm.capabilities().json_output,
        };

        match self.llm.complete(&request).await {
            Ok(response) => {
                let extraction = extract_with_trace(&response.content);
                if extraction.tier == Tier::Default {
                    warn!(
                        output_len = response.content.len(),
                        "model output yielded no usable response"
                    );
                }
                debug!(
                    tier = %extraction.tier,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "model output extracted"
                );
                extraction.result
            }
            Err(e) => {
                warn!(provider = self.llm.name(), error = %e, "model call failed");
                ExtractedResult::new(ERROR_RESPONSE, DEFAULT_CONFIDENCE, Sentiment::Neutral)
            }
        }
    }

    /// Messages of a session, oldest first.
    pub async fn session_messages(
        &self,
        session_id: &str,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        self.repo.list_messages(session_id, limit, offset).await
    }

    /// The newest message of a session, typically the assistant reply.
    pub async fn latest_message(
        &self,
        session_id: &str,
    ) -> Result<Option<StoredMessage>, RepositoryError> {
        self.repo.latest_message(session_id).await
    }

    /// Remove a session from the store and from short-term memory.
    pub async fn clear_session(&self, session_id: &str) -> Result<u64, RepositoryError> {
        let removed = self.repo.delete_session(session_id).await?;
        self.memory.clear_session(session_id);
        info!(session_id, removed, "session cleared");
        Ok(removed)
    }

    pub async fn message_count(&self) -> Result<u64, RepositoryError> {
        self.repo.count_messages().await
    }
}

/// Run the cascade on arbitrary text and echo the input back.
pub fn test_extraction(text: String) -> ExtractionTestResponse {
    let result = crate::extract::extract(&text);
    ExtractionTestResponse::new(result, text)
}
