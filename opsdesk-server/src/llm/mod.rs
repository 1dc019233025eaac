// Copyright 2025 Opsdesk (https://github.com/opsdesk)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Generative-text gateway.
//!
//! This layer only produces the system prompt and conversation history; it
//! never parses provider responses beyond extracting text. Timeouts and
//! retries belong to the provider client.

use crate::config::LlmConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

mod providers;
pub use providers::OpenAiProvider;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", or "assistant"
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: Option<u32>,
    pub duration_ms: u32,
}

/// Gateway contract: complete or streamed text for a conversation.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> anyhow::Result<ChatResponse>;

    /// Lazy sequence of text chunks. The channel closes when the provider
    /// finishes or fails; a failure mid-stream simply ends the stream.
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> anyhow::Result<mpsc::Receiver<String>>;

    fn name(&self) -> &str;
}

/// Build the configured provider.
pub fn provider_from_config(config: &LlmConfig) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let api_key = config
        .openai_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no LLM API key configured (set OPENAI_API_KEY)"))?;
    let provider = OpenAiProvider::new(api_key, config.model.clone())?;
    tracing::info!(provider = provider.name(), "LLM provider initialized");
    Ok(Arc::new(provider))
}
