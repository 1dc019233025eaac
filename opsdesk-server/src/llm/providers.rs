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

use super::{ChatMessage, ChatResponse, LlmProvider};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client as OpenAIClient,
};
use std::time::Instant;
use tokio::sync::mpsc;

const FALLBACK_MODEL: &str = "gpt-4o-mini";

pub struct OpenAiProvider {
    client: OpenAIClient<OpenAIConfig>,
    default_model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, default_model: Option<String>) -> anyhow::Result<Self> {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = OpenAIClient::with_config(config);

        Ok(Self {
            client,
            default_model: default_model.unwrap_or_else(|| FALLBACK_MODEL.to_string()),
        })
    }

    fn resolve_model(&self, model: Option<String>) -> String {
        model.unwrap_or_else(|| self.default_model.clone())
    }

    fn convert_messages(&self, messages: Vec<ChatMessage>) -> Vec<ChatCompletionRequestMessage> {
        messages
            .into_iter()
            .filter_map(|msg| match msg.role.as_str() {
                "system" => ChatCompletionRequestSystemMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .ok()
                    .map(ChatCompletionRequestMessage::System),
                "user" => ChatCompletionRequestUserMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .ok()
                    .map(ChatCompletionRequestMessage::User),
                "assistant" => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .ok()
                    .map(ChatCompletionRequestMessage::Assistant),
                _ => None,
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let model_name = self.resolve_model(model);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&model_name)
            .messages(self.convert_messages(messages))
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();

        let tokens_used = response.usage.as_ref().map(|usage| usage.total_tokens);

        Ok(ChatResponse {
            content,
            provider: "openai".to_string(),
            model: model_name,
            tokens_used,
            duration_ms: start.elapsed().as_millis() as u32,
        })
    }

    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        model: Option<String>,
    ) -> anyhow::Result<mpsc::Receiver<String>> {
        let (tx, rx) = mpsc::channel(100);
        let model_name = self.resolve_model(model);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&model_name)
            .messages(self.convert_messages(messages))
            .build()?;

        let mut stream = self.client.chat().create_stream(request).await?;

        tokio::spawn(async move {
            use futures::StreamExt;
            while let Some(result) = stream.next().await {
                match result {
                    Ok(response) => {
                        if let Some(choice) = response.choices.first() {
                            if let Some(content) = &choice.delta.content {
                                if tx.send(content.clone()).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!("chat stream ended with provider error: {}", err);
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
