//! OpenAI-compatible chat completions provider.

use super::{render_for_model, BackendReply, ChatBackend, ConversationTurn, ModelError};
use crate::config::OpenAiConfig;
use crate::models::MessageRole;
use crate::services::prompts::system_prompt;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::Duration;

pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// System prompt followed by the trailing window of the conversation.
    fn build_messages(&self, turn: &ConversationTurn<'_>) -> Vec<OpenAiMessage> {
        let window_start = turn
            .history
            .len()
            .saturating_sub(self.config.context_messages);

        let mut messages = Vec::with_capacity(turn.history.len() - window_start + 1);
        messages.push(OpenAiMessage {
            role: "system".to_string(),
            content: system_prompt(turn.language).to_string(),
        });
        messages.extend(turn.history[window_start..].iter().map(|m| OpenAiMessage {
            role: match m.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            }
            .to_string(),
            content: render_for_model(m),
        }));
        messages
    }
}

#[async_trait]
impl ChatBackend for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn reply(&self, turn: &ConversationTurn<'_>) -> Result<BackendReply, ModelError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| ModelError::NotConfigured("OPENAI_API_KEY is not set".to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: self.build_messages(turn),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Sending request to chat completions API"
        );

        let response = self
            .client
            .traced_post(&self.completions_url())
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout
                } else {
                    ModelError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Chat completions API returned an error");
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ModelError::Timeout
            } else {
                ModelError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ModelError::InvalidResponse("No response from AI service".to_string()))?;

        if let Some(usage) = completion.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        Ok(BackendReply {
            text,
            may_contain_markers: true,
        })
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMessage, Language};

    fn provider(context_messages: usize) -> OpenAiProvider {
        OpenAiProvider::new(OpenAiConfig {
            api_key: None,
            base_url: "https://api.example.test/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout_secs: 5,
            context_messages,
        })
    }

    #[test]
    fn window_keeps_system_prompt_and_last_messages() {
        let history: Vec<ChatMessage> = (0..15)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("q{}", i), vec![])
                } else {
                    ChatMessage::assistant(format!("a{}", i))
                }
            })
            .collect();
        let turn = ConversationTurn {
            user_id: "u1",
            chat_id: "c1",
            language: Language::Fr,
            history: &history,
        };

        let messages = provider(10).build_messages(&turn);
        assert_eq!(messages.len(), 11);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, system_prompt(Language::Fr));
        assert_eq!(messages[1].content, "a5");
        assert_eq!(messages[10].content, "q14");
        assert_eq!(messages[10].role, "user");
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        assert_eq!(
            provider(10).completions_url(),
            "https://api.example.test/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_not_configured() {
        let history = vec![ChatMessage::user("hi", vec![])];
        let turn = ConversationTurn {
            user_id: "u1",
            chat_id: "c1",
            language: Language::Nl,
            history: &history,
        };
        let err = provider(10).reply(&turn).await.err().unwrap();
        assert!(matches!(err, ModelError::NotConfigured(_)));
    }
}
