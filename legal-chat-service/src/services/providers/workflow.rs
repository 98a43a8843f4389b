//! Chat backend that hands each message to a workflow webhook.

use super::{BackendReply, ChatBackend, ConversationTurn, ModelError};
use crate::models::FileAttachment;
use crate::services::webhook::{WebhookClient, WebhookError};
use crate::utils::sanitize::strip_active_content;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

/// Replies longer than this are rejected as invalid.
pub const MAX_WORKFLOW_REPLY_CHARS: usize = 50_000;

const INSTRUCTION: &str = "Respond in the user's language with informative legal guidance \
based on Dutch law. Do not present the answer as formal legal advice.";

pub struct WorkflowChatBackend {
    client: WebhookClient,
    url: Option<String>,
    timeout: Duration,
}

impl WorkflowChatBackend {
    pub fn new(client: WebhookClient, url: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowChatRequest<'a> {
    message: &'a str,
    language: &'a str,
    attachments: &'a [FileAttachment],
    timestamp: String,
    chat_id: &'a str,
    user_id: &'a str,
    instruction: &'static str,
}

impl From<WebhookError> for ModelError {
    fn from(err: WebhookError) -> Self {
        match err {
            WebhookError::NotConfigured => {
                ModelError::NotConfigured("workflow chat webhook".to_string())
            }
            WebhookError::Timeout => ModelError::Timeout,
            WebhookError::Network(e) => ModelError::Network(e),
            WebhookError::Status { status, body } => ModelError::Status { status, body },
            WebhookError::InvalidResponse(reason) => ModelError::InvalidResponse(reason),
        }
    }
}

#[async_trait]
impl ChatBackend for WorkflowChatBackend {
    fn name(&self) -> &'static str {
        "workflow"
    }

    async fn reply(&self, turn: &ConversationTurn<'_>) -> Result<BackendReply, ModelError> {
        let url = self.url.as_deref().ok_or(WebhookError::NotConfigured)?;
        let latest = turn
            .latest_user_message()
            .ok_or_else(|| ModelError::InvalidResponse("conversation is empty".to_string()))?;

        let request = WorkflowChatRequest {
            message: &latest.content,
            language: turn.language.as_str(),
            attachments: &latest.attachments,
            timestamp: Utc::now().to_rfc3339(),
            chat_id: turn.chat_id,
            user_id: turn.user_id,
            instruction: INSTRUCTION,
        };

        let body = self.client.post_json(url, &request, self.timeout).await?;

        let text = match body.get("response") {
            Some(serde_json::Value::String(text)) => text,
            _ => {
                return Err(ModelError::InvalidResponse(
                    "missing response field".to_string(),
                ))
            }
        };

        if text.trim().is_empty() || text.chars().count() > MAX_WORKFLOW_REPLY_CHARS {
            return Err(ModelError::InvalidResponse(
                "response is empty or too long".to_string(),
            ));
        }

        Ok(BackendReply {
            text: strip_active_content(text),
            may_contain_markers: false,
        })
    }
}
