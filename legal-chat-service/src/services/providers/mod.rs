//! Upstreams that produce assistant replies.
//!
//! Two interchangeable backends sit behind [`ChatBackend`]: a direct call to
//! an OpenAI-compatible model API, and a workflow webhook that runs its own
//! pipeline and returns finished text.

pub mod openai;
pub mod workflow;

use crate::models::{ChatMessage, Language};
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

pub use openai::OpenAiProvider;
pub use workflow::WorkflowChatBackend;

/// Characters of an upstream error body echoed back in `details`.
const ERROR_DETAIL_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream timed out")]
    Timeout,

    #[error("upstream returned {status}")]
    Status { status: u16, body: String },

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl ModelError {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::NotConfigured(_) => "not_configured",
            ModelError::Network(_) => "network",
            ModelError::Timeout => "timeout",
            ModelError::Status { .. } => "status",
            ModelError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotConfigured(_) => {
                AppError::ServiceUnavailable("AI service not configured".to_string())
            }
            ModelError::Network(_) => {
                AppError::ServiceUnavailable("Failed to connect to AI service".to_string())
            }
            ModelError::Timeout => {
                AppError::GatewayTimeout("AI service timeout - please try again".to_string())
            }
            ModelError::Status { status, body } => AppError::bad_gateway(
                format!("AI service error: {}", status),
                Some(body.chars().take(ERROR_DETAIL_CHARS).collect()),
            ),
            ModelError::InvalidResponse(reason) => {
                AppError::bad_gateway("Invalid response from AI service", Some(reason))
            }
        }
    }
}

/// Everything a backend needs to answer the latest user message.
pub struct ConversationTurn<'a> {
    pub user_id: &'a str,
    pub chat_id: &'a str,
    pub language: Language,
    /// Full conversation including the new user message as the last entry.
    pub history: &'a [ChatMessage],
}

impl ConversationTurn<'_> {
    pub fn latest_user_message(&self) -> Option<&ChatMessage> {
        self.history.last()
    }
}

pub struct BackendReply {
    pub text: String,
    /// Whether the text may contain command markers that still need resolving.
    pub may_contain_markers: bool,
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn reply(&self, turn: &ConversationTurn<'_>) -> Result<BackendReply, ModelError>;
}

/// Render a message for a model, inlining attachment names and text.
pub(crate) fn render_for_model(message: &ChatMessage) -> String {
    if message.attachments.is_empty() {
        return message.content.clone();
    }

    let mut rendered = message.content.clone();
    for attachment in &message.attachments {
        rendered.push_str(&format!(
            "\n\n[Attachment: {} ({})]",
            attachment.name, attachment.mime_type
        ));
        if let Some(content) = attachment.content.as_deref() {
            rendered.push('\n');
            rendered.push_str(content);
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileAttachment;
    use axum::http::StatusCode;

    #[test]
    fn upstream_status_maps_to_bad_gateway_with_truncated_details() {
        let err: AppError = ModelError::Status {
            status: 500,
            body: "x".repeat(500),
        }
        .into();

        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        match err {
            AppError::BadGateway { message, details } => {
                assert_eq!(message, "AI service error: 500");
                assert_eq!(details.map(|d| d.len()), Some(200));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn network_and_timeout_mapping() {
        let network: AppError = ModelError::Network("refused".into()).into();
        assert_eq!(network.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let timeout: AppError = ModelError::Timeout.into();
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn attachments_are_inlined_for_the_model() {
        let message = ChatMessage::user(
            "Please review",
            vec![FileAttachment {
                id: "f1".into(),
                name: "notice.txt".into(),
                size: 12,
                mime_type: "text/plain".into(),
                url: "https://files.local/notice.txt".into(),
                content: Some("Eviction notice".into()),
            }],
        );

        let rendered = render_for_model(&message);
        assert!(rendered.starts_with("Please review"));
        assert!(rendered.contains("[Attachment: notice.txt (text/plain)]"));
        assert!(rendered.ends_with("Eviction notice"));
    }
}
