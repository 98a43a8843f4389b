//! The chat message relay: validate, enforce quota, call the backend,
//! resolve command markers and persist the exchange.

use crate::models::{derive_title, ChatMessage, ChatSession, FileAttachment, Language};
use crate::services::auth::AccessTokenClaims;
use crate::services::markers::CommandMarkerProcessor;
use crate::services::providers::{ChatBackend, ConversationTurn};
use crate::services::quota::QuotaService;
use crate::services::store::ChatStore;
use crate::utils::sanitize::contains_active_content;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub const MAX_MESSAGE_CHARS: usize = 10_000;
pub const MAX_ATTACHMENTS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub attachments: Vec<FileAttachment>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub chat_id: String,
    pub success: bool,
}

/// A request that passed every input rule.
#[derive(Debug)]
pub struct ValidChatRequest {
    pub message: String,
    pub chat_id: Option<String>,
    /// `None` when the client did not send a language.
    pub language: Option<Language>,
    pub attachments: Vec<FileAttachment>,
}

impl ChatRequest {
    pub fn validate_input(self) -> Result<ValidChatRequest, AppError> {
        let message = self.message.trim().to_string();

        if message.is_empty() && self.attachments.is_empty() {
            return Err(AppError::bad_request("Message is required"));
        }
        if self.message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::bad_request(format!(
                "Message too long (max {} characters)",
                MAX_MESSAGE_CHARS
            )));
        }
        if contains_active_content(&message) {
            return Err(AppError::bad_request("Message contains disallowed content"));
        }

        let chat_id = match self.chat_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| AppError::bad_request("Invalid chat id"))?
                    .to_string(),
            ),
        };

        let language = match self.language.as_deref() {
            None => None,
            raw => Some(Language::for_chat(raw).map_err(AppError::bad_request)?),
        };

        if self.attachments.len() > MAX_ATTACHMENTS {
            return Err(AppError::bad_request(format!(
                "Too many attachments (max {})",
                MAX_ATTACHMENTS
            )));
        }
        for attachment in &self.attachments {
            attachment.validate()?;
        }

        Ok(ValidChatRequest {
            message,
            chat_id,
            language,
            attachments: self.attachments,
        })
    }
}

#[derive(Clone)]
pub struct ChatRelay {
    store: Arc<dyn ChatStore>,
    quota: QuotaService,
    backend: Arc<dyn ChatBackend>,
    markers: CommandMarkerProcessor,
}

impl ChatRelay {
    pub fn new(
        store: Arc<dyn ChatStore>,
        quota: QuotaService,
        backend: Arc<dyn ChatBackend>,
        markers: CommandMarkerProcessor,
    ) -> Self {
        Self {
            store,
            quota,
            backend,
            markers,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    #[tracing::instrument(
        skip(self, user, request),
        fields(user_id = %user.sub, chat_id, backend = self.backend.name())
    )]
    pub async fn relay(
        &self,
        user: &AccessTokenClaims,
        request: ValidChatRequest,
    ) -> Result<ChatReply, AppError> {
        let result = self.relay_inner(user, request).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => match e {
                AppError::Forbidden { .. } => "limit_reached",
                AppError::NotFound(_) => "not_found",
                AppError::BadGateway { .. } => "bad_gateway",
                AppError::ServiceUnavailable(_) => "unavailable",
                AppError::GatewayTimeout(_) => "timeout",
                _ => "error",
            },
        };
        metrics::counter!("chat_relay_requests_total", "outcome" => outcome).increment(1);
        result
    }

    async fn relay_inner(
        &self,
        user: &AccessTokenClaims,
        request: ValidChatRequest,
    ) -> Result<ChatReply, AppError> {
        let user_id = user.sub.as_str();
        let mut profile = self.store.get_or_create_profile(user_id, &user.email).await?;

        // A new conversation is only stored, and only counted, once the
        // backend has answered.
        let is_new = request.chat_id.is_none();
        let mut session = match request.chat_id.as_deref() {
            Some(chat_id) => self
                .store
                .find_session(chat_id, user_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!("Chat not found or access denied"))
                })?,
            None => {
                self.quota.ensure_can_create_chat(&mut profile).await?;
                ChatSession::new(
                    user_id,
                    derive_title(&request.message),
                    request.language.unwrap_or_default(),
                )
            }
        };

        tracing::Span::current().record("chat_id", session.id.as_str());
        let language = request.language.unwrap_or(session.language);

        let mut messages = session.messages.clone();
        messages.push(ChatMessage::user(request.message, request.attachments));

        let turn = ConversationTurn {
            user_id,
            chat_id: &session.id,
            language,
            history: &messages,
        };

        let reply = self.backend.reply(&turn).await.map_err(|e| {
            tracing::error!(error = %e, kind = e.kind(), "Chat backend failed");
            AppError::from(e)
        })?;

        let text = if reply.may_contain_markers {
            self.markers.process(&reply.text, language).await
        } else {
            reply.text
        };

        messages.push(ChatMessage::assistant(text.clone()));

        if is_new {
            session.messages = messages;
            self.store.insert_session(&session).await?;
            if let Err(e) = self.quota.record_new_chat(user_id).await {
                tracing::error!(error = %e, "Failed to record new chat against quota");
            }
            tracing::info!(chat_id = %session.id, "Created chat session");
        } else {
            self.save_exchange(&session.id, user_id, &messages).await;
        }

        tracing::info!(
            language = %language,
            message_len = text.len(),
            "Chat reply relayed"
        );

        Ok(ChatReply {
            response: text,
            chat_id: session.id,
            success: true,
        })
    }

    async fn save_exchange(&self, chat_id: &str, user_id: &str, messages: &[ChatMessage]) {
        match self
            .store
            .update_session_messages(chat_id, user_id, messages)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Session disappeared before messages were saved"),
            Err(e) => tracing::error!(error = %e, "Failed to save chat messages"),
        }
    }
}
