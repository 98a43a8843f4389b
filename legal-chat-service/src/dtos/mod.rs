//! Request and response bodies for the session, profile and document routes.

use crate::models::{ChatMessage, Profile, SessionStatus, SubscriptionTier};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub status: Option<SessionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceMessagesRequest {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAllResponse {
    pub deleted: u64,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub tier: SubscriptionTier,
    pub can_create_chat: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionsQuery {
    pub document_type: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireRequest {
    pub document_type: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub answers: serde_json::Map<String, serde_json::Value>,
}
