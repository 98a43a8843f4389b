//! Persistence seam for conversations, profiles and document requests.
//!
//! Every session and document operation is scoped by the owning user id, so
//! a caller can never read or mutate another user's rows.

pub mod memory;
pub mod mongo;

use crate::models::{ChatMessage, ChatSession, DocumentRequest, Profile};
use async_trait::async_trait;
use service_core::error::AppError;

pub use memory::InMemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Sessions

    async fn insert_session(&self, session: &ChatSession) -> Result<(), AppError>;

    async fn find_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<ChatSession>, AppError>;

    /// Newest `updated_at` first.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, AppError>;

    /// Replace the message list and bump `updated_at`. Returns false when no
    /// owned session matched.
    async fn update_session_messages(
        &self,
        session_id: &str,
        user_id: &str,
        messages: &[ChatMessage],
    ) -> Result<bool, AppError>;

    /// Overwrite title, status and timestamps of an owned session.
    async fn save_session(&self, session: &ChatSession) -> Result<bool, AppError>;

    async fn delete_session(&self, session_id: &str, user_id: &str) -> Result<bool, AppError>;

    async fn delete_all_sessions(&self, user_id: &str) -> Result<u64, AppError>;

    // Profiles

    /// Fetch the profile, creating a default one on first sight.
    async fn get_or_create_profile(&self, user_id: &str, email: &str)
        -> Result<Profile, AppError>;

    async fn save_profile(&self, profile: &Profile) -> Result<(), AppError>;

    /// Atomically add one to the monthly conversation counter.
    async fn increment_chat_count(&self, user_id: &str) -> Result<(), AppError>;

    // Document requests

    async fn insert_document_request(&self, request: &DocumentRequest) -> Result<(), AppError>;

    async fn save_document_request(&self, request: &DocumentRequest) -> Result<(), AppError>;

    /// Newest first.
    async fn list_document_requests(&self, user_id: &str)
        -> Result<Vec<DocumentRequest>, AppError>;
}
