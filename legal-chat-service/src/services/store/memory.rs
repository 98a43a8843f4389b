//! Process-local store for development and tests.

use super::ChatStore;
use crate::models::{ChatMessage, ChatSession, DocumentRequest, Profile};
use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, ChatSession>,
    profiles: HashMap<String, Profile>,
    documents: HashMap<String, DocumentRequest>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_session(&self, session: &ChatSession) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(&session.id) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "duplicate session id {}",
                session.id
            )));
        }
        tables.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<ChatSession>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .sessions
            .get(session_id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, AppError> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<ChatSession> = tables
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn update_session_messages(
        &self,
        session_id: &str,
        user_id: &str,
        messages: &[ChatMessage],
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables
            .sessions
            .get_mut(session_id)
            .filter(|s| s.user_id == user_id)
        {
            Some(session) => {
                session.messages = messages.to_vec();
                session.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn save_session(&self, session: &ChatSession) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        match tables
            .sessions
            .get_mut(&session.id)
            .filter(|s| s.user_id == session.user_id)
        {
            Some(stored) => {
                stored.title = session.title.clone();
                stored.status = session.status;
                stored.updated_at = session.updated_at;
                stored.completed_at = session.completed_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_session(&self, session_id: &str, user_id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .sessions
            .get(session_id)
            .is_some_and(|s| s.user_id == user_id);
        if owned {
            tables.sessions.remove(session_id);
        }
        Ok(owned)
    }

    async fn delete_all_sessions(&self, user_id: &str) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn get_or_create_profile(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<Profile, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| Profile::new(user_id, email))
            .clone())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.profiles.insert(profile.id.clone(), profile.clone());
        Ok(())
    }

    async fn increment_chat_count(&self, user_id: &str) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(profile) = tables.profiles.get_mut(user_id) {
            profile.chat_count_current_month += 1;
            profile.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn insert_document_request(&self, request: &DocumentRequest) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        tables.documents.insert(request.id.clone(), request.clone());
        Ok(())
    }

    async fn save_document_request(&self, request: &DocumentRequest) -> Result<(), AppError> {
        self.insert_document_request(request).await
    }

    async fn list_document_requests(
        &self,
        user_id: &str,
    ) -> Result<Vec<DocumentRequest>, AppError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<DocumentRequest> = tables
            .documents
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    #[tokio::test]
    async fn sessions_are_scoped_to_their_owner() {
        let store = InMemoryStore::new();
        let session = ChatSession::new("alice", "Deposit", Language::En);
        store.insert_session(&session).await.unwrap();

        assert!(store.find_session(&session.id, "alice").await.unwrap().is_some());
        assert!(store.find_session(&session.id, "mallory").await.unwrap().is_none());
        assert!(!store.delete_session(&session.id, "mallory").await.unwrap());
        assert!(!store
            .update_session_messages(&session.id, "mallory", &[])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn messages_round_trip_in_order() {
        let store = InMemoryStore::new();
        let session = ChatSession::new("alice", "Deposit", Language::En);
        store.insert_session(&session).await.unwrap();

        let messages = vec![
            ChatMessage::user("first", vec![]),
            ChatMessage::assistant("second"),
            ChatMessage::user("third", vec![]),
        ];
        assert!(store
            .update_session_messages(&session.id, "alice", &messages)
            .await
            .unwrap());

        let stored = store.find_session(&session.id, "alice").await.unwrap().unwrap();
        assert_eq!(stored.messages, messages);
    }

    #[tokio::test]
    async fn delete_all_only_touches_caller() {
        let store = InMemoryStore::new();
        for owner in ["alice", "alice", "bob"] {
            store
                .insert_session(&ChatSession::new(owner, "t", Language::Nl))
                .await
                .unwrap();
        }

        assert_eq!(store.delete_all_sessions("alice").await.unwrap(), 2);
        assert_eq!(store.list_sessions("bob").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn profile_is_created_once_and_counter_increments() {
        let store = InMemoryStore::new();
        let created = store.get_or_create_profile("alice", "a@x.nl").await.unwrap();
        assert_eq!(created.chat_count_current_month, 0);

        store.increment_chat_count("alice").await.unwrap();
        let again = store.get_or_create_profile("alice", "other@x.nl").await.unwrap();
        assert_eq!(again.chat_count_current_month, 1);
        assert_eq!(again.email, "a@x.nl");
    }
}
