//! MongoDB-backed store.

use super::ChatStore;
use crate::models::{ChatMessage, ChatSession, DocumentRequest, Profile};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, to_document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

fn db_error(operation: &str, e: impl std::fmt::Display) -> AppError {
    tracing::error!(operation = %operation, error = %e, "MongoDB operation failed");
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", operation, e))
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri)
            .await
            .map_err(|e| db_error("connect", e))?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for legal-chat-service");

        self.create_index(
            &self.sessions(),
            doc! { "id": 1 },
            "session_id_idx",
            true,
        )
        .await?;
        self.create_index(
            &self.sessions(),
            doc! { "user_id": 1, "updated_at": -1 },
            "user_updated_idx",
            false,
        )
        .await?;
        self.create_index(&self.profiles(), doc! { "id": 1 }, "profile_id_idx", true)
            .await?;
        self.create_index(
            &self.document_requests(),
            doc! { "id": 1 },
            "document_request_id_idx",
            true,
        )
        .await?;
        self.create_index(
            &self.document_requests(),
            doc! { "user_id": 1, "created_at": -1 },
            "document_user_created_idx",
            false,
        )
        .await?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    async fn create_index<T>(
        &self,
        collection: &Collection<T>,
        keys: mongodb::bson::Document,
        name: &str,
        unique: bool,
    ) -> Result<(), AppError>
    where
        T: Send + Sync,
    {
        let index = IndexModel::builder()
            .keys(keys)
            .options(
                IndexOptions::builder()
                    .name(name.to_string())
                    .unique(unique)
                    .build(),
            )
            .build();

        collection
            .create_index(index, None)
            .await
            .map_err(|e| db_error(name, e))?;
        Ok(())
    }

    pub fn sessions(&self) -> Collection<ChatSession> {
        self.db.collection("chat_sessions")
    }

    pub fn profiles(&self) -> Collection<Profile> {
        self.db.collection("profiles")
    }

    pub fn document_requests(&self) -> Collection<DocumentRequest> {
        self.db.collection("document_requests")
    }
}

#[async_trait]
impl ChatStore for MongoStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| db_error("ping", e))?;
        Ok(())
    }

    async fn insert_session(&self, session: &ChatSession) -> Result<(), AppError> {
        self.sessions()
            .insert_one(session, None)
            .await
            .map_err(|e| db_error("insert_session", e))?;
        Ok(())
    }

    async fn find_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<ChatSession>, AppError> {
        self.sessions()
            .find_one(doc! { "id": session_id, "user_id": user_id }, None)
            .await
            .map_err(|e| db_error("find_session", e))
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "updated_at": -1 })
            .build();

        let cursor = self
            .sessions()
            .find(doc! { "user_id": user_id }, options)
            .await
            .map_err(|e| db_error("list_sessions", e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| db_error("list_sessions", e))
    }

    async fn update_session_messages(
        &self,
        session_id: &str,
        user_id: &str,
        messages: &[ChatMessage],
    ) -> Result<bool, AppError> {
        let messages = to_bson(messages).map_err(|e| db_error("encode_messages", e))?;

        let result = self
            .sessions()
            .update_one(
                doc! { "id": session_id, "user_id": user_id },
                doc! { "$set": {
                    "messages": messages,
                    "updated_at": Utc::now().timestamp_millis(),
                } },
                None,
            )
            .await
            .map_err(|e| db_error("update_session_messages", e))?;

        Ok(result.matched_count > 0)
    }

    async fn save_session(&self, session: &ChatSession) -> Result<bool, AppError> {
        let mut update = doc! {
            "title": session.title.as_str(),
            "status": to_bson(&session.status).map_err(|e| db_error("encode_status", e))?,
            "updated_at": session.updated_at.timestamp_millis(),
        };
        if let Some(completed_at) = session.completed_at {
            update.insert("completed_at", completed_at.timestamp_millis());
        }

        let result = self
            .sessions()
            .update_one(
                doc! { "id": session.id.as_str(), "user_id": session.user_id.as_str() },
                doc! { "$set": update },
                None,
            )
            .await
            .map_err(|e| db_error("save_session", e))?;

        Ok(result.matched_count > 0)
    }

    async fn delete_session(&self, session_id: &str, user_id: &str) -> Result<bool, AppError> {
        let result = self
            .sessions()
            .delete_one(doc! { "id": session_id, "user_id": user_id }, None)
            .await
            .map_err(|e| db_error("delete_session", e))?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_all_sessions(&self, user_id: &str) -> Result<u64, AppError> {
        let result = self
            .sessions()
            .delete_many(doc! { "user_id": user_id }, None)
            .await
            .map_err(|e| db_error("delete_all_sessions", e))?;
        Ok(result.deleted_count)
    }

    async fn get_or_create_profile(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<Profile, AppError> {
        let defaults = to_document(&Profile::new(user_id, email))
            .map_err(|e| db_error("encode_profile", e))?;

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        self.profiles()
            .find_one_and_update(
                doc! { "id": user_id },
                doc! { "$setOnInsert": defaults },
                options,
            )
            .await
            .map_err(|e| db_error("get_or_create_profile", e))?
            .ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!("profile upsert returned no document"))
            })
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.profiles()
            .replace_one(doc! { "id": profile.id.as_str() }, profile, None)
            .await
            .map_err(|e| db_error("save_profile", e))?;
        Ok(())
    }

    async fn increment_chat_count(&self, user_id: &str) -> Result<(), AppError> {
        self.profiles()
            .update_one(
                doc! { "id": user_id },
                doc! {
                    "$inc": { "chat_count_current_month": 1_i64 },
                    "$set": { "updated_at": Utc::now().timestamp_millis() },
                },
                None,
            )
            .await
            .map_err(|e| db_error("increment_chat_count", e))?;
        Ok(())
    }

    async fn insert_document_request(&self, request: &DocumentRequest) -> Result<(), AppError> {
        self.document_requests()
            .insert_one(request, None)
            .await
            .map_err(|e| db_error("insert_document_request", e))?;
        Ok(())
    }

    async fn save_document_request(&self, request: &DocumentRequest) -> Result<(), AppError> {
        self.document_requests()
            .replace_one(
                doc! { "id": request.id.as_str(), "user_id": request.user_id.as_str() },
                request,
                None,
            )
            .await
            .map_err(|e| db_error("save_document_request", e))?;
        Ok(())
    }

    async fn list_document_requests(
        &self,
        user_id: &str,
    ) -> Result<Vec<DocumentRequest>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .build();

        let cursor = self
            .document_requests()
            .find(doc! { "user_id": user_id }, options)
            .await
            .map_err(|e| db_error("list_document_requests", e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| db_error("list_document_requests", e))
    }
}
