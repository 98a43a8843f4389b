//! Conversation CRUD. Every operation is scoped to the caller.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{CreateSessionRequest, DeleteAllResponse, ReplaceMessagesRequest, UpdateSessionRequest},
    middleware::AuthUser,
    models::{ChatSession, Language},
    startup::AppState,
    utils::validation::{JsonBody, ValidatedJson},
};

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Chat not found or access denied"))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<ChatSession>>, AppError> {
    let sessions = state.store.list_sessions(&user.sub).await?;
    Ok(Json(sessions))
}

pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ChatSession>), AppError> {
    let language =
        Language::for_chat(payload.language.as_deref()).map_err(AppError::bad_request)?;
    let session = ChatSession::new(&user.sub, payload.title.trim(), language);

    let mut profile = state
        .store
        .get_or_create_profile(&user.sub, &user.email)
        .await?;
    state.quota.ensure_can_create_chat(&mut profile).await?;

    state.store.insert_session(&session).await?;
    state.quota.record_new_chat(&user.sub).await?;
    tracing::info!(user_id = %user.sub, chat_id = %session.id, "Created chat session");

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<ChatSession>, AppError> {
    let session = state
        .store
        .find_session(&session_id, &user.sub)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(session))
}

/// Rename a conversation or change its status.
pub async fn update_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateSessionRequest>,
) -> Result<Json<ChatSession>, AppError> {
    let mut session = state
        .store
        .find_session(&session_id, &user.sub)
        .await?
        .ok_or_else(not_found)?;

    if let Some(title) = payload.title {
        session.title = title.trim().to_string();
        session.updated_at = chrono::Utc::now();
    }
    if let Some(status) = payload.status {
        session.set_status(status);
    }

    if !state.store.save_session(&session).await? {
        return Err(not_found());
    }
    Ok(Json(session))
}

pub async fn replace_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
    JsonBody(payload): JsonBody<ReplaceMessagesRequest>,
) -> Result<Json<ChatSession>, AppError> {
    let updated = state
        .store
        .update_session_messages(&session_id, &user.sub, &payload.messages)
        .await?;
    if !updated {
        return Err(not_found());
    }

    let session = state
        .store
        .find_session(&session_id, &user.sub)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(session))
}

pub async fn delete_session(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_session(&session_id, &user.sub).await? {
        return Err(not_found());
    }
    tracing::info!(user_id = %user.sub, chat_id = %session_id, "Deleted chat session");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_all_sessions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<DeleteAllResponse>, AppError> {
    let deleted = state.store.delete_all_sessions(&user.sub).await?;
    tracing::info!(user_id = %user.sub, deleted, "Deleted all chat sessions");
    Ok(Json(DeleteAllResponse { deleted }))
}
