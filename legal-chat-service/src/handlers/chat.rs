use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    middleware::AuthUser,
    services::relay::{ChatReply, ChatRequest},
    startup::AppState,
    utils::validation::JsonBody,
};

/// Relay one user message to the configured backend and persist the exchange.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    let request = payload.validate_input().map_err(|e| {
        tracing::info!(user_id = %user.sub, error = %e, "Rejected chat request");
        e
    })?;

    tracing::info!(
        user_id = %user.sub,
        chat_id = request.chat_id.as_deref().unwrap_or("new"),
        message_len = request.message.len(),
        attachments = request.attachments.len(),
        "Chat request received"
    );

    let reply = state.relay.relay(&user, request).await?;
    Ok(Json(reply))
}
