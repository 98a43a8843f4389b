use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::ProfileResponse,
    middleware::AuthUser,
    models::{ProfileUpdate, SubscriptionTier},
    startup::AppState,
    utils::validation::JsonBody,
};

pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let mut profile = state.store.get_or_create_profile(&user.sub, &user.email).await?;
    let can_create_chat = state.quota.can_create_chat(&mut profile).await?;
    let tier = SubscriptionTier::for_profile(&profile, state.quota.free_limit());

    Ok(Json(ProfileResponse {
        profile,
        tier,
        can_create_chat,
    }))
}

/// Apply the editable subset of profile fields.
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, AppError> {
    let update = payload.sanitize().map_err(AppError::bad_request)?;
    let mut profile = state.store.get_or_create_profile(&user.sub, &user.email).await?;

    if !update.is_empty() {
        update.apply(&mut profile);
        state.store.save_profile(&profile).await?;
        tracing::info!(user_id = %user.sub, "Profile updated");
    }

    let can_create_chat = state.quota.can_create_chat(&mut profile).await?;
    let tier = SubscriptionTier::for_profile(&profile, state.quota.free_limit());

    Ok(Json(ProfileResponse {
        profile,
        tier,
        can_create_chat,
    }))
}
