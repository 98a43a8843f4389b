//! Monthly allowance of new conversations for non-premium users.

use crate::models::profile::first_of_next_month;
use crate::models::{Profile, SubscriptionTier};
use crate::services::store::ChatStore;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::Arc;

/// Zero the counter and move the reset date forward once the current
/// period has ended. Returns true when the profile changed.
pub fn roll_over_period(profile: &mut Profile, now: DateTime<Utc>) -> bool {
    if now < profile.subscription_reset_date {
        return false;
    }
    profile.chat_count_current_month = 0;
    profile.subscription_reset_date = first_of_next_month(now);
    profile.updated_at = now;
    true
}

/// Whether a profile may open another conversation this period.
pub fn allows_new_chat(profile: &Profile, free_limit: u32) -> bool {
    match SubscriptionTier::for_profile(profile, free_limit).chat_limit_monthly {
        None => true,
        Some(limit) => profile.chat_count_current_month < limit,
    }
}

#[derive(Clone)]
pub struct QuotaService {
    store: Arc<dyn ChatStore>,
    free_limit: u32,
}

impl QuotaService {
    pub fn new(store: Arc<dyn ChatStore>, free_limit: u32) -> Self {
        Self { store, free_limit }
    }

    pub fn free_limit(&self) -> u32 {
        self.free_limit
    }

    /// Check the allowance, persisting a period roll-over if one was due.
    pub async fn can_create_chat(&self, profile: &mut Profile) -> Result<bool, AppError> {
        if profile.has_premium_access() {
            return Ok(true);
        }

        if roll_over_period(profile, Utc::now()) {
            tracing::info!(user_id = %profile.id, "Monthly chat counter reset");
            self.store.save_profile(profile).await?;
        }

        Ok(allows_new_chat(profile, self.free_limit))
    }

    /// Fail with `LIMIT_REACHED` unless the profile may open a conversation.
    pub async fn ensure_can_create_chat(&self, profile: &mut Profile) -> Result<(), AppError> {
        let allowed = self.can_create_chat(profile).await.map_err(|e| {
            tracing::error!(error = %e, "Quota check failed");
            AppError::Internal("Error checking chat limits".to_string())
        })?;
        if !allowed {
            tracing::info!(
                user_id = %profile.id,
                count = profile.chat_count_current_month,
                "Monthly chat limit reached"
            );
            return Err(AppError::limit_reached());
        }
        Ok(())
    }

    pub async fn record_new_chat(&self, user_id: &str) -> Result<(), AppError> {
        self.store.increment_chat_count(user_id).await
    }
}
