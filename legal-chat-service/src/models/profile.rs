use super::Language;
use crate::utils::sanitize::strip_active_content;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MAX_NAME_CHARS: usize = 50;
const MAX_EMAIL_CHARS: usize = 254;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Premium,
    Admin,
}

/// Per-user account record keyed by the identity provider's subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub preferred_language: Language,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub chat_count_current_month: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub subscription_reset_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: &str, email: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            email: email.to_string(),
            first_name: None,
            last_name: None,
            preferred_language: Language::default(),
            role: UserRole::User,
            is_premium: false,
            chat_count_current_month: 0,
            subscription_reset_date: first_of_next_month(now),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_premium_access(&self) -> bool {
        self.is_premium || matches!(self.role, UserRole::Premium | UserRole::Admin)
    }
}

/// Midnight UTC on the first day of the month after `now`.
pub fn first_of_next_month(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionTier {
    pub name: String,
    /// `None` means unlimited.
    pub chat_limit_monthly: Option<u32>,
    pub price_monthly_cents: u32,
    pub has_document_generation: bool,
    pub has_pdf_export: bool,
    pub is_active: bool,
}

impl SubscriptionTier {
    pub fn free(chat_limit_monthly: u32) -> Self {
        Self {
            name: "free".to_string(),
            chat_limit_monthly: Some(chat_limit_monthly),
            price_monthly_cents: 0,
            has_document_generation: false,
            has_pdf_export: false,
            is_active: true,
        }
    }

    pub fn premium() -> Self {
        Self {
            name: "premium".to_string(),
            chat_limit_monthly: None,
            price_monthly_cents: 999,
            has_document_generation: true,
            has_pdf_export: true,
            is_active: true,
        }
    }

    pub fn for_profile(profile: &Profile, free_limit: u32) -> Self {
        if profile.has_premium_access() {
            Self::premium()
        } else {
            Self::free(free_limit)
        }
    }
}

/// User-editable profile fields. Anything else in the request body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_language: Option<String>,
    pub email: Option<String>,
}

/// A [`ProfileUpdate`] that passed sanitisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizedProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub preferred_language: Option<Language>,
    pub email: Option<String>,
}

impl SanitizedProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self == &SanitizedProfileUpdate::default()
    }

    pub fn apply(self, profile: &mut Profile) {
        if let Some(first_name) = self.first_name {
            profile.first_name = Some(first_name);
        }
        if let Some(last_name) = self.last_name {
            profile.last_name = Some(last_name);
        }
        if let Some(language) = self.preferred_language {
            profile.preferred_language = language;
        }
        if let Some(email) = self.email {
            profile.email = email;
        }
        profile.updated_at = Utc::now();
    }
}

impl ProfileUpdate {
    pub fn sanitize(self) -> Result<SanitizedProfileUpdate, String> {
        let first_name = self
            .first_name
            .map(|v| clean_name("first_name", &v))
            .transpose()?;
        let last_name = self
            .last_name
            .map(|v| clean_name("last_name", &v))
            .transpose()?;

        let preferred_language = self
            .preferred_language
            .map(|v| {
                v.trim()
                    .parse::<Language>()
                    .map_err(|_| format!("Unsupported language: {}", v.trim()))
            })
            .transpose()?;

        let email = self
            .email
            .map(|v| {
                let cleaned = strip_active_content(v.trim()).to_lowercase();
                if cleaned.chars().count() > MAX_EMAIL_CHARS || !EMAIL_SHAPE.is_match(&cleaned) {
                    Err("Invalid email address".to_string())
                } else {
                    Ok(cleaned)
                }
            })
            .transpose()?;

        Ok(SanitizedProfileUpdate {
            first_name,
            last_name,
            preferred_language,
            email,
        })
    }
}

fn clean_name(field: &str, value: &str) -> Result<String, String> {
    let cleaned = strip_active_content(value.trim());
    if cleaned.chars().count() > MAX_NAME_CHARS {
        return Err(format!("{} must be at most {} characters", field, MAX_NAME_CHARS));
    }
    Ok(cleaned)
}
