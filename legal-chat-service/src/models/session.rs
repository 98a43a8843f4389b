//! Conversation records and the messages they hold.

use super::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Characters of the opening message kept as a new conversation's title.
pub const TITLE_PREFIX_CHARS: usize = 50;

pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_ATTACHMENT_TYPES: [&str; 7] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/jpg",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// A file the user uploaded and referenced from a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FileAttachment {
    #[validate(length(min = 1, max = 200))]
    pub id: String,

    #[validate(length(min = 1, max = 255, message = "Attachment name is required"))]
    pub name: String,

    #[validate(range(max = 10485760, message = "File too large. Maximum size is 10MB."))]
    pub size: u64,

    #[serde(rename = "type")]
    #[validate(custom(function = "validate_mime_type"))]
    pub mime_type: String,

    #[validate(length(max = 2048))]
    pub url: String,

    /// Inline text for plain-text uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

fn validate_mime_type(mime_type: &str) -> Result<(), validator::ValidationError> {
    if ALLOWED_ATTACHMENT_TYPES.contains(&mime_type) {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("mime_type");
        err.message = Some("File type not supported".into());
        Err(err)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<FileAttachment>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>, attachments: Vec<FileAttachment>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            attachments,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
        }
    }
}

/// A persisted conversation owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub language: Language,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    pub fn new(user_id: &str, title: impl Into<String>, language: Language) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.into(),
            language,
            status: SessionStatus::Active,
            messages: Vec::new(),
            legal_topic: None,
            summary: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Apply a status change, stamping `completed_at` on completion.
    pub fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.completed_at = match status {
            SessionStatus::Completed => Some(Utc::now()),
            _ => self.completed_at,
        };
        self.updated_at = Utc::now();
    }
}

/// Title for a conversation started by `message`.
pub fn derive_title(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return "New chat".to_string();
    }
    if trimmed.chars().count() > TITLE_PREFIX_CHARS {
        let prefix: String = trimmed.chars().take(TITLE_PREFIX_CHARS).collect();
        format!("{}...", prefix)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_message_becomes_title_verbatim() {
        assert_eq!(derive_title("My landlord kept my deposit"), "My landlord kept my deposit");
    }

    #[test]
    fn long_message_is_cut_at_fifty_chars() {
        let message = "a".repeat(51);
        let title = derive_title(&message);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn exactly_fifty_chars_has_no_ellipsis() {
        let message = "b".repeat(50);
        assert_eq!(derive_title(&message), message);
    }

    #[test]
    fn title_counts_characters_not_bytes() {
        let message = "ж".repeat(60);
        let title = derive_title(&message);
        assert_eq!(title.chars().count(), 53);
    }

    #[test]
    fn completing_a_session_stamps_completed_at() {
        let mut session = ChatSession::new("user-1", "title", Language::En);
        session.set_status(SessionStatus::Completed);
        assert!(session.completed_at.is_some());
    }

    #[test]
    fn attachment_rules() {
        let mut attachment = FileAttachment {
            id: "a1".to_string(),
            name: "lease.pdf".to_string(),
            size: 1024,
            mime_type: "application/pdf".to_string(),
            url: "https://files.local/lease.pdf".to_string(),
            content: None,
        };
        assert!(attachment.validate().is_ok());

        attachment.size = MAX_ATTACHMENT_BYTES + 1;
        assert!(attachment.validate().is_err());

        attachment.size = 10;
        attachment.mime_type = "application/zip".to_string();
        assert!(attachment.validate().is_err());
    }
}
