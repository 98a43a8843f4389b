use super::Language;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    DepositReturn,
    Complaint,
    Lawsuit,
    Letter,
    Form,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::DepositReturn => "deposit_return",
            DocumentType::Complaint => "complaint",
            DocumentType::Lawsuit => "lawsuit",
            DocumentType::Letter => "letter",
            DocumentType::Form => "form",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "deposit_return" | "depositReturn" => Ok(DocumentType::DepositReturn),
            "complaint" => Ok(DocumentType::Complaint),
            "lawsuit" => Ok(DocumentType::Lawsuit),
            "letter" => Ok(DocumentType::Letter),
            "form" => Ok(DocumentType::Form),
            other => Err(format!("Unknown document type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Completed,
    Failed,
}

/// A user's request to render a legal document, tracked through PDF generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_session_id: Option<String>,
    pub document_type: DocumentType,
    pub language: Language,
    pub status: DocumentStatus,
    pub title: String,
    /// Submitted answers, keyed by question field.
    pub content: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
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

impl DocumentRequest {
    pub fn pending(
        user_id: &str,
        document_type: DocumentType,
        language: Language,
        content: serde_json::Map<String, serde_json::Value>,
        chat_session_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            chat_session_id,
            document_type,
            language,
            status: DocumentStatus::Pending,
            title: format!("{} ({})", document_type, now.format("%Y-%m-%d")),
            content,
            pdf_url: None,
            file_size: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn complete(&mut self, pdf_url: String, file_size: Option<u64>) {
        let now = Utc::now();
        self.status = DocumentStatus::Completed;
        self.pdf_url = Some(pdf_url);
        self.file_size = file_size;
        self.updated_at = now;
        self.completed_at = Some(now);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = DocumentStatus::Failed;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }
}
