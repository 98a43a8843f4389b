//! Guided document questionnaires and PDF generation through the PDF webhook.

use crate::models::{DocumentRequest, DocumentType, Language, Profile, SubscriptionTier};
use crate::services::store::ChatStore;
use crate::services::webhook::{WebhookClient, WebhookError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;

pub const MISSING_PARAMETERS_MESSAGE: &str =
    "Missing required parameters: documentType, documentData, or language";

/// One step of a document questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub field: &'static str,
    pub prompt: &'static str,
}

const DEPOSIT_RETURN_FIELDS: [&str; 7] = [
    "userName",
    "userAddress",
    "landlordName",
    "landlordAddress",
    "rentalAddress",
    "depositAmount",
    "moveOutDate",
];

const DEPOSIT_RETURN_EN: [&str; 7] = [
    "What is your full name?",
    "What is your current address?",
    "What is your landlord's name?",
    "What is your landlord's address?",
    "What is the address of the property you rented?",
    "How much deposit did you pay (in euros)?",
    "On what date did you move out?",
];

const DEPOSIT_RETURN_NL: [&str; 7] = [
    "Wat is je volledige naam?",
    "Wat is je huidige adres?",
    "Wat is de naam van je verhuurder?",
    "Wat is het adres van je verhuurder?",
    "Wat is het adres van de woning die je huurde?",
    "Hoeveel borg heb je betaald (in euro)?",
    "Op welke datum ben je verhuisd?",
];

const GENERIC_FIELDS: [&str; 6] = [
    "senderName",
    "senderAddress",
    "recipientName",
    "recipientAddress",
    "subject",
    "details",
];

const GENERIC_EN: [&str; 6] = [
    "What is your full name?",
    "What is your address?",
    "Who is the document addressed to?",
    "What is the recipient's address?",
    "What is the subject of the document?",
    "Describe the situation and what you are asking for.",
];

const GENERIC_NL: [&str; 6] = [
    "Wat is je volledige naam?",
    "Wat is je adres?",
    "Aan wie is het document gericht?",
    "Wat is het adres van de ontvanger?",
    "Wat is het onderwerp van het document?",
    "Beschrijf de situatie en wat je vraagt.",
];

/// Field keys a document type needs, in the order they are asked.
pub fn required_fields(document_type: DocumentType) -> &'static [&'static str] {
    match document_type {
        DocumentType::DepositReturn => &DEPOSIT_RETURN_FIELDS,
        _ => &GENERIC_FIELDS,
    }
}

/// The question sequence for a document type. Languages other than Dutch
/// get the English prompts.
pub fn questions(document_type: DocumentType, language: Language) -> Vec<Question> {
    let prompts: &[&'static str] = match (document_type, language) {
        (DocumentType::DepositReturn, Language::Nl) => &DEPOSIT_RETURN_NL,
        (DocumentType::DepositReturn, _) => &DEPOSIT_RETURN_EN,
        (_, Language::Nl) => &GENERIC_NL,
        _ => &GENERIC_EN,
    };

    required_fields(document_type)
        .iter()
        .zip(prompts)
        .map(|(&field, &prompt)| Question { field, prompt })
        .collect()
}

type Answers = serde_json::Map<String, serde_json::Value>;

fn is_answered(answers: &Answers, field: &str) -> bool {
    match answers.get(field) {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

/// First question in sequence without a usable answer.
pub fn next_question(
    document_type: DocumentType,
    language: Language,
    answers: &Answers,
) -> Option<Question> {
    questions(document_type, language)
        .into_iter()
        .find(|q| !is_answered(answers, q.field))
}

pub fn missing_fields(document_type: DocumentType, answers: &Answers) -> Vec<&'static str> {
    required_fields(document_type)
        .iter()
        .copied()
        .filter(|field| !is_answered(answers, field))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPdf {
    pub pdf_url: String,
    pub file_size: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PdfWebhookRequest<'a> {
    document_type: DocumentType,
    document_data: &'a Answers,
    language: Language,
    timestamp: String,
}

fn pdf_error(err: WebhookError) -> AppError {
    match err {
        WebhookError::NotConfigured => {
            AppError::ServiceUnavailable("PDF generation service not available".to_string())
        }
        WebhookError::Timeout => {
            AppError::GatewayTimeout("PDF generation timeout - please try again".to_string())
        }
        WebhookError::Status { status, .. } => {
            AppError::bad_gateway(format!("PDF generation failed: {}", status), None)
        }
        WebhookError::Network(e) => {
            AppError::bad_gateway("Failed to generate PDF document", Some(e))
        }
        WebhookError::InvalidResponse(reason) => AppError::bad_gateway(
            "Invalid response from PDF generation service",
            Some(reason),
        ),
    }
}

/// Calls the PDF rendering webhook.
#[derive(Clone)]
pub struct PdfGenerator {
    client: WebhookClient,
    url: Option<String>,
    timeout: Duration,
}

impl PdfGenerator {
    pub fn new(client: WebhookClient, url: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    pub async fn generate(
        &self,
        document_type: DocumentType,
        data: &Answers,
        language: Language,
    ) -> Result<GeneratedPdf, AppError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| pdf_error(WebhookError::NotConfigured))?;

        let request = PdfWebhookRequest {
            document_type,
            document_data: data,
            language,
            timestamp: Utc::now().to_rfc3339(),
        };

        let result = self
            .client
            .post_json(url, &request, self.timeout)
            .await
            .map_err(pdf_error)?;

        let pdf_url = match result.get("pdfUrl") {
            Some(serde_json::Value::String(url)) if !url.is_empty() => url.clone(),
            _ => {
                return Err(AppError::bad_gateway(
                    "PDF generation failed - no download URL received",
                    None,
                ))
            }
        };

        Ok(GeneratedPdf {
            pdf_url,
            file_size: result.get("fileSize").and_then(serde_json::Value::as_u64),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfRequest {
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub document_data: Option<Answers>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub chat_session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfResponse {
    pub success: bool,
    pub pdf_url: String,
    pub file_size: Option<u64>,
    pub document_type: DocumentType,
    pub generated_at: DateTime<Utc>,
}

/// Gatekeeping and bookkeeping around [`PdfGenerator`].
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn ChatStore>,
    generator: PdfGenerator,
    free_limit: u32,
}

impl DocumentService {
    pub fn new(store: Arc<dyn ChatStore>, generator: PdfGenerator, free_limit: u32) -> Self {
        Self {
            store,
            generator,
            free_limit,
        }
    }

    #[tracing::instrument(skip(self, profile, request), fields(user_id = %profile.id))]
    pub async fn generate_pdf(
        &self,
        profile: &Profile,
        request: PdfRequest,
    ) -> Result<PdfResponse, AppError> {
        if !SubscriptionTier::for_profile(profile, self.free_limit).has_pdf_export {
            return Err(AppError::premium_required());
        }

        let (Some(raw_type), Some(data), Some(raw_language)) = (
            request.document_type.as_deref().filter(|s| !s.is_empty()),
            request.document_data,
            request.language.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(AppError::bad_request(MISSING_PARAMETERS_MESSAGE));
        };

        let document_type: DocumentType = raw_type.parse().map_err(AppError::bad_request)?;
        let language: Language = raw_language.parse().map_err(AppError::bad_request)?;

        let missing = missing_fields(document_type, &data);
        if !missing.is_empty() {
            return Err(AppError::bad_request(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }

        let mut document = DocumentRequest::pending(
            &profile.id,
            document_type,
            language,
            data,
            request.chat_session_id,
        );
        self.store.insert_document_request(&document).await?;

        let outcome = self
            .generator
            .generate(document_type, &document.content, language)
            .await;

        match &outcome {
            Ok(pdf) => document.complete(pdf.pdf_url.clone(), pdf.file_size),
            Err(e) => document.fail(e.to_string()),
        }
        if let Err(e) = self.store.save_document_request(&document).await {
            tracing::error!(error = %e, document_id = %document.id, "Failed to save document status");
        }

        let label = if outcome.is_ok() { "success" } else { "failure" };
        metrics::counter!("pdf_generation_total", "outcome" => label).increment(1);

        let pdf = outcome.map_err(|e| {
            tracing::warn!(error = %e, document_type = %document_type, "PDF generation failed");
            e
        })?;

        tracing::info!(document_type = %document_type, "PDF generated");

        Ok(PdfResponse {
            success: true,
            pdf_url: pdf.pdf_url,
            file_size: pdf.file_size,
            document_type,
            generated_at: Utc::now(),
        })
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<DocumentRequest>, AppError> {
        self.store.list_document_requests(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::InMemoryStore;
    use serde_json::json;

    fn answers(value: serde_json::Value) -> Answers {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn deposit_return_sequence_is_localized() {
        let en = questions(DocumentType::DepositReturn, Language::En);
        let nl = questions(DocumentType::DepositReturn, Language::Nl);
        let fr = questions(DocumentType::DepositReturn, Language::Fr);

        assert_eq!(en.len(), 7);
        assert_eq!(en[0].field, "userName");
        assert_eq!(nl[0].prompt, "Wat is je volledige naam?");
        assert_eq!(fr, en);
    }

    #[test]
    fn next_question_skips_answered_fields() {
        let given = answers(json!({"userName": "Sam", "userAddress": "  "}));
        let next = next_question(DocumentType::DepositReturn, Language::En, &given).unwrap();
        assert_eq!(next.field, "userAddress");

        let complete: Answers = GENERIC_FIELDS
            .iter()
            .map(|f| (f.to_string(), json!("x")))
            .collect();
        assert!(next_question(DocumentType::Letter, Language::Nl, &complete).is_none());
    }

    #[tokio::test]
    async fn free_users_cannot_generate_pdfs() {
        let store = Arc::new(InMemoryStore::new());
        let generator = PdfGenerator::new(WebhookClient::new(), None, Duration::from_secs(1));
        let service = DocumentService::new(store, generator, 1);
        let profile = Profile::new("u1", "u1@x.nl");

        let err = service
            .generate_pdf(
                &profile,
                PdfRequest {
                    document_type: Some("letter".into()),
                    document_data: Some(Answers::new()),
                    language: Some("en".into()),
                    chat_session_id: None,
                },
            )
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn unconfigured_webhook_marks_request_failed() {
        let store = Arc::new(InMemoryStore::new());
        let generator = PdfGenerator::new(WebhookClient::new(), None, Duration::from_secs(1));
        let service = DocumentService::new(store.clone(), generator, 1);
        let mut profile = Profile::new("u1", "u1@x.nl");
        profile.is_premium = true;

        let data: Answers = DEPOSIT_RETURN_FIELDS
            .iter()
            .map(|f| (f.to_string(), json!("x")))
            .collect();
        let err = service
            .generate_pdf(
                &profile,
                PdfRequest {
                    document_type: Some("deposit_return".into()),
                    document_data: Some(data),
                    language: Some("nl".into()),
                    chat_session_id: None,
                },
            )
            .await
            .err()
            .unwrap();
        assert_eq!(err.status_code(), axum::http::StatusCode::SERVICE_UNAVAILABLE);

        let stored = store.list_document_requests("u1").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, crate::models::DocumentStatus::Failed);
    }
}
