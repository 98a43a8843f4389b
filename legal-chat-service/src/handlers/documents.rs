use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::{
    dtos::{QuestionnaireRequest, QuestionsQuery},
    middleware::AuthUser,
    models::{DocumentRequest, DocumentType, Language},
    services::documents::{next_question, questions, PdfRequest, PdfResponse, Question},
    startup::AppState,
    utils::validation::JsonBody,
};

fn parse_target(
    document_type: &str,
    language: Option<&str>,
) -> Result<(DocumentType, Language), AppError> {
    let document_type: DocumentType = document_type.parse().map_err(AppError::bad_request)?;
    let language: Language = match language.map(str::trim).filter(|l| !l.is_empty()) {
        Some(code) => code.parse().map_err(AppError::bad_request)?,
        None => Language::default(),
    };
    Ok((document_type, language))
}

pub async fn get_questions(
    AuthUser(_user): AuthUser,
    Query(query): Query<QuestionsQuery>,
) -> Result<Json<Vec<Question>>, AppError> {
    let (document_type, language) =
        parse_target(&query.document_type, query.language.as_deref())?;
    Ok(Json(questions(document_type, language)))
}

/// One stateless questionnaire step: the next open question, or completion.
pub async fn questionnaire_step(
    AuthUser(_user): AuthUser,
    JsonBody(payload): JsonBody<QuestionnaireRequest>,
) -> Result<Json<Value>, AppError> {
    let (document_type, language) =
        parse_target(&payload.document_type, payload.language.as_deref())?;

    let total = questions(document_type, language).len();
    let body = match next_question(document_type, language, &payload.answers) {
        Some(question) => json!({
            "complete": false,
            "question": question,
            "total": total,
        }),
        None => json!({
            "complete": true,
            "documentType": document_type,
            "answers": payload.answers,
        }),
    };
    Ok(Json(body))
}

pub async fn generate_pdf(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<PdfRequest>,
) -> Result<Json<PdfResponse>, AppError> {
    let profile = state.store.get_or_create_profile(&user.sub, &user.email).await?;
    let response = state.documents.generate_pdf(&profile, payload).await?;
    Ok(Json(response))
}

pub async fn list_documents(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<DocumentRequest>>, AppError> {
    Ok(Json(state.documents.list(&user.sub).await?))
}
