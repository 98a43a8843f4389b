//! Command markers embedded in model replies.
//!
//! The model may emit `[N8N_CALL:{...}]` to request a case-law search. Each
//! marker is forwarded to the workflow webhook and replaced in the reply by
//! the search result or a localized fallback sentence, so no raw marker ever
//! reaches storage or the client.

use crate::models::Language;
use crate::services::webhook::{WebhookClient, WebhookError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[N8N_CALL:(\{.*?\})\]").expect("marker pattern is valid"));

/// Outcome of resolving a single marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerOutcome {
    Resolved(String),
    Unavailable,
    Malformed,
}

impl MarkerOutcome {
    fn label(&self) -> &'static str {
        match self {
            MarkerOutcome::Resolved(_) => "resolved",
            MarkerOutcome::Unavailable => "unavailable",
            MarkerOutcome::Malformed => "malformed",
        }
    }
}

struct MarkerTexts {
    results_header: &'static str,
    unavailable: &'static str,
    malformed: &'static str,
}

fn texts(language: Language) -> MarkerTexts {
    match language {
        Language::Nl => MarkerTexts {
            results_header: "Juridische zoekresultaten",
            unavailable: "Het zoeken in de rechtspraak is tijdelijk niet beschikbaar. Deze informatie is gebaseerd op algemene kennis.",
            malformed: "Er ging iets mis bij het raadplegen van de rechtspraakdatabase. Deze informatie is gebaseerd op algemene kennis.",
        },
        Language::Ar => MarkerTexts {
            results_header: "نتائج البحث القانوني",
            unavailable: "البحث في السوابق القضائية غير متاح مؤقتاً. تستند هذه المعلومات إلى المعرفة العامة.",
            malformed: "حدث خطأ أثناء الوصول إلى قاعدة بيانات السوابق القضائية. تستند هذه المعلومات إلى المعرفة العامة.",
        },
        Language::Es => MarkerTexts {
            results_header: "Resultados de la búsqueda jurídica",
            unavailable: "La búsqueda de jurisprudencia no está disponible temporalmente. La información se basa en conocimientos generales.",
            malformed: "Error al acceder a la base de datos de jurisprudencia. La información se basa en conocimientos generales.",
        },
        Language::Ru => MarkerTexts {
            results_header: "Результаты правового поиска",
            unavailable: "Поиск судебной практики временно недоступен. Информация предоставлена на основе общих знаний.",
            malformed: "Ошибка при обращении к базе судебной практики. Информация предоставлена на основе общих знаний.",
        },
        Language::Fr => MarkerTexts {
            results_header: "Résultats de la recherche juridique",
            unavailable: "La recherche de jurisprudence est temporairement indisponible. Ces informations reposent sur des connaissances générales.",
            malformed: "Erreur lors de l'accès à la base de jurisprudence. Ces informations reposent sur des connaissances générales.",
        },
        Language::En | Language::Pl | Language::De => MarkerTexts {
            results_header: "Legal search results",
            unavailable: "Case-law search is temporarily unavailable. This information is based on general knowledge.",
            malformed: "An error occurred while accessing the case-law database. This information is based on general knowledge.",
        },
    }
}

/// Text that takes the place of a marker in the final reply.
pub fn replacement_text(outcome: &MarkerOutcome, language: Language) -> String {
    let texts = texts(language);
    match outcome {
        MarkerOutcome::Resolved(data) => {
            format!("\n\n**{}:**\n{}\n\n", texts.results_header, data)
        }
        MarkerOutcome::Unavailable => format!("\n\n*{}*\n\n", texts.unavailable),
        MarkerOutcome::Malformed => format!("\n\n*{}*\n\n", texts.malformed),
    }
}

/// Resolves markers through the workflow webhook.
#[derive(Clone)]
pub struct CommandMarkerProcessor {
    client: WebhookClient,
    webhook_url: Option<String>,
    timeout: Duration,
}

impl CommandMarkerProcessor {
    pub fn new(client: WebhookClient, webhook_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client,
            webhook_url,
            timeout,
        }
    }

    /// Replace every marker in `reply`, left to right.
    #[tracing::instrument(skip(self, reply), fields(reply_len = reply.len()))]
    pub async fn process(&self, reply: &str, language: Language) -> String {
        let markers: Vec<(usize, usize, String)> = MARKER
            .captures_iter(reply)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let payload = captures.get(1)?;
                Some((whole.start(), whole.end(), payload.as_str().to_string()))
            })
            .collect();

        if markers.is_empty() {
            return reply.to_string();
        }

        let mut output = String::with_capacity(reply.len());
        let mut last_end = 0;

        for (start, end, payload) in &markers {
            let outcome = self.resolve(payload, language).await;
            metrics::counter!("command_marker_calls_total", "outcome" => outcome.label())
                .increment(1);

            output.push_str(&reply[last_end..*start]);
            output.push_str(&replacement_text(&outcome, language));
            last_end = *end;
        }

        output.push_str(&reply[last_end..]);
        tracing::info!(markers = markers.len(), "Processed command markers");
        output
    }

    async fn resolve(&self, payload: &str, language: Language) -> MarkerOutcome {
        let mut command = match serde_json::from_str::<serde_json::Value>(payload) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                tracing::warn!("Command marker payload is not a JSON object");
                return MarkerOutcome::Malformed;
            }
        };

        let Some(url) = self.webhook_url.as_deref() else {
            tracing::warn!("Command marker found but no workflow webhook is configured");
            return MarkerOutcome::Unavailable;
        };

        command.insert(
            "language".to_string(),
            serde_json::Value::String(language.as_str().to_string()),
        );

        match self.client.post_json(url, &command, self.timeout).await {
            Ok(result) => match result.get("data") {
                Some(data) if is_truthy(data) => MarkerOutcome::Resolved(render_data(data)),
                _ => {
                    tracing::warn!("Workflow webhook returned no data for command marker");
                    MarkerOutcome::Unavailable
                }
            },
            Err(WebhookError::Timeout) => {
                tracing::warn!("Workflow webhook timed out for command marker");
                MarkerOutcome::Unavailable
            }
            Err(e) => {
                tracing::warn!(error = %e, "Workflow webhook failed for command marker");
                MarkerOutcome::Unavailable
            }
        }
    }
}

fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

fn render_data(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains_marker(text: &str) -> bool {
        MARKER.is_match(text)
    }

    fn offline_processor() -> CommandMarkerProcessor {
        CommandMarkerProcessor::new(WebhookClient::new(), None, Duration::from_secs(1))
    }

    #[test]
    fn detects_markers_non_greedily() {
        let text = r#"a [N8N_CALL:{"x":1}] b [N8N_CALL:{"y":2}] c"#;
        let payloads: Vec<&str> = MARKER
            .captures_iter(text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        assert_eq!(payloads, vec![r#"{"x":1}"#, r#"{"y":2}"#]);
    }

    #[test]
    fn text_without_markers_is_untouched() {
        assert!(!contains_marker("Plain answer about article 7:201 BW."));
    }

    #[tokio::test]
    async fn unconfigured_webhook_yields_fallback_sentence() {
        let reply = r#"Analysis. [N8N_CALL:{"action":"legal_search","data":{"query":"deposit"}}] End."#;
        let processed = offline_processor().process(reply, Language::En).await;

        assert!(!contains_marker(&processed));
        assert!(processed.starts_with("Analysis."));
        assert!(processed.ends_with("End."));
        assert!(processed.contains("Case-law search is temporarily unavailable"));
    }

    #[tokio::test]
    async fn malformed_payload_yields_error_sentence() {
        let reply = "Before [N8N_CALL:{not json}] after";
        let processed = offline_processor().process(reply, Language::Nl).await;

        assert!(!processed.contains("N8N_CALL"));
        assert!(processed.contains("rechtspraakdatabase"));
    }

    #[test]
    fn resolved_outcome_renders_header_and_data() {
        let text = replacement_text(
            &MarkerOutcome::Resolved("ECLI:NL:HR:2020:1".to_string()),
            Language::En,
        );
        assert_eq!(text, "\n\n**Legal search results:**\nECLI:NL:HR:2020:1\n\n");
    }

    #[test]
    fn truthiness_follows_json_semantics() {
        assert!(!is_truthy(&serde_json::json!("")));
        assert!(!is_truthy(&serde_json::json!(null)));
        assert!(!is_truthy(&serde_json::json!(0)));
        assert!(is_truthy(&serde_json::json!([])));
        assert!(is_truthy(&serde_json::json!("cases")));
    }
}
