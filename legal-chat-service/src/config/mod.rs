use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub storage: StorageConfig,
    pub openai: OpenAiConfig,
    pub relay: RelayConfig,
    pub workflow: WorkflowConfig,
    pub auth: AuthConfig,
    pub quota: QuotaConfig,
    pub rate_limit_per_minute: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<Secret<String>>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Number of trailing conversation messages sent with each request.
    pub context_messages: usize,
}

/// Which upstream answers chat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayBackend {
    Model,
    Workflow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    pub backend: RelayBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Receives command markers and, unless overridden, workflow chat messages.
    pub webhook_url: Option<String>,
    pub chat_webhook_url: Option<String>,
    pub pdf_webhook_url: Option<String>,
    pub timeout_secs: u64,
    pub pdf_timeout_secs: u64,
}

impl WorkflowConfig {
    pub fn chat_url(&self) -> Option<&str> {
        self.chat_webhook_url
            .as_deref()
            .or(self.webhook_url.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuotaConfig {
    pub free_monthly_chats: u32,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod"
            || common_config.is_production();

        let backend = match get_env("STORAGE_BACKEND", Some("mongodb"), is_prod)?.as_str() {
            "memory" => StorageBackend::Memory,
            "mongodb" => StorageBackend::Mongodb,
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "STORAGE_BACKEND must be 'mongodb' or 'memory', got '{}'",
                    other
                )))
            }
        };

        let relay_backend = match get_env("RELAY_BACKEND", Some("model"), is_prod)?.as_str() {
            "model" => RelayBackend::Model,
            "workflow" => RelayBackend::Workflow,
            other => {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "RELAY_BACKEND must be 'model' or 'workflow', got '{}'",
                    other
                )))
            }
        };

        let config = ChatConfig {
            common: common_config,
            storage: StorageConfig {
                backend,
                mongodb: MongoConfig {
                    uri: get_env(
                        "MONGODB_URI",
                        Some("mongodb://localhost:27017"),
                        is_prod && backend == StorageBackend::Mongodb,
                    )?,
                    database: get_env("MONGODB_DATABASE", Some("legal_chat_db"), false)?,
                },
            },
            openai: OpenAiConfig {
                api_key: get_optional_env("OPENAI_API_KEY").map(Secret::new),
                base_url: get_env("OPENAI_BASE_URL", Some(DEFAULT_OPENAI_BASE_URL), false)?,
                model: get_env("OPENAI_MODEL", Some(DEFAULT_OPENAI_MODEL), false)?,
                temperature: get_parsed("OPENAI_TEMPERATURE", 0.7)?,
                max_tokens: get_parsed("OPENAI_MAX_TOKENS", 1500)?,
                timeout_secs: get_parsed("OPENAI_TIMEOUT_SECS", 45)?,
                context_messages: get_parsed("OPENAI_CONTEXT_MESSAGES", 10)?,
            },
            relay: RelayConfig {
                backend: relay_backend,
            },
            workflow: WorkflowConfig {
                webhook_url: get_optional_url("N8N_WEBHOOK_URL")?,
                chat_webhook_url: get_optional_url("N8N_CHAT_WEBHOOK_URL")?,
                pdf_webhook_url: get_optional_url("N8N_PDF_WEBHOOK_URL")?,
                timeout_secs: get_parsed("WEBHOOK_TIMEOUT_SECS", 30)?,
                pdf_timeout_secs: get_parsed("PDF_TIMEOUT_SECS", 45)?,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(get_env("AUTH_JWT_SECRET", None, is_prod)?),
                audience: get_optional_env("AUTH_JWT_AUDIENCE"),
            },
            quota: QuotaConfig {
                free_monthly_chats: get_parsed("FREE_MONTHLY_CHATS", 1)?,
            },
            rate_limit_per_minute: get_parsed("RATE_LIMIT_PER_MINUTE", 60)?,
        };

        if is_prod {
            let missing = config.missing_settings();
            if !missing.is_empty() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "missing required settings: {}",
                    missing.join(", ")
                )));
            }
        }

        Ok(config)
    }

    /// Settings the active relay backend cannot work without.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self.relay.backend {
            RelayBackend::Model => {
                if self.openai.api_key.is_none() {
                    missing.push("OPENAI_API_KEY");
                }
                if self.workflow.webhook_url.is_none() {
                    missing.push("N8N_WEBHOOK_URL");
                }
            }
            RelayBackend::Workflow => {
                if self.workflow.chat_url().is_none() {
                    missing.push("N8N_CHAT_WEBHOOK_URL");
                }
            }
        }
        missing
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn get_optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
        }),
        None => Ok(default),
    }
}

fn get_optional_url(key: &str) -> Result<Option<String>, AppError> {
    match get_optional_env(key) {
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(Some(url)),
        Some(_) => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be an http(s) URL",
            key
        ))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ChatConfig {
        ChatConfig {
            common: core_config::Config::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                mongodb: MongoConfig {
                    uri: String::new(),
                    database: "test".to_string(),
                },
            },
            openai: OpenAiConfig {
                api_key: None,
                base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
                model: DEFAULT_OPENAI_MODEL.to_string(),
                temperature: 0.7,
                max_tokens: 1500,
                timeout_secs: 45,
                context_messages: 10,
            },
            relay: RelayConfig {
                backend: RelayBackend::Model,
            },
            workflow: WorkflowConfig {
                webhook_url: None,
                chat_webhook_url: None,
                pdf_webhook_url: None,
                timeout_secs: 30,
                pdf_timeout_secs: 45,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new("secret".to_string()),
                audience: None,
            },
            quota: QuotaConfig {
                free_monthly_chats: 1,
            },
            rate_limit_per_minute: 60,
        }
    }

    #[test]
    fn model_backend_reports_missing_key_and_webhook() {
        let config = base_config();
        assert_eq!(
            config.missing_settings(),
            vec!["OPENAI_API_KEY", "N8N_WEBHOOK_URL"]
        );
    }

    #[test]
    fn workflow_chat_url_falls_back_to_shared_webhook() {
        let mut config = base_config();
        config.relay.backend = RelayBackend::Workflow;
        config.workflow.webhook_url = Some("https://n8n.local/hook".to_string());

        assert_eq!(config.workflow.chat_url(), Some("https://n8n.local/hook"));
        assert!(config.missing_settings().is_empty());
    }
}
