#![allow(dead_code)]

use jsonwebtoken::{encode, EncodingKey, Header};
use legal_chat_service::config::{
    AuthConfig, ChatConfig, MongoConfig, OpenAiConfig, QuotaConfig, RelayBackend, RelayConfig,
    StorageBackend, StorageConfig, WorkflowConfig,
};
use legal_chat_service::models::Profile;
use legal_chat_service::services::{AccessTokenClaims, ChatStore, InMemoryStore};
use legal_chat_service::startup::Application;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::MockServer;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_USER_ID: &str = "3f0c1a52-6a1e-4d54-9a55-0d5c7f1e2b10";
pub const TEST_EMAIL: &str = "tenant@example.nl";

pub const COMMAND_WEBHOOK_PATH: &str = "/webhook/legal";
pub const CHAT_WEBHOOK_PATH: &str = "/webhook/chat";
pub const PDF_WEBHOOK_PATH: &str = "/webhook/pdf";
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Configuration pointing every upstream at the given mock servers.
pub fn test_config(model_uri: &str, webhook_uri: &str) -> ChatConfig {
    let mut common = service_core::config::Config::default();
    common.port = 0;

    ChatConfig {
        common,
        storage: StorageConfig {
            backend: StorageBackend::Memory,
            mongodb: MongoConfig {
                uri: String::new(),
                database: "legal_chat_test".to_string(),
            },
        },
        openai: OpenAiConfig {
            api_key: Some(Secret::new("test-openai-key".to_string())),
            base_url: format!("{}/v1", model_uri),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1500,
            timeout_secs: 5,
            context_messages: 10,
        },
        relay: RelayConfig {
            backend: RelayBackend::Model,
        },
        workflow: WorkflowConfig {
            webhook_url: Some(format!("{}{}", webhook_uri, COMMAND_WEBHOOK_PATH)),
            chat_webhook_url: Some(format!("{}{}", webhook_uri, CHAT_WEBHOOK_PATH)),
            pdf_webhook_url: Some(format!("{}{}", webhook_uri, PDF_WEBHOOK_PATH)),
            timeout_secs: 5,
            pdf_timeout_secs: 5,
        },
        auth: AuthConfig {
            jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
            audience: None,
        },
        quota: QuotaConfig {
            free_monthly_chats: 1,
        },
        rate_limit_per_minute: 1000,
    }
}

pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15 }
    })
}

pub fn token_for(user_id: &str) -> String {
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        email: format!("{}@example.nl", &user_id[..8.min(user_id.len())]),
        exp: chrono::Utc::now().timestamp() + 3600,
        iat: Some(chrono::Utc::now().timestamp()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: Arc<InMemoryStore>,
    pub model_server: MockServer,
    pub webhook_server: MockServer,
    pub client: reqwest::Client,
    pub token: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut ChatConfig)) -> Self {
        let model_server = MockServer::start().await;
        let webhook_server = MockServer::start().await;

        let mut config = test_config(&model_server.uri(), &webhook_server.uri());
        configure(&mut config);

        let store = Arc::new(InMemoryStore::new());
        let app = Application::build_with_store(config, store.clone())
            .await
            .expect("Failed to build test application");

        let port = app.http_port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped(std::future::pending()).await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            store,
            model_server,
            webhook_server,
            client,
            token: token_for(TEST_USER_ID),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_chat(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url("/chat"))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .expect("Failed to execute request");
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }

    /// Seed the caller's profile, e.g. to exhaust the quota or grant premium.
    pub async fn update_profile(&self, change: impl FnOnce(&mut Profile)) {
        let mut profile = self
            .store
            .get_or_create_profile(TEST_USER_ID, TEST_EMAIL)
            .await
            .expect("Failed to load profile");
        change(&mut profile);
        self.store
            .save_profile(&profile)
            .await
            .expect("Failed to save profile");
    }
}
