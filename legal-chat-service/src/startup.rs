//! Application startup and lifecycle management.

use crate::config::{ChatConfig, RelayBackend, StorageBackend};
use crate::handlers;
use crate::middleware::auth_middleware;
use crate::services::providers::{ChatBackend, OpenAiProvider, WorkflowChatBackend};
use crate::services::{
    ChatRelay, ChatStore, CommandMarkerProcessor, DocumentService, InMemoryStore, MongoStore,
    PdfGenerator, QuotaService, TokenVerifier, WebhookClient,
};
use axum::{
    http::{header, HeaderName, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware},
    security_headers::security_headers_middleware,
    tracing::{request_id_middleware, REQUEST_ID_HEADER},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ChatConfig,
    pub store: Arc<dyn ChatStore>,
    pub verifier: TokenVerifier,
    pub quota: QuotaService,
    pub relay: ChatRelay,
    pub documents: DocumentService,
}

impl AppState {
    /// Wire services around an already opened store.
    pub fn new(config: ChatConfig, store: Arc<dyn ChatStore>) -> Self {
        let webhooks = WebhookClient::new();
        let free_limit = config.quota.free_monthly_chats;
        let quota = QuotaService::new(store.clone(), free_limit);

        let backend: Arc<dyn ChatBackend> = match config.relay.backend {
            RelayBackend::Model => Arc::new(OpenAiProvider::new(config.openai.clone())),
            RelayBackend::Workflow => Arc::new(WorkflowChatBackend::new(
                webhooks.clone(),
                config.workflow.chat_url().map(str::to_string),
                Duration::from_secs(config.workflow.timeout_secs),
            )),
        };
        tracing::info!(backend = backend.name(), "Initialized chat backend");

        let markers = CommandMarkerProcessor::new(
            webhooks.clone(),
            config.workflow.webhook_url.clone(),
            Duration::from_secs(config.workflow.timeout_secs),
        );
        let pdf = PdfGenerator::new(
            webhooks,
            config.workflow.pdf_webhook_url.clone(),
            Duration::from_secs(config.workflow.pdf_timeout_secs),
        );
        if !pdf.is_configured() {
            tracing::warn!("PDF webhook not configured - PDF generation will be unavailable");
        }

        Self {
            verifier: TokenVerifier::new(&config.auth),
            relay: ChatRelay::new(store.clone(), quota.clone(), backend, markers),
            documents: DocumentService::new(store.clone(), pdf, free_limit),
            quota,
            store,
            config,
        }
    }
}

/// Open the configured store, preparing indexes where needed.
async fn open_store(config: &ChatConfig) -> Result<Arc<dyn ChatStore>, AppError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage - data is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StorageBackend::Mongodb => {
            let mongo =
                MongoStore::connect(&config.storage.mongodb.uri, &config.storage.mongodb.database)
                    .await
                    .map_err(|e| {
                        tracing::error!("Failed to connect to MongoDB: {}", e);
                        e
                    })?;
            mongo.initialize_indexes().await.map_err(|e| {
                tracing::error!("Failed to initialize database indexes: {}", e);
                e
            })?;
            Ok(Arc::new(mongo))
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let limiter = create_ip_rate_limiter(state.config.rate_limit_per_minute, 60);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    let api = Router::new()
        .route("/chat", post(handlers::chat::send_message))
        .route(
            "/sessions",
            get(handlers::sessions::list_sessions)
                .post(handlers::sessions::create_session)
                .delete(handlers::sessions::delete_all_sessions),
        )
        .route(
            "/sessions/:id",
            get(handlers::sessions::get_session)
                .patch(handlers::sessions::update_session)
                .delete(handlers::sessions::delete_session),
        )
        .route(
            "/sessions/:id/messages",
            put(handlers::sessions::replace_messages),
        )
        .route(
            "/profile",
            get(handlers::profile::get_profile).patch(handlers::profile::update_profile),
        )
        .route("/documents", get(handlers::documents::list_documents))
        .route(
            "/documents/questions",
            get(handlers::documents::get_questions),
        )
        .route(
            "/documents/questionnaire",
            post(handlers::documents::questionnaire_step),
        )
        .route("/documents/pdf", post(handlers::documents::generate_pdf))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware))
        .layer(from_fn_with_state(limiter, ip_rate_limit_middleware));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .merge(api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ChatConfig) -> Result<Self, AppError> {
        let store = open_store(&config).await?;
        Self::build_with_store(config, store).await
    }

    /// Build around a caller-provided store.
    pub async fn build_with_store(
        config: ChatConfig,
        store: Arc<dyn ChatStore>,
    ) -> Result<Self, AppError> {
        let missing = config.missing_settings();
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Service is running with incomplete configuration");
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let router = build_router(AppState::new(config, store));

        // Port 0 picks a random port for testing
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let http_port = listener.local_addr()?.port();

        tracing::info!("Legal chat service listening on port {}", http_port);

        Ok(Self {
            http_port,
            listener,
            router,
        })
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Serve until the shutdown future resolves.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
