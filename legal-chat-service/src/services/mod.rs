pub mod auth;
pub mod documents;
pub mod markers;
pub mod metrics;
pub mod prompts;
pub mod providers;
pub mod quota;
pub mod relay;
pub mod store;
pub mod webhook;

pub use auth::{AccessTokenClaims, TokenVerifier};
pub use documents::{DocumentService, PdfGenerator};
pub use markers::CommandMarkerProcessor;
pub use quota::QuotaService;
pub use relay::ChatRelay;
pub use store::{ChatStore, InMemoryStore, MongoStore};
pub use webhook::WebhookClient;
