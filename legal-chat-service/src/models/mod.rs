pub mod document;
pub mod language;
pub mod profile;
pub mod session;

pub use document::{DocumentRequest, DocumentStatus, DocumentType};
pub use language::Language;
pub use profile::{
    Profile, ProfileUpdate, SanitizedProfileUpdate, SubscriptionTier, UserRole,
};
pub use session::{
    derive_title, ChatMessage, ChatSession, FileAttachment, MessageRole, SessionStatus,
};
