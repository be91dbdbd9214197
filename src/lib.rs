// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod exchange;
pub mod markdown;
pub mod observability;
pub mod render;
pub mod store;
pub mod types;

// Re-exports
pub use client::{AnswerClient, AnswerService};
pub use error::{Error, Result};
pub use exchange::{ExchangeController, IgnoreReason, SubmitOutcome};
pub use render::{PlainTextRenderer, Renderer};
pub use store::{ConversationStore, StoreChange, StoreObserver};
pub use types::*;
