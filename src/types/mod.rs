// Public modules
pub mod answer_response;
pub mod language;
pub mod message;
pub mod query_request;

// Re-exports
pub use answer_response::AnswerResponse;
pub use language::Language;
pub use message::{BotPayload, Message, Sender};
pub use query_request::QueryRequest;
