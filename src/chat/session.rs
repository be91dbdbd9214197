//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns one conversation
//! store and the exchange controller that feeds it.

use crate::chat::config::ChatConfig;
use crate::client::{AnswerClient, AnswerService};
use crate::error::Result;
use crate::exchange::{ExchangeController, SubmitOutcome};
use crate::store::{ConversationStore, StoreObserver};
use crate::types::Sender;

/// A chat session that manages conversation state and service interactions.
///
/// The session is the only owner of its store, so submissions are
/// serialized by `&mut self`.
pub struct ChatSession<S: AnswerService = AnswerClient> {
    config: ChatConfig,
    controller: ExchangeController<S>,
    store: ConversationStore,
    answered: u64,
    failed: u64,
    ignored: u64,
    // Still set if a `send` future was dropped while waiting on the service.
    awaiting_answer: bool,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The number of messages in the conversation, welcome included.
    pub message_count: usize,
    /// Messages the user sent.
    pub user_messages: usize,
    /// Messages the assistant showed, placeholders included.
    pub bot_messages: usize,
    /// Exchanges the service answered.
    pub answered: u64,
    /// Exchanges that ended with the connection placeholder.
    pub failed: u64,
    /// Submissions dropped without contacting the service.
    pub ignored: u64,
}

impl ChatSession<AnswerClient> {
    /// Creates a new chat session that talks to the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not a usable URL or the HTTP
    /// client cannot be built.
    pub fn new(mut config: ChatConfig) -> Result<Self> {
        let client = config.build_client()?;
        config.endpoint = Some(client.endpoint().to_string());
        Ok(Self::with_service(client, config))
    }
}

impl<S: AnswerService> ChatSession<S> {
    /// Creates a new chat session backed by a custom answer service.
    pub fn with_service(service: S, config: ChatConfig) -> Self {
        Self {
            config,
            controller: ExchangeController::new(service),
            store: ConversationStore::new(),
            answered: 0,
            failed: 0,
            ignored: 0,
            awaiting_answer: false,
        }
    }

    /// Registers an observer on the session's store.
    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
        self.store.subscribe(observer);
    }

    /// Submits one line of user input.
    ///
    /// See [`ExchangeController::submit`]; failures are already recorded in
    /// the conversation as the connection placeholder.  Dropping the returned
    /// future mid-flight counts as a failed exchange.
    pub async fn send(&mut self, input: &str) -> SubmitOutcome {
        self.failed += self.abandoned_exchanges();
        self.awaiting_answer = true;
        let outcome = self.controller.submit(&mut self.store, input).await;
        self.awaiting_answer = false;
        match outcome {
            SubmitOutcome::Answered => self.answered += 1,
            SubmitOutcome::Failed => self.failed += 1,
            SubmitOutcome::Ignored(_) => self.ignored += 1,
        }
        outcome
    }

    /// Records the current line editor contents as uncommitted input.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.store.set_input(text);
    }

    /// The conversation store.
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// The session configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The answer service.
    pub fn service(&self) -> &S {
        self.controller.service()
    }

    /// Returns the number of messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.store.messages().len()
    }

    /// Returns statistics about the current session.
    pub fn stats(&self) -> SessionStats {
        let messages = self.store.messages();
        let user_messages = messages
            .iter()
            .filter(|m| m.sender == Sender::User)
            .count();
        SessionStats {
            message_count: messages.len(),
            user_messages,
            bot_messages: messages.len() - user_messages,
            answered: self.answered,
            failed: self.failed + self.abandoned_exchanges(),
            ignored: self.ignored,
        }
    }

    fn abandoned_exchanges(&self) -> u64 {
        u64::from(self.awaiting_answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::exchange::{CONNECTION_ERROR_MESSAGE, IgnoreReason};
    use crate::types::{AnswerResponse, Language, QueryRequest};
    use std::time::Duration;

    /// Answers "hello", never answers "wait", and fails everything else.
    struct Greeter;

    #[async_trait::async_trait]
    impl AnswerService for Greeter {
        async fn ask(&self, request: &QueryRequest) -> Result<AnswerResponse> {
            if request.query == "wait" {
                std::future::pending::<()>().await;
            }
            if request.query == "hello" {
                Ok(AnswerResponse::new("Hi! How can I help?")
                    .with_detected_language(Language::En))
            } else {
                Err(Error::api(503, "service unavailable"))
            }
        }
    }

    fn session() -> ChatSession<Greeter> {
        ChatSession::with_service(Greeter, ChatConfig::new())
    }

    #[test]
    fn new_session_has_welcome() {
        let session = session();
        assert_eq!(session.message_count(), 1);
        let stats = session.stats();
        assert_eq!(stats.bot_messages, 1);
        assert_eq!(stats.user_messages, 0);
    }

    #[test]
    fn new_session_resolves_endpoint() {
        let config = ChatConfig::new().with_endpoint("http://localhost:9000/api/v1/chat");
        let session = ChatSession::new(config).unwrap();
        assert_eq!(
            session.config().endpoint.as_deref(),
            Some("http://localhost:9000/api/v1/chat")
        );
        assert_eq!(
            session.service().endpoint().as_str(),
            "http://localhost:9000/api/v1/chat"
        );
    }

    #[test]
    fn new_session_rejects_bad_endpoint() {
        let config = ChatConfig::new().with_endpoint("not a url");
        assert!(ChatSession::new(config).is_err());
    }

    #[tokio::test]
    async fn send_counts_outcomes() {
        let mut session = session();
        session.set_input("hello");
        assert_eq!(session.send("hello").await, SubmitOutcome::Answered);
        assert_eq!(session.store().pending_input(), "");
        assert_eq!(session.send("fees?").await, SubmitOutcome::Failed);
        assert_eq!(
            session.send("   ").await,
            SubmitOutcome::Ignored(IgnoreReason::EmptyInput)
        );

        let stats = session.stats();
        assert_eq!(
            stats,
            SessionStats {
                message_count: 5,
                user_messages: 2,
                bot_messages: 3,
                answered: 1,
                failed: 1,
                ignored: 1,
            }
        );
        assert_eq!(
            session.store().last_message().unwrap().text,
            CONNECTION_ERROR_MESSAGE
        );
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_send_counts_as_failed() {
        let mut session = session();
        let waited = tokio::time::timeout(Duration::from_secs(30), session.send("wait")).await;
        assert!(waited.is_err());

        let stats = session.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.bot_messages as u64, 1 + stats.answered + stats.failed);
        assert!(!session.store().is_exchanging());
        assert_eq!(
            session.store().last_message().unwrap().text,
            CONNECTION_ERROR_MESSAGE
        );

        assert!(session.send("hello").await.is_answered());
        let stats = session.stats();
        assert_eq!((stats.answered, stats.failed), (1, 1));
        assert_eq!(stats.bot_messages as u64, 1 + stats.answered + stats.failed);
    }
}
