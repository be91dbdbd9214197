//! The exchange controller: one request/response cycle per submission.
//!
//! The controller holds no session state.  It reads and mutates the
//! [`ConversationStore`] it is handed, and talks to the answer service only
//! through [`AnswerService`].  Every submission that gets past the input
//! guard ends with exactly one bot message and the loading flag cleared,
//! whether the service answers, fails, or the caller stops waiting.

use crate::client::AnswerService;
use crate::observability::{
    EXCHANGES_ANSWERED, EXCHANGES_FAILED, EXCHANGES_STARTED, SUBMISSIONS_IGNORED,
};
use crate::store::ConversationStore;
use crate::types::{AnswerResponse, BotPayload, QueryRequest};

/// Bot text shown when an exchange fails for any reason.
pub const CONNECTION_ERROR_MESSAGE: &str =
    "⚠️ Connection Error: Please ensure the backend is running.";

/// Why a submission was dropped without touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The input was empty after trimming.
    EmptyInput,

    /// Another exchange is still waiting on the service.
    ExchangeInFlight,
}

/// The result of one call to [`ExchangeController::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing happened.
    Ignored(IgnoreReason),

    /// The service answered and its reply was appended.
    Answered,

    /// The exchange failed and the connection placeholder was appended.
    Failed,
}

impl SubmitOutcome {
    /// Returns true if the submission was a no-op.
    pub fn is_ignored(&self) -> bool {
        matches!(self, SubmitOutcome::Ignored(_))
    }

    /// Returns true if the service answered.
    pub fn is_answered(&self) -> bool {
        matches!(self, SubmitOutcome::Answered)
    }

    /// Returns true if the exchange failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, SubmitOutcome::Failed)
    }
}

/// The payload appended when an exchange fails.
pub fn connection_error_payload() -> BotPayload {
    BotPayload::new(CONNECTION_ERROR_MESSAGE)
}

/// Drives exchanges between a conversation store and an answer service.
pub struct ExchangeController<S: AnswerService> {
    service: S,
}

impl<S: AnswerService> ExchangeController<S> {
    /// Creates a controller that asks `service`.
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// The answer service this controller asks.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submits user input.
    ///
    /// Empty or whitespace-only input, or input arriving while an exchange
    /// is in flight, is ignored.  Otherwise the pending input is cleared, the
    /// trimmed text is appended as a user message, and the store stays in
    /// the loading state until the bot reply (or the connection placeholder)
    /// has been appended.
    ///
    /// Failures never escape: they become the placeholder message.  If the
    /// returned future is dropped before the service answers, the placeholder
    /// is appended and the exchange ended on drop.
    pub async fn submit(&self, store: &mut ConversationStore, raw_input: &str) -> SubmitOutcome {
        let query = raw_input.trim();
        if query.is_empty() {
            SUBMISSIONS_IGNORED.click();
            tracing::debug!("ignoring empty submission");
            return SubmitOutcome::Ignored(IgnoreReason::EmptyInput);
        }
        if store.is_exchanging() {
            SUBMISSIONS_IGNORED.click();
            tracing::debug!("ignoring submission while an exchange is in flight");
            return SubmitOutcome::Ignored(IgnoreReason::ExchangeInFlight);
        }

        store.set_input(String::new());
        store.append_user_message(query);
        let exchange = PendingExchange::begin(store);
        EXCHANGES_STARTED.click();
        tracing::debug!(query_chars = query.chars().count(), "exchange started");

        let request = QueryRequest::new(query);
        let answer = self
            .service
            .ask(&request)
            .await
            .and_then(AnswerResponse::into_payload);

        match answer {
            Ok(payload) => {
                EXCHANGES_ANSWERED.click();
                tracing::debug!(
                    detected_language = ?payload.detected_language,
                    sources = payload.sources.as_ref().map_or(0, Vec::len),
                    "exchange answered"
                );
                exchange.resolve(payload);
                SubmitOutcome::Answered
            }
            Err(err) => {
                EXCHANGES_FAILED.click();
                if err.is_malformed_response() {
                    tracing::warn!(error = %err, "answer service returned a malformed answer");
                } else {
                    tracing::warn!(error = %err, "answer service request failed");
                }
                exchange.resolve(connection_error_payload());
                SubmitOutcome::Failed
            }
        }
    }
}

/// An exchange between `begin_exchange` and `end_exchange`.
///
/// Resolving appends the bot message and ends the exchange exactly once.
/// Dropping it unresolved does the same with the connection placeholder.
struct PendingExchange<'a> {
    store: &'a mut ConversationStore,
    resolved: bool,
}

impl<'a> PendingExchange<'a> {
    fn begin(store: &'a mut ConversationStore) -> Self {
        store.begin_exchange();
        Self {
            store,
            resolved: false,
        }
    }

    fn resolve(mut self, payload: BotPayload) {
        self.finish(payload);
    }

    fn finish(&mut self, payload: BotPayload) {
        if self.resolved {
            return;
        }
        self.resolved = true;
        self.store.append_bot_message(payload);
        self.store.end_exchange();
    }
}

impl Drop for PendingExchange<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            EXCHANGES_FAILED.click();
            tracing::warn!("exchange abandoned before the answer service replied");
            self.finish(connection_error_payload());
        }
    }
}
