//! The conversation store: the single source of truth for one chat session.
//!
//! The store owns the message log, the uncommitted input buffer, and the
//! loading flag.  Every mutation is reported to subscribed observers so a
//! rendering layer can redraw.  The log is append-only; nothing hands out
//! mutable access to a stored message.

use std::panic::{self, AssertUnwindSafe};

use crate::observability::RENDER_FAULTS;
use crate::types::{BotPayload, Language, Message};

/// Greeting the session opens with.
pub const WELCOME_MESSAGE: &str = "Hello! 👋 I am KPGU Assistant, here to help you with information about Drs. Kiran & Pallavi Patel Global University (KPGU) in Vadodara. How may I assist you today regarding admissions, courses, fees, or anything else about KPGU? 🎓✨";

/// A change to the store, delivered to observers after it has been applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreChange<'a> {
    /// The uncommitted input was replaced.
    InputChanged(&'a str),

    /// A message was appended to the log.
    MessageAppended(&'a Message),

    /// An exchange with the answer service began.
    ExchangeStarted,

    /// The in-flight exchange resolved.
    ExchangeFinished,
}

/// Something that reacts to store changes, typically a renderer.
///
/// Faults are isolated: an observer that returns an error or panics is
/// logged and skipped for that change, and the store carries on.
pub trait StoreObserver: Send {
    /// Called after every store mutation.
    fn on_change(&mut self, change: StoreChange<'_>) -> Result<(), String>;
}

/// Session state for one conversation.
pub struct ConversationStore {
    messages: Vec<Message>,
    pending_input: String,
    is_exchanging: bool,
    observers: Vec<Box<dyn StoreObserver>>,
}

impl ConversationStore {
    /// Creates a store seeded with the welcome message.
    pub fn new() -> Self {
        let welcome = BotPayload::new(WELCOME_MESSAGE).with_detected_language(Some(Language::En));
        Self {
            messages: vec![Message::bot(welcome)],
            pending_input: String::new(),
            is_exchanging: false,
            observers: Vec::new(),
        }
    }

    /// Registers an observer for all subsequent changes.
    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
        self.observers.push(observer);
    }

    /// The conversation log in display order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The most recent message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The uncommitted user input.
    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// True while an exchange is in flight.
    pub fn is_exchanging(&self) -> bool {
        self.is_exchanging
    }

    /// Replaces the uncommitted input.  Empty or whitespace text is allowed.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
        notify(
            &mut self.observers,
            StoreChange::InputChanged(&self.pending_input),
        );
    }

    /// Appends a user message.  Does not touch the loading flag.
    pub fn append_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
        self.notify_appended();
    }

    /// Enters the loading state.
    ///
    /// Callers serialize exchanges; the exchange controller checks
    /// [`ConversationStore::is_exchanging`] before calling this.
    pub fn begin_exchange(&mut self) {
        if self.is_exchanging {
            tracing::warn!("begin_exchange called while an exchange is in flight");
        }
        self.is_exchanging = true;
        notify(&mut self.observers, StoreChange::ExchangeStarted);
    }

    /// Appends a bot message built from `payload`.
    pub fn append_bot_message(&mut self, payload: BotPayload) {
        self.messages.push(Message::bot(payload));
        self.notify_appended();
    }

    /// Leaves the loading state.
    pub fn end_exchange(&mut self) {
        self.is_exchanging = false;
        notify(&mut self.observers, StoreChange::ExchangeFinished);
    }

    fn notify_appended(&mut self) {
        if let Some(message) = self.messages.last() {
            notify(&mut self.observers, StoreChange::MessageAppended(message));
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("messages", &self.messages)
            .field("pending_input", &self.pending_input)
            .field("is_exchanging", &self.is_exchanging)
            .field("observers", &self.observers.len())
            .finish()
    }
}

fn notify(observers: &mut [Box<dyn StoreObserver>], change: StoreChange<'_>) {
    for (index, observer) in observers.iter_mut().enumerate() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| observer.on_change(change)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                RENDER_FAULTS.click();
                tracing::warn!(observer = index, error = %err, "observer failed to handle change");
            }
            Err(_) => {
                RENDER_FAULTS.click();
                tracing::warn!(observer = index, "observer panicked while handling change");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sender;
    use std::sync::{Arc, Mutex};

    /// Records a short description of every change it sees.
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl StoreObserver for Recorder {
        fn on_change(&mut self, change: StoreChange<'_>) -> Result<(), String> {
            let entry = match change {
                StoreChange::InputChanged(text) => format!("input:{text}"),
                StoreChange::MessageAppended(message) => {
                    format!("{:?}:{}", message.sender, message.text)
                }
                StoreChange::ExchangeStarted => "started".to_string(),
                StoreChange::ExchangeFinished => "finished".to_string(),
            };
            self.seen.lock().unwrap().push(entry);
            Ok(())
        }
    }

    struct Failing;

    impl StoreObserver for Failing {
        fn on_change(&mut self, _: StoreChange<'_>) -> Result<(), String> {
            Err("terminal went away".to_string())
        }
    }

    struct Panicking;

    impl StoreObserver for Panicking {
        fn on_change(&mut self, _: StoreChange<'_>) -> Result<(), String> {
            panic!("render bug");
        }
    }

    #[test]
    fn new_store_is_seeded_with_welcome() {
        let store = ConversationStore::new();
        assert_eq!(store.messages().len(), 1);
        let welcome = &store.messages()[0];
        assert_eq!(welcome.sender, Sender::Bot);
        assert_eq!(welcome.text, WELCOME_MESSAGE);
        assert_eq!(welcome.detected_language, Some(Language::En));
        assert!(welcome.sources.is_none());
        assert!(!store.is_exchanging());
        assert_eq!(store.pending_input(), "");
    }

    #[test]
    fn set_input_replaces_unconditionally() {
        let mut store = ConversationStore::new();
        store.set_input("What are");
        store.set_input("   ");
        assert_eq!(store.pending_input(), "   ");
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn appends_preserve_order() {
        let mut store = ConversationStore::new();
        store.append_user_message("first");
        store.append_bot_message(BotPayload::new("second"));
        store.append_user_message("third");
        let texts: Vec<&str> = store.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec![WELCOME_MESSAGE, "first", "second", "third"]);
        assert!(!store.is_exchanging());
    }

    #[test]
    fn exchange_flag_toggles() {
        let mut store = ConversationStore::new();
        store.begin_exchange();
        assert!(store.is_exchanging());
        store.end_exchange();
        assert!(!store.is_exchanging());
    }

    #[test]
    fn bot_payload_fields_carry_over() {
        let mut store = ConversationStore::new();
        store.append_bot_message(
            BotPayload::new("Fees are listed below.")
                .with_detected_language(Some(Language::Gu))
                .with_sources(Some(vec!["fees.pdf".to_string()])),
        );
        let last = store.last_message().unwrap();
        assert_eq!(last.detected_language, Some(Language::Gu));
        assert_eq!(last.sources(), ["fees.pdf".to_string()]);
    }

    #[test]
    fn observers_see_every_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = ConversationStore::new();
        store.subscribe(Box::new(Recorder { seen: seen.clone() }));

        store.set_input("hi");
        store.append_user_message("hi");
        store.begin_exchange();
        store.append_bot_message(BotPayload::new("hello"));
        store.end_exchange();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["input:hi", "User:hi", "started", "Bot:hello", "finished"]
        );
    }

    #[test]
    fn faulty_observers_are_isolated() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = ConversationStore::new();
        store.subscribe(Box::new(Failing));
        store.subscribe(Box::new(Panicking));
        store.subscribe(Box::new(Recorder { seen: seen.clone() }));

        store.append_user_message("still works");
        store.append_user_message("and again");

        assert_eq!(store.messages().len(), 3);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["User:still works", "User:and again"]
        );
    }
}
