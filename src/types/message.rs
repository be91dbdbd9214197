use serde::{Deserialize, Serialize};

use crate::types::Language;

/// Who authored an entry in the conversation log.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the client.
    User,

    /// The answer service, or the client speaking on its behalf.
    Bot,
}

/// One entry in the conversation log.
///
/// User messages carry plain text; bot messages carry markdown that must go
/// through [`crate::markdown`] before display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// The displayed content.
    pub text: String,

    /// Who authored the message.
    pub sender: Sender,

    /// Language detected by the answer service (bot messages only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<Language>,

    /// Citation identifiers (bot messages only, never empty when present).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl Message {
    /// Create a new user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
            detected_language: None,
            sources: None,
        }
    }

    /// Create a new bot message from a payload.
    pub fn bot(payload: BotPayload) -> Self {
        Self {
            text: payload.text,
            sender: Sender::Bot,
            detected_language: payload.detected_language,
            sources: payload.sources.filter(|sources| !sources.is_empty()),
        }
    }

    /// Returns true if the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Returns true if the bot wrote this message.
    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }

    /// The citations attached to this message, empty when there are none.
    pub fn sources(&self) -> &[String] {
        self.sources.as_deref().unwrap_or(&[])
    }
}

/// The content of a bot reply before it enters the log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotPayload {
    /// Answer text, markdown formatted.
    pub text: String,

    /// Language detected by the answer service.
    pub detected_language: Option<Language>,

    /// Citation identifiers.
    pub sources: Option<Vec<String>>,
}

impl BotPayload {
    /// Create a payload with text only.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detected_language: None,
            sources: None,
        }
    }

    /// Set the detected language.
    pub fn with_detected_language(mut self, language: Option<Language>) -> Self {
        self.detected_language = language;
        self
    }

    /// Set the citation list.
    pub fn with_sources(mut self, sources: Option<Vec<String>>) -> Self {
        self.sources = sources;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn user_message_has_no_metadata() {
        let message = Message::user("What are the admission fees?");
        assert!(message.is_user());
        assert!(message.detected_language.is_none());
        assert!(message.sources.is_none());
        assert!(message.sources().is_empty());
    }

    #[test]
    fn bot_message_drops_empty_sources() {
        let payload = BotPayload::new("Hi").with_sources(Some(Vec::new()));
        let message = Message::bot(payload);
        assert!(message.is_bot());
        assert!(message.sources.is_none());
    }

    #[test]
    fn bot_message_serialization() {
        let payload = BotPayload::new("Hi")
            .with_detected_language(Some(Language::Hi))
            .with_sources(Some(vec!["doc1".to_string()]));
        let json = to_value(Message::bot(payload)).unwrap();
        assert_eq!(
            json,
            json!({
                "text": "Hi",
                "sender": "bot",
                "detected_language": "hi",
                "sources": ["doc1"]
            })
        );
    }

    #[test]
    fn user_message_serialization_omits_absent_fields() {
        let json = to_value(Message::user("hello")).unwrap();
        assert_eq!(json, json!({"text": "hello", "sender": "user"}));
    }
}
