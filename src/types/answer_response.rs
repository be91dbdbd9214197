use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::{BotPayload, Language};

/// Body returned by the answer service.
///
/// Every field is read leniently: a field with the wrong shape is treated as
/// absent instead of failing the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnswerResponse {
    /// The answer text, markdown formatted.
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub response: Option<String>,

    /// Citation identifiers for the answer.
    #[serde(
        default,
        deserialize_with = "lenient_sources",
        skip_serializing_if = "Option::is_none"
    )]
    pub sources: Option<Vec<String>>,

    /// Language of the query as detected by the service.
    #[serde(
        default,
        deserialize_with = "lenient_language",
        skip_serializing_if = "Option::is_none"
    )]
    pub detected_language: Option<Language>,
}

impl AnswerResponse {
    /// Create a new `AnswerResponse` carrying only answer text.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            sources: None,
            detected_language: None,
        }
    }

    /// Set the citation list.
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Set the detected language.
    pub fn with_detected_language(mut self, language: Language) -> Self {
        self.detected_language = Some(language);
        self
    }

    /// Convert into the payload appended to the conversation log.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the answer text is missing.  A present
    /// but empty answer is passed through unchanged.
    pub fn into_payload(self) -> Result<BotPayload> {
        let Some(text) = self.response else {
            return Err(Error::validation(
                "answer service returned no answer text",
                Some("response".to_string()),
            ));
        };
        Ok(BotPayload::new(text)
            .with_detected_language(self.detected_language)
            .with_sources(self.sources))
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

fn lenient_sources<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let sources: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(source) => Some(source),
            _ => None,
        })
        .collect();
    if sources.is_empty() {
        Ok(None)
    } else {
        Ok(Some(sources))
    }
}

fn lenient_language<'de, D>(deserializer: D) -> std::result::Result<Option<Language>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(code) => Ok(code.parse().ok()),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_value, json};

    #[test]
    fn full_response() {
        let response: AnswerResponse = from_value(json!({
            "response": "Hi",
            "sources": ["doc1"],
            "detected_language": "hi"
        }))
        .unwrap();
        assert_eq!(response.response.as_deref(), Some("Hi"));
        assert_eq!(response.sources, Some(vec!["doc1".to_string()]));
        assert_eq!(response.detected_language, Some(Language::Hi));

        let payload = response.into_payload().unwrap();
        assert_eq!(payload.text, "Hi");
        assert_eq!(payload.sources, Some(vec!["doc1".to_string()]));
        assert_eq!(payload.detected_language, Some(Language::Hi));
    }

    #[test]
    fn optional_fields_absent() {
        let response: AnswerResponse = from_value(json!({"response": "Hello"})).unwrap();
        assert!(response.sources.is_none());
        assert!(response.detected_language.is_none());
    }

    #[test]
    fn malformed_optional_fields_are_absent() {
        let response: AnswerResponse = from_value(json!({
            "response": "Hello",
            "sources": "doc1",
            "detected_language": "fr"
        }))
        .unwrap();
        assert_eq!(response.response.as_deref(), Some("Hello"));
        assert!(response.sources.is_none());
        assert!(response.detected_language.is_none());

        let response: AnswerResponse = from_value(json!({
            "response": "Hello",
            "sources": [1, "doc2", null],
            "detected_language": 7
        }))
        .unwrap();
        assert_eq!(response.sources, Some(vec!["doc2".to_string()]));
        assert!(response.detected_language.is_none());
    }

    #[test]
    fn empty_sources_are_absent() {
        let response: AnswerResponse =
            from_value(json!({"response": "Hello", "sources": []})).unwrap();
        assert!(response.sources.is_none());
    }

    #[test]
    fn missing_answer_is_rejected() {
        let response: AnswerResponse = from_value(json!({"sources": ["doc1"]})).unwrap();
        let err = response.into_payload().unwrap_err();
        assert!(err.is_malformed_response());

        let response: AnswerResponse = from_value(json!({"response": null})).unwrap();
        assert!(response.into_payload().is_err());
    }

    #[test]
    fn empty_answer_passes_through() {
        let response: AnswerResponse = from_value(json!({"response": ""})).unwrap();
        assert_eq!(response.into_payload().unwrap().text, "");
    }

    #[test]
    fn serialization_omits_absent_fields() {
        let response = AnswerResponse::new("Hi").with_detected_language(Language::En);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"response": "Hi", "detected_language": "en"})
        );
    }
}
