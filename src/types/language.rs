use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language of a query, as detected by the answer service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    En,

    /// Hindi.
    Hi,

    /// Gujarati.
    Gu,
}

impl Language {
    /// The wire code for this language.
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Gu => "gu",
        }
    }

    /// The label shown on the language badge of a bot message.
    pub fn label(&self) -> &'static str {
        match self {
            Language::En => "ENGLISH",
            Language::Hi => "HINDI",
            Language::Gu => "GUJARATI",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            "gu" => Ok(Language::Gu),
            other => Err(format!("unknown language code: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_as_wire_code() {
        assert_eq!(serde_json::to_value(Language::Gu).unwrap(), json!("gu"));
        let lang: Language = serde_json::from_value(json!("hi")).unwrap();
        assert_eq!(lang, Language::Hi);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("EN".parse::<Language>(), Ok(Language::En));
        assert_eq!(" gu ".parse::<Language>(), Ok(Language::Gu));
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn badge_labels() {
        assert_eq!(Language::En.label(), "ENGLISH");
        assert_eq!(Language::Hi.label(), "HINDI");
        assert_eq!(Language::Gu.label(), "GUJARATI");
    }
}
