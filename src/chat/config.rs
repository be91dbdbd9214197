//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{AnswerClient, DEFAULT_TIMEOUT};
use crate::error::Result;

/// Command-line arguments for the campus-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Answer service endpoint.
    #[arrrg(
        optional,
        "Answer service URL (default: $CAMPUS_ASSISTANT_API_URL or http://127.0.0.1:8000/api/v1/chat)",
        "URL"
    )]
    pub endpoint: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Explicit endpoint.  `None` defers to the environment, then the default.
    pub endpoint: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Endpoint: from the environment, else the local development server
    /// - Timeout: 60 seconds
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
            use_color: true,
        }
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Builds the HTTP client this configuration describes.
    pub fn build_client(&self) -> Result<AnswerClient> {
        AnswerClient::with_options(self.endpoint.clone(), Some(self.timeout))
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        // A zero timeout would fail every request; treat it as unset.
        let timeout = args
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        ChatConfig {
            endpoint: args.endpoint.filter(|e| !e.trim().is_empty()),
            timeout,
            use_color: !args.no_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert!(config.endpoint.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.use_color);
    }

    #[test]
    fn config_from_args_defaults() {
        let args = ChatArgs::default();
        let config = ChatConfig::from(args);
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            endpoint: Some("http://10.0.0.5:8000/api/v1/chat".to_string()),
            timeout_secs: Some(15),
            no_color: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(
            config.endpoint.as_deref(),
            Some("http://10.0.0.5:8000/api/v1/chat")
        );
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(!config.use_color);
    }

    #[test]
    fn zero_timeout_and_blank_endpoint_fall_back() {
        let args = ChatArgs {
            endpoint: Some("   ".to_string()),
            timeout_secs: Some(0),
            no_color: false,
        };
        let config = ChatConfig::from(args);
        assert!(config.endpoint.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_endpoint("https://assistant.example.edu/api/v1/chat")
            .with_timeout(Duration::from_secs(5))
            .without_color();

        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://assistant.example.edu/api/v1/chat")
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.use_color);

        let client = config.build_client().unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://assistant.example.edu/api/v1/chat"
        );
        assert_eq!(client.timeout(), Duration::from_secs(5));
    }
}
