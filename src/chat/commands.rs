//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending a question
//! to the answer service.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the service.
/// The conversation log is append-only, so there is no command to clear it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Redraw the whole conversation.
    History,

    /// Display session statistics (message counts, endpoint, timeout).
    Stats,

    /// Show the current configuration.
    ShowConfig,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a question.
///
/// # Examples
///
/// ```
/// # use campus_assistant::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("What are the B.Tech fees?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "help" | "?" => no_argument(argument, "/help", ChatCommand::Help),
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "history" => no_argument(argument, "/history", ChatCommand::History),
        "stats" | "status" => no_argument(argument, "/stats", ChatCommand::Stats),
        "config" => no_argument(argument, "/config", ChatCommand::ShowConfig),
        "clear" => ChatCommand::Invalid("The conversation cannot be cleared".to_string()),
        "" => ChatCommand::Invalid("Empty command; try /help".to_string()),
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn no_argument(argument: Option<&str>, name: &str, command: ChatCommand) -> ChatCommand {
    match argument {
        Some(_) => ChatCommand::Invalid(format!("{} takes no arguments", name)),
        None => command,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Ask anything about admissions, courses, fees, or campus life.
Questions may be written in English, Hindi, or Gujarati.

Available commands:
  /history               Show the whole conversation again
  /stats                 Show session statistics
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/QUIT"), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_session_commands() {
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/config"), Some(ChatCommand::ShowConfig));
    }

    #[test]
    fn parse_rejects_arguments() {
        assert!(matches!(
            parse_command("/stats now"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("takes no arguments")
        ));
    }

    #[test]
    fn parse_clear_is_refused() {
        assert!(matches!(
            parse_command("/clear"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("cannot be cleared")
        ));
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            parse_command("/model gpt"),
            Some(ChatCommand::Invalid("Unknown command: /model".to_string()))
        );
        assert!(matches!(parse_command("/"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("What are the hostel fees?"), None);
        assert_eq!(parse_command("fees / scholarships"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/history"));
        assert!(help.contains("/stats"));
        assert!(!help.contains("/clear"));
    }
}
