//! Terminal rendering for the conversation.
//!
//! This module provides a trait-based rendering abstraction and a plain-text
//! implementation with optional ANSI styling.  Bot text always passes through
//! [`crate::markdown`] before it reaches the terminal.

use std::io::{self, Stdout, Write};

use crate::markdown;
use crate::store::{StoreChange, StoreObserver};
use crate::types::{Message, Sender};

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for badges, sources, and waiting).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the bot label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for the user label and errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI sequence that returns to column zero and clears the line.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Label shown under answers that cite sources.
const SOURCES_LABEL: &str = "KPGU Knowledge Base";

/// Trait for rendering the conversation.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Render one message from the log.
    fn render_message(&mut self, message: &Message) -> io::Result<()>;

    /// Show that an answer is on its way.
    fn start_waiting(&mut self) -> io::Result<()>;

    /// Remove the waiting indicator, if it is still showing.
    fn finish_waiting(&mut self) -> io::Result<()>;

    /// Print an error message from the client itself.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    echo_user_messages: bool,
    waiting: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer that writes to `out`.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            echo_user_messages: true,
            waiting: false,
        }
    }

    /// Controls whether user messages are printed.
    ///
    /// A line editor already shows what the user typed, so the REPL turns
    /// echoing off for live rendering.
    pub fn with_echo_user_messages(mut self, echo: bool) -> Self {
        self.echo_user_messages = echo;
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn clear_waiting(&mut self) -> io::Result<()> {
        if self.waiting {
            self.waiting = false;
            if self.use_color {
                write!(self.out, "{ANSI_CLEAR_LINE}")?;
            }
        }
        Ok(())
    }

    fn write_footer(&mut self, message: &Message) -> io::Result<()> {
        let mut footer = Vec::new();
        if let Some(language) = message.detected_language {
            footer.push(format!("[{}]", language.label()));
        }
        if !message.sources().is_empty() {
            footer.push(format!("Sources: {SOURCES_LABEL}"));
        }
        if footer.is_empty() {
            return Ok(());
        }
        let line = self.styled(ANSI_DIM, &footer.join("  "));
        writeln!(self.out, "{line}")?;
        for source in message.sources() {
            let source = self.styled(
                ANSI_DIM,
                &format!("  - {}", markdown::strip_control_chars(source)),
            );
            writeln!(self.out, "{source}")?;
        }
        Ok(())
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn render_message(&mut self, message: &Message) -> io::Result<()> {
        self.clear_waiting()?;
        match message.sender {
            Sender::User => {
                if !self.echo_user_messages {
                    return Ok(());
                }
                let label = self.styled(&format!("{ANSI_BOLD}{ANSI_RED}"), "You:");
                let text = markdown::strip_control_chars(&message.text);
                writeln!(self.out, "{label} {text}")?;
            }
            Sender::Bot => {
                let label = self.styled(&format!("{ANSI_BOLD}{ANSI_CYAN}"), "Assistant:");
                writeln!(self.out, "{label}")?;
                let body = markdown::to_plain_text(&message.text);
                if !body.is_empty() {
                    writeln!(self.out, "{body}")?;
                }
                self.write_footer(message)?;
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    fn start_waiting(&mut self) -> io::Result<()> {
        self.waiting = true;
        if self.use_color {
            let indicator = self.styled(ANSI_DIM, "thinking...");
            write!(self.out, "{indicator}")?;
        } else {
            writeln!(self.out, "(waiting for answer)")?;
        }
        self.out.flush()
    }

    fn finish_waiting(&mut self) -> io::Result<()> {
        self.clear_waiting()?;
        self.out.flush()
    }

    fn print_error(&mut self, error: &str) {
        let _ = self.clear_waiting();
        let line = self.styled(ANSI_RED, &format!("Error: {error}"));
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }

    fn print_info(&mut self, info: &str) {
        let _ = writeln!(self.out, "{info}");
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> StoreObserver for PlainTextRenderer<W> {
    fn on_change(&mut self, change: StoreChange<'_>) -> Result<(), String> {
        let rendered = match change {
            StoreChange::MessageAppended(message) => self.render_message(message),
            StoreChange::ExchangeStarted => self.start_waiting(),
            StoreChange::ExchangeFinished => self.finish_waiting(),
            StoreChange::InputChanged(_) => Ok(()),
        };
        rendered.map_err(|err| format!("terminal write failed: {err}"))
    }
}
