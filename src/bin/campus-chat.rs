//! Interactive chat application for the campus assistant.
//!
//! This binary provides a REPL for asking the campus question-answering
//! service about admissions, courses, fees, and campus life.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! campus-chat
//!
//! # Point at a deployed backend
//! campus-chat --endpoint https://assistant.example.edu/api/v1/chat
//!
//! # Disable colors (useful for piping output)
//! campus-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/history` - Show the whole conversation again
//! - `/stats` - Show session statistics
//! - `/config` - Show the endpoint and timeout
//! - `/quit` - Exit the application
//!
//! Pressing Ctrl+C while waiting for an answer stops waiting; the
//! conversation records the exchange as failed and the prompt returns.

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use campus_assistant::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use campus_assistant::observability::init_logging;

/// Main entry point for the campus-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("campus-chat [OPTIONS]");
    init_logging();
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let mut session = ChatSession::new(config)?;
    // Live rendering follows the store; the editor already echoes user input.
    session.subscribe(Box::new(
        PlainTextRenderer::with_color(use_color).with_echo_user_messages(false),
    ));
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    println!("KPGU Campus Assistant");
    println!("Type /help for commands, /quit to exit\n");
    if let Some(welcome) = session.store().last_message() {
        renderer.render_message(welcome)?;
    }

    loop {
        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::History => {
                            for message in session.store().messages() {
                                renderer.render_message(message)?;
                            }
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::ShowConfig => {
                            print_config(session.config());
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular question - send to the answer service
                session.set_input(line);
                tokio::select! {
                    outcome = session.send(line) => {
                        tracing::debug!(?outcome, "submission finished");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        renderer.print_info("Stopped waiting for an answer.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!(
        "      Messages: {} ({} from you, {} from the assistant)",
        stats.message_count, stats.user_messages, stats.bot_messages
    );
    println!(
        "      Exchanges: {} answered, {} failed",
        stats.answered, stats.failed
    );
    println!("      Ignored submissions: {}", stats.ignored);
    print_config(session.config());
}

fn print_config(config: &ChatConfig) {
    println!("    Current Configuration:");
    match config.endpoint.as_deref() {
        Some(endpoint) => println!("      Endpoint: {}", endpoint),
        None => println!("      Endpoint: (default)"),
    }
    println!("      Timeout: {}s", config.timeout.as_secs());
    println!(
        "      Color: {}",
        if config.use_color {
            "enabled"
        } else {
            "disabled"
        }
    );
}
