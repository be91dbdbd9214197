//! Command-line tool for asking the campus assistant one-off questions.
//!
//! Each positional argument is sent as its own question through a fresh
//! session, and the assistant's reply is printed in the requested format.
//! Useful for checking that a backend is up and answering.
//!
//! # Usage
//!
//! ```bash
//! # Ask a single question
//! campus-ask "What are the B.Tech fees?"
//!
//! # Ask several questions and get JSON output
//! campus-ask --format json "Hostel facilities?" "છાત્રાલયની ફી કેટલી છે?"
//!
//! # Check a deployed backend, failing fast
//! campus-ask --endpoint https://assistant.example.edu/api/v1/chat --timeout-secs 10 "ping"
//! ```
//!
//! The exit status is 1 if any question ended with the connection error.

use std::time::{Duration, Instant};

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use serde::Serialize;

use campus_assistant::chat::{ChatConfig, ChatSession, PlainTextRenderer, Renderer};
use campus_assistant::observability::init_logging;
use campus_assistant::Message;

/// Output format for displaying answers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum OutputFormat {
    /// Plain text format (default) - human-readable output.
    #[default]
    Text,
    /// JSON format - structured output suitable for parsing.
    Json,
    /// YAML format - structured output in YAML format.
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    /// Accepts "text", "json", "yaml", or "yml" (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Invalid output format: {}. Valid options: text, json, yaml",
                s
            )),
        }
    }
}

/// Command-line arguments for the campus-ask tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
struct Args {
    /// Answer service endpoint.
    #[arrrg(optional, "Answer service URL", "URL")]
    endpoint: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    timeout_secs: Option<u64>,

    /// Output format for results (text, json, yaml).
    #[arrrg(optional, "Output format: text, json, yaml", "FORMAT")]
    format: Option<String>,

    /// Include timing information.
    #[arrrg(flag, "Include timing information")]
    verbose: bool,
}

/// One question and what came back.
#[derive(Debug, Serialize)]
struct AskResult {
    query: String,
    answered: bool,
    duration_ms: u128,
    reply: Message,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, queries) = Args::from_command_line_relaxed("campus-ask [OPTIONS] <QUESTIONS>...");
    init_logging();

    let queries: Vec<String> = queries
        .into_iter()
        .filter(|q| !q.trim().is_empty())
        .collect();
    if queries.is_empty() {
        eprintln!("Error: Must specify at least one question");
        std::process::exit(1);
    }

    let output_format = if let Some(format_str) = args.format {
        format_str
            .parse()
            .map_err(|e| format!("Invalid format: {}", e))?
    } else {
        OutputFormat::Text
    };
    let mut config = ChatConfig::new().without_color();
    if let Some(endpoint) = args.endpoint {
        config = config.with_endpoint(endpoint);
    }
    if let Some(secs) = args.timeout_secs.filter(|secs| *secs > 0) {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let mut failed = 0usize;
    for (i, query) in queries.iter().enumerate() {
        let mut session = ChatSession::new(config.clone())?;
        let start = Instant::now();
        let outcome = session.send(query).await;
        let duration = start.elapsed();
        if outcome.is_failed() {
            failed += 1;
        }
        let Some(reply) = session.store().last_message().cloned() else {
            continue;
        };
        let result = AskResult {
            query: query.clone(),
            answered: outcome.is_answered(),
            duration_ms: duration.as_millis(),
            reply,
        };

        match output_format {
            OutputFormat::Text => {
                if queries.len() > 1 {
                    println!("=== {} ===", result.query);
                }
                if args.verbose {
                    println!("Endpoint: {}", session.service().endpoint());
                    println!("Duration: {:?}", duration);
                    println!("---");
                }
                let mut renderer = PlainTextRenderer::with_color(false);
                renderer.render_message(&result.reply)?;
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&result)?;
                println!("{}", json);
                if i < queries.len() - 1 {
                    println!();
                }
            }
            OutputFormat::Yaml => {
                let yaml = serde_yaml::to_string(&result)?;
                print!("{}", yaml);
                if i < queries.len() - 1 {
                    println!("---");
                }
            }
        }
    }

    if failed > 0 {
        eprintln!(
            "{}/{} questions could not be answered",
            failed,
            queries.len()
        );
        std::process::exit(1);
    }

    Ok(())
}
