//! Scholar CLI - tutoring router with subject specialists

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use scholar_core::config::Config;
use scholar_core::llm::LlmClient;
use scholar_core::routing::{RoutedReply, TutorRouter};
use tracing::{info, warn};

/// How often the server sweeps expired cache entries and idle conversations
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser)]
#[command(name = "scholar")]
#[command(author, version, about = "Tutoring router with subject specialists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides server.bind_address)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer a single question in a fresh conversation
    Ask {
        /// The question
        query: String,
        /// Preferred specialist (math, physics, chemistry, history, general or auto)
        #[arg(short, long)]
        specialist: Option<String>,
    },

    /// Start an interactive tutoring session
    Chat {
        /// Preferred specialist for every turn
        #[arg(short, long)]
        specialist: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scholar=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, port } => cmd_serve(bind, port, cli.quiet).await,
        Commands::Ask { query, specialist } => {
            cmd_ask(&query, specialist.as_deref(), cli.format).await
        }
        Commands::Chat { specialist } => cmd_chat(specialist.as_deref(), cli.quiet).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

/// Load config and wire a router over the OpenRouter client
fn build_router() -> anyhow::Result<(Config, TutorRouter)> {
    let config = Config::load()?;
    let api_key = config.llm.resolved_api_key()?.ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured. Set SCHOLAR_API_KEY or OPENROUTER_API_KEY environment variable."
        )
    })?;

    let client = LlmClient::new(config.llm.clone(), api_key)?;
    let router = TutorRouter::from_config(&config, Arc::new(client));
    Ok((config, router))
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_serve(bind: Option<String>, port: Option<u16>, quiet: bool) -> anyhow::Result<()> {
    let (config, router) = build_router()?;
    let router = Arc::new(router);

    let address = format!(
        "{}:{}",
        bind.unwrap_or(config.server.bind_address),
        port.unwrap_or(config.server.port)
    );

    let sweeper = tokio::spawn(sweep_periodically(Arc::clone(&router)));

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, model = %router.invoker().model_identity(), "Scholar server listening");
    if !quiet {
        println!("Scholar listening on http://{}", address);
    }

    axum::serve(listener, scholar_core::api::router(router))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Scholar server stopped");
    Ok(())
}

async fn sweep_periodically(router: Arc<TutorRouter>) {
    let mut interval = tokio::time::interval(SWEEP_INTERVAL);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        let expired = router.invoker().cache().remove_expired();
        let evicted = router.evict_stale_conversations();
        info!(expired, evicted, "Background sweep finished");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn cmd_ask(query: &str, specialist: Option<&str>, format: OutputFormat) -> anyhow::Result<()> {
    let (_, router) = build_router()?;
    let reply = router.handle_query(query, None, specialist).await?;
    print_reply(&reply, format)
}

fn print_reply(reply: &RoutedReply, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("[{}] {}", reply.specialist, reply.response);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reply)?);
        }
    }
    Ok(())
}

async fn cmd_chat(specialist: Option<&str>, quiet: bool) -> anyhow::Result<()> {
    let (_, router) = build_router()?;
    let conversation_id = router.create_conversation(None);

    if !quiet {
        println!("Scholar tutoring session {}", conversation_id);
        println!("Ask about math, physics, chemistry or history. Type 'exit' to quit.\n");
    }

    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("you> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            break;
        }
        editor.add_history_entry(query)?;

        match router
            .handle_query(query, Some(conversation_id), specialist)
            .await
        {
            Ok(reply) => println!("{}> {}\n", reply.specialist, reply.response),
            Err(e) => eprintln!("Error: {}\n", e),
        }
    }

    if !quiet {
        let turns = router
            .conversation_history(conversation_id, None)
            .map(|h| h.len())
            .unwrap_or(0);
        println!("Session ended after {} question(s).", turns);
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_specialist() {
        let cli = Cli::try_parse_from(["scholar", "ask", "2 + 2", "--specialist", "math", "--format", "json"])
            .unwrap();
        assert!(cli.format == OutputFormat::Json);
        match cli.command {
            Commands::Ask { query, specialist } => {
                assert_eq!(query, "2 + 2");
                assert_eq!(specialist.as_deref(), Some("math"));
            }
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["scholar", "serve", "--bind", "0.0.0.0", "--port", "9000"])
            .unwrap();
        match cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind.as_deref(), Some("0.0.0.0"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve command"),
        }
    }
}
