//! ragdeck - terminal client for a RAG query service.
//!
//! Runs an interactive TUI (default) with a streaming chat, a knowledge graph
//! view and a document list, plus one-shot commands for scripting and a local
//! browser view of the graph.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use ragdeck_core::api::{QueryMode, RagApi, UploadKind};
use ragdeck_core::{Config, HttpClient};

mod commands;
mod serve;
mod tui;

#[derive(Parser)]
#[command(name = "ragdeck")]
#[command(version, about = "Terminal client for a RAG query service", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive TUI (default)
    Tui,

    /// Check whether the backend is up
    Health,

    /// Ask a question
    Query {
        /// Question text
        #[arg(required = true)]
        text: Vec<String>,

        /// Retrieval mode (local, global, hybrid)
        #[arg(short, long)]
        mode: Option<QueryMode>,

        /// Wait for the whole answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },

    /// Fetch the knowledge graph and print a summary
    Graph {
        /// Strip node and edge labels
        #[arg(long)]
        no_labels: bool,

        /// Hide nodes without edges
        #[arg(long)]
        hide_isolated: bool,

        /// Print the rendered node/edge sets as JSON
        #[arg(long)]
        json: bool,
    },

    /// Document management
    Docs {
        #[command(subcommand)]
        action: DocsCommands,
    },

    /// Upload .txt/.csv files for ingestion
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Use the incremental ingest endpoint
        #[arg(short, long)]
        incremental: bool,
    },

    /// Serve the knowledge graph in the browser
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = serve::DEFAULT_PORT)]
        port: u16,

        /// Don't open the browser
        #[arg(long)]
        no_open: bool,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum DocsCommands {
    /// List ingested documents
    List,

    /// Delete a document by its doc_id
    Delete { doc_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Restore the terminal if anything panics inside the TUI
    install_panic_hook();

    let cli = Cli::parse();
    color_eyre::install()?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    let command = cli.command.unwrap_or(Commands::Tui);
    if matches!(command, Commands::Tui) {
        setup_tui_logging()?;
    } else {
        setup_logging(cli.debug)?;
    }

    let api: Arc<dyn RagApi> = Arc::new(HttpClient::from_config(&config.api)?);

    match command {
        Commands::Tui => tui::run(config, api).await?,
        Commands::Health => commands::health(api.as_ref()).await?,
        Commands::Query {
            text,
            mode,
            no_stream,
        } => {
            let mode = mode.unwrap_or(config.query.mode);
            let stream = config.query.stream && !no_stream;
            commands::query(api, &text.join(" "), mode, stream).await?;
        }
        Commands::Graph {
            no_labels,
            hide_isolated,
            json,
        } => {
            let mut options = config.graph.adapter_options();
            options.show_labels &= !no_labels;
            options.hide_isolated |= hide_isolated;
            commands::graph(api.as_ref(), options, json).await?;
        }
        Commands::Docs { action } => match action {
            DocsCommands::List => commands::docs_list(api.as_ref()).await?,
            DocsCommands::Delete { doc_id } => {
                commands::docs_delete(api.as_ref(), &doc_id).await?
            }
        },
        Commands::Upload { files, incremental } => {
            let kind = if incremental {
                UploadKind::Incremental
            } else {
                UploadKind::Initial
            };
            commands::upload(api.as_ref(), &config.upload, &files, kind).await?;
        }
        Commands::Serve { port, no_open } => {
            let serve_config = serve::ServeConfig {
                port,
                open_browser: !no_open,
                backend_url: config.api.base_url.clone(),
            };
            serve::start_server(serve_config, api, config.graph.clone()).await?;
        }
        Commands::Config => commands::show_config(&config, cli.config.as_deref())?,
    }

    Ok(())
}

/// Logging for one-shot commands goes to stderr.
fn setup_logging(debug: bool) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("ragdeck_cli=debug,ragdeck_core=debug")
        } else {
            EnvFilter::new("ragdeck_cli=info,ragdeck_core=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}

/// The TUI owns the terminal, so logs go to a file.
fn setup_tui_logging() -> Result<()> {
    use std::fs::OpenOptions;
    use tracing_subscriber::EnvFilter;

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ragdeck")
        .join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("ragdeck.log"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ragdeck_cli=warn,ragdeck_core=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_target(false)
        .with_ansi(false)
        .init();

    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::execute!(
            std::io::stderr(),
            crossterm::event::DisableMouseCapture,
            crossterm::terminal::LeaveAlternateScreen
        );
        let _ = crossterm::terminal::disable_raw_mode();
        original_hook(panic_info);
    }));
}
