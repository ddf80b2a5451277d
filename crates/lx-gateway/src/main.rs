//! lx-gateway: Logistics Mail Extraction Gateway Main Binary
//!
//! Main entry point for the extraction gateway.
//!
//! Usage:
//!   lx-gateway           - Start server mode (HTTP API)
//!   lx-gateway --once    - Run a single extraction pass and print the report
//!   lx-gateway --help    - Show help

use std::sync::Arc;

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;

use lx_api::PipelineRunner;
use lx_core::{Config, FieldSchema, OracleClient, RecordStore};
use lx_extract::{ExtractionPipeline, RunReport, RunState};
use lx_mail::{
    CredentialProvider, EnvCredentials, ImapConfig, ImapMailbox, SearchWindow, SessionConfig,
    TokenFileCredentials,
};

/// Run mode
enum RunMode {
    /// Server mode (HTTP API)
    Server,
    /// Run one extraction pass and exit
    Once,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let mode = parse_args();

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("lx-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    tracing::info!("Starting lx-gateway...");
    tracing::info!("Oracle model: {}", config.oracle.model);

    let components = build_runner(&config)?;

    match mode {
        RunMode::Once => run_once(components).await,
        RunMode::Server => run_server(config, components).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let args: Vec<String> = std::env::args().collect();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--once" | "-1" => return RunMode::Once,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("lx-gateway - Logistics Mail Extraction Gateway");
    println!();
    println!("Usage:");
    println!("  lx-gateway           Start server mode (HTTP API)");
    println!("  lx-gateway --once    Run a single extraction pass, print the report as JSON");
    println!("  lx-gateway --help    Show this help message");
    println!("  lx-gateway --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  ORACLE_API_KEY           Extraction oracle API key (required)");
    println!("  ORACLE_MODEL             Oracle model (default: gemini-2.0-flash)");
    println!("  ORACLE_PROVIDER          Provider: gemini or openai (default: gemini)");
    println!("  ORACLE_BASE_URL          Custom oracle endpoint");
    println!("  MAILBOX_HOST             IMAP host (default: imap.gmail.com)");
    println!("  MAILBOX_USER             Mailbox account address");
    println!("  MAIL_ACCESS_TOKEN        OAuth bearer token for the mailbox");
    println!("  MAIL_TOKEN_FILE          JSON token file maintained by the OAuth flow");
    println!("  EXTRACT_FIELDS           Comma-separated default field list");
    println!("  API_KEY                  HTTP API key (optional)");
    println!("  API_PORT                 HTTP API port (default: 3000)");
    println!("  RECORDS_PATH             Persisted record file (default: data/records.json)");
}

/// Wires the pipeline to the real mailbox, oracle and store
struct GatewayRunner {
    pipeline: tokio::sync::Mutex<ExtractionPipeline<Box<dyn CredentialProvider>, OracleClient>>,
    mailbox: ImapConfig,
    store: Arc<RecordStore>,
}

#[async_trait]
impl PipelineRunner for GatewayRunner {
    async fn run_once(&self, schema: FieldSchema) -> RunReport {
        // one run at a time; a concurrent trigger waits its turn
        let mut pipeline = self.pipeline.lock().await;
        let client = ImapMailbox::new(self.mailbox.clone());
        pipeline.run_and_store(client, &schema, &self.store).await
    }
}

/// Build the shared store and pipeline runner from configuration
fn build_runner(config: &Config) -> anyhow::Result<(Arc<RecordStore>, Arc<GatewayRunner>)> {
    let oracle = OracleClient::new(&config.oracle)
        .map_err(|e| anyhow::anyhow!("Failed to create oracle client: {}", e))?;

    let schema = FieldSchema::new(config.fields.default_fields.clone())
        .map_err(|e| anyhow::anyhow!("Invalid default field list: {}", e))?;

    let store = Arc::new(RecordStore::new(config.store.data_path.clone(), schema));

    let provider: Box<dyn CredentialProvider> = match &config.mailbox.token_file {
        Some(path) => {
            tracing::info!("Reading mailbox tokens from {path}");
            Box::new(TokenFileCredentials::new(path))
        }
        None => Box::new(EnvCredentials::new()),
    };

    let session_config = SessionConfig {
        user: config.mailbox.user.clone(),
        max_candidates: config.mailbox.max_candidates,
        window: SearchWindow::hours(config.mailbox.window_hours),
    };

    let mut imap_config = ImapConfig::new(config.mailbox.host.clone(), config.mailbox.port);
    imap_config.timeout_secs = config.mailbox.timeout_secs;

    let runner = Arc::new(GatewayRunner {
        pipeline: tokio::sync::Mutex::new(ExtractionPipeline::new(
            provider,
            oracle,
            session_config,
        )),
        mailbox: imap_config,
        store: Arc::clone(&store),
    });

    Ok((store, runner))
}

/// Run a single extraction pass and print the report
async fn run_once((store, runner): (Arc<RecordStore>, Arc<GatewayRunner>)) -> anyhow::Result<()> {
    let schema = store.current_schema();
    let report = runner.run_once(schema).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.state == RunState::Done {
        Ok(())
    } else {
        Err(anyhow::anyhow!("extraction run failed"))
    }
}

/// Run server mode (HTTP API)
async fn run_server(
    config: Config,
    (store, runner): (Arc<RecordStore>, Arc<GatewayRunner>),
) -> anyhow::Result<()> {
    let api_port = config.api.port;
    let api_config = config.clone();
    let api_store = Arc::clone(&store);
    let api_runner: Arc<dyn PipelineRunner> = runner;

    let handle = tokio::spawn(async move {
        if let Err(e) = lx_api::start_server(api_port, api_config, api_store, api_runner).await {
            tracing::error!("HTTP API error: {}", e);
        }
    });
    tracing::info!("HTTP API server started on port {}", api_port);

    tracing::info!("lx-gateway initialized successfully");
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    handle.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
