use clap::Parser;
use n8n_mcp::{all_resources, all_tools, serve_stdio, HealthChecker, McpServer, N8nClients, N8nConfig};
use std::error::Error;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "n8n-mcp-server",
    version,
    about = "MCP server for the n8n workflow automation API"
)]
struct Args {
    /// Load environment variables from this file instead of `.env`.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Start without checking that the n8n API is reachable.
    #[arg(long)]
    skip_connectivity_check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // A missing .env file is fine; variables may come from the host.
    let env_loaded = match &args.env_file {
        Some(path) => dotenvy::from_filename(path).map(|_| path.display().to_string()),
        None => dotenvy::dotenv().map(|path| path.display().to_string()),
    };

    let config = N8nConfig::from_env();
    init_tracing(config.as_ref().map(|c| c.debug).unwrap_or(false));

    match &env_loaded {
        Ok(path) => debug!(path = %path, "Loaded environment file"),
        Err(e) if args.env_file.is_some() => warn!("Failed to load environment file: {}", e),
        Err(_) => {}
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(api_url = %config.api_url, "Starting n8n MCP server");
    let clients = N8nClients::from_config(config)?;

    if !args.skip_connectivity_check {
        let report = HealthChecker::new(clients.api.clone()).check().await;
        if !report.is_up() {
            warn!(
                "n8n API not reachable at {}; tools will report errors until it is",
                report.url
            );
        }
    }

    let server = McpServer::n8n();
    server.register_tools(all_tools(&clients)).await;
    server.register_resources(all_resources(&clients)).await;
    info!(
        tools = server.list_tools().await.len(),
        resources = server.list_resources().await.len(),
        categories = ?server.list_categories().await,
        "Serving MCP over stdio"
    );

    serve_stdio(&server).await?;
    Ok(())
}

/// Log to stderr; stdout carries the protocol.
fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
