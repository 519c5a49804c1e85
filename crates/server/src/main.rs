//! JQL REST API Server
//!
//! Serves parse reports, suggestions and completions over HTTP. Metadata,
//! lookup and autocomplete settings come from the same `jql.toml` and
//! metadata document the `jql` CLI reads.

use std::path::PathBuf;

use anyhow::Result;
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "jql-server")]
#[command(about = "REST API for JQL parsing and autocomplete", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a jql.toml config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the metadata JSON document
    #[arg(long, env = "JQL_METADATA")]
    metadata: Option<PathBuf>,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0", env = "JQL_SERVER_BIND")]
    bind: String,

    /// Port to listen on
    #[arg(long, short, default_value_t = 3000, env = "JQL_SERVER_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Starting JQL API Server...");

    let session = jql_server::load_session(args.config.as_deref(), args.metadata.as_deref())?;
    info!(
        fields = session.metadata().fields.len(),
        functions = session.metadata().functions.len(),
        "Loaded JQL metadata"
    );

    // Build CORS layer for browser editors
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", jql_server::create_routes(session))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
