//! PDFConvert Pro API server
//!
//! Long-running HTTP front end over `pdfconvert-core`. Serves:
//!
//! - PDF to Word/JPG/PowerPoint placeholder conversion
//! - Merge and split
//! - Document info
//!
//! Every route is also reachable under `/api`.

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use pdfconvert_core::UploadPolicy;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;

/// Command-line arguments for the PDFConvert server
#[derive(Parser, Debug)]
#[command(name = "pdfconvert-server")]
#[command(about = "PDFConvert Pro API server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PDFCONVERT_PORT", default_value = "5000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "PDFCONVERT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Largest accepted upload in MiB
    #[arg(long, env = "PDFCONVERT_MAX_UPLOAD_MB", default_value = "50")]
    max_upload_mb: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub policy: UploadPolicy,
}

impl AppState {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::handle_index))
        .route("/health", get(api::handle_health))
        .route("/convert/word", post(api::handle_convert_word))
        .route("/convert/jpg", post(api::handle_convert_jpg))
        .route("/convert/ppt", post(api::handle_convert_ppt))
        .route("/merge", post(api::handle_merge))
        .route("/split", post(api::handle_split))
        .route("/info", post(api::handle_info))
}

/// Full application router: every route at the root and under `/api`.
pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.policy.max_body_bytes()).unwrap_or(usize::MAX);

    // Also answers every OPTIONS request as a preflight
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes())
        .nest("/api", routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::new(UploadPolicy::with_max_upload_mb(args.max_upload_mb));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("PDFConvert Pro API listening on http://{}", addr);
    info!("Upload limit: {} MB", args.max_upload_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
