//! Remi academic assistant backend
//!

use remi_assistant::api;
use remi_assistant::config::Settings;
use remi_assistant::infrastructure::database::DatabaseConnection;

use anyhow::{Context, anyhow};
use axum::http::{HeaderValue, Method};
use di_axum::RouterServiceProviderExtensions;
use log::{info, warn};
use tokio::runtime::{Builder, Runtime};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let provider = remi_assistant::services()
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e:?}"))?;

    let settings = provider.get_required::<Settings>();
    settings
        .database_options()
        .with_context(|| format!("invalid DATABASE_URL {:?}", settings.database_url))?;
    provider
        .get_required::<DatabaseConnection>()
        .migrate()
        .await?;

    let origins: Vec<HeaderValue> = settings
        .cors_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| warn!("ignoring invalid CORS origin {origin:?}"))
                .ok()
        })
        .collect();

    let app = api::router()
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_headers(Any)
                    .allow_methods([Method::GET, Method::POST, Method::DELETE])
                    .allow_origin(origins),
            ),
        )
        .with_provider(provider);

    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    info!("listening on {}", listener.local_addr()?);
    info!("forwarding open questions to {}", settings.assistant_url);
    axum::serve(listener, app).await?;
    info!("Shutting down...");

    Ok(())
}
