//! Bundle server: resolves resource directories from the environment (`.env` honored) and serves
//! the export/import routes plus health endpoints.
//!
//! Run from repo root: `cargo run -p caac-server`

use caac_bundle::{bundle_routes, common_routes_with_ready, AppState, ResourcesConfig};
use axum::Router;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("caac_bundle=info,caac_server=info")),
        )
        .init();

    let resources = ResourcesConfig::from_env()?;
    resources.log_resource_paths();
    let state = AppState::new(resources);

    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(bundle_routes(state));

    let bind_addr = std::env::var("CAAC_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
