//! Demo server: serves the resource API from the database named by `DATABASE_URL`.
//!
//! Run with `cargo run --example server`.

use cdn_resources::{api_router, config::DEFAULT_LOG_FILTER, AppState, Settings, API_PREFIX};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let settings = Settings::from_env()?;
    let pool = settings.connect().await?;
    let state = AppState {
        pool,
        use_tenancy: settings.use_tenancy,
    };

    let app = axum::Router::new().nest(API_PREFIX, api_router(state));
    let listener = TcpListener::bind(settings.listen_addr).await?;
    tracing::info!(
        "cdn-resources listening on http://{}{}",
        listener.local_addr()?,
        API_PREFIX
    );
    axum::serve(listener, app).await?;
    Ok(())
}
