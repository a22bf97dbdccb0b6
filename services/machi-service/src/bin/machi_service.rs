use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use machi_api::{app_router, setup_tracing, ApiServerEnv, GlobalState};
use machi_common::{get_current_timestamp, EnvVars};
use machi_core::init_schema;
use machi_database::{Database, DatabaseEnv};

fn cors_layer(frontend_url: Option<&str>) -> Result<CorsLayer> {
    match frontend_url {
        Some(origin) => {
            let origin: HeaderValue = origin.parse().context("FRONTEND_URL is not a valid origin")?;
            Ok(CorsLayer::very_permissive().allow_origin(origin))
        }
        None => Ok(CorsLayer::very_permissive()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    setup_tracing();

    let env = ApiServerEnv::load();
    let db = Database::connect(&DatabaseEnv::load())
        .await
        .context("failed to open the database")?;
    init_schema(&db, get_current_timestamp())
        .await
        .context("failed to initialise the schema")?;
    if let Some(err) = db.init_error() {
        tracing::warn!("database started in fallback mode: {}", err);
    }

    let port = env.port;
    let cors = cors_layer(env.frontend_url.as_deref())?;
    let timeout = TimeoutLayer::new(Duration::from_secs(env.request_timeout_secs));

    let app = app_router(GlobalState::new(db, env))
        .layer(timeout)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(format!(":::{port}"))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    tracing::info!("🏄‍♂️ Machi Mouchkil API listening on {port}");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
