use anyhow::Context;
use api::auth::Passwords;
use api::bootstrap::ensure_admin;
use api::db::SqlStore;
use api::settings::Settings;
use axum::http::StatusCode;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use web::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::new().context("failed to load settings")?;
    tracing::debug!(?settings, "settings loaded");

    let store = SqlStore::connect(&settings.database)
        .await
        .context("failed to open database")?;
    let passwords = Passwords::new(settings.auth.pepper.as_deref());
    ensure_admin(&store, &passwords, &settings.bootstrap)
        .await
        .context("failed to create bootstrap administrator")?;

    let state = AppState::from_settings(store, passwords, &settings)?;
    let app = web::app(state)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            settings.server.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.server.address)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.address))?;
    tracing::info!("Server listening on {}", settings.server.address);

    axum::serve(listener, app).await?;
    Ok(())
}
