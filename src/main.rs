//! connectpro-gateway server entry point.
//!
//! Starts the Axum HTTP server with the waitlist and sign-in endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use connectpro_gateway::api;
use connectpro_gateway::app_state::AppState;
use connectpro_gateway::config::{GatewayConfig, LogFormat};
use connectpro_gateway::identity::{GoTrueClient, IdentityApi};
use connectpro_gateway::persistence::{
    InMemoryWaitlistStore, PostgresWaitlistStore, WaitlistStore,
};
use connectpro_gateway::service::{AuthService, WaitlistService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, site = %config.site_url, "starting connectpro-gateway");

    // Build persistence layer
    let (store, store_backend): (Arc<dyn WaitlistStore>, &'static str) =
        if config.persistence_enabled {
            let store = PostgresWaitlistStore::connect(&config.database)
                .await
                .context("connecting to PostgreSQL")?;
            store.migrate().await.context("running migrations")?;
            tracing::info!("waitlist store ready (postgres)");
            (Arc::new(store) as Arc<dyn WaitlistStore>, "postgres")
        } else {
            tracing::warn!("persistence disabled; waitlist entries are kept in memory only");
            (
                Arc::new(InMemoryWaitlistStore::new()) as Arc<dyn WaitlistStore>,
                "memory",
            )
        };

    // Build identity client
    let identity: Arc<dyn IdentityApi> =
        Arc::new(GoTrueClient::new(&config.identity).context("building identity client")?);

    // Build service layer
    let waitlist_service = Arc::new(WaitlistService::new(store));
    let auth_service = Arc::new(AuthService::new(
        identity,
        config.callback_url.clone(),
        config.session_callback_timeout,
        config.session_event_capacity,
    ));

    // Build application state
    let app_state = AppState {
        waitlist_service,
        auth_service,
        store_backend,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::doc::ApiDoc::openapi()),
        )
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
