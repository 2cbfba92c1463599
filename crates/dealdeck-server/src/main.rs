mod api;
mod middleware;

use std::sync::Arc;

use dealdeck_catalog::ConfiguredSource;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = dealdeck_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let source = ConfiguredSource::from_config(&config).await?;
    if let ConfiguredSource::Postgres(pg) = &source {
        dealdeck_db::run_migrations(pg.pool()).await?;
    }

    let presentations = if config.presentations_path.exists() {
        dealdeck_core::load_presentations(&config.presentations_path)?
    } else {
        tracing::warn!(
            path = %config.presentations_path.display(),
            "presentations file not found; using default detail views"
        );
        Vec::new()
    };

    let state = AppState::new(
        Arc::new(source),
        dealdeck_core::default_exclusion_rules(),
        presentations,
    );

    // A cold snapshot is not fatal: the first request reads the store instead.
    if let Err(e) = state.snapshot.prepare(state.source.as_ref()).await {
        tracing::warn!(error = %e, "failed to warm preload snapshot");
    }

    let auth = AuthState::new(
        &config.revalidate_tokens,
        matches!(config.env, dealdeck_core::Environment::Development),
    )?;
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(bind_addr = %config.bind_addr, env = %config.env, "dealdeck-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
