//! # EventHub API Server
//!
//! Serves the event catalog, signups, registration and token endpoints.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/eventhub \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p eventhub-api
//! ```

use eventhub_api::{
    app::{build_router, AppState},
    config::Config,
};
use eventhub_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    directory::Provisioned,
    repository::PgRepository,
    telemetry::{init_tracing, LogFormat},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("eventhub_api=debug,tower_http=debug", LogFormat::from_env());

    tracing::info!(
        "EventHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(
        &DatabaseConfig::new(&config.database.url)
            .with_max_connections(config.database.max_connections),
    )
    .await?;
    run_migrations(&pool).await?;

    let repo = Arc::new(PgRepository::new(pool.clone()));
    let admin = config.admin.clone();
    let addr = config.bind_address();
    let state = AppState::new(repo, config);

    if let Some(admin) = admin {
        match state
            .directory
            .provision_admin(&admin.username, &admin.email, &admin.password)
            .await?
        {
            Provisioned::Created(user) => {
                tracing::info!(user_id = %user.id, "Admin account created")
            }
            Provisioned::Existing(user) => {
                tracing::info!(user_id = %user.id, "Admin account already present")
            }
        }
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool");
    close_pool(pool).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}
