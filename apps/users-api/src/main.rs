use axum_helpers::{JwtAuth, create_production_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_users::{
    HttpMessagingClient, HttpTeamClient, OutboxRelay, PostgresOutbox, PostgresUserRepository,
    UserService,
};
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

mod api;
mod config;
mod db;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let db = db::connect_with_retry(&config.database, db::RetryConfig::default())
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    Migrator::up(&db, None)
        .await
        .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;
    info!("Database migrations applied");

    let jwt = JwtAuth::new(&config.jwt);

    let service = UserService::new(PostgresUserRepository::new(db.clone()), Arc::new(jwt.clone()))
        .with_registration(config.registration.clone());

    let relay = OutboxRelay::new(
        Arc::new(PostgresOutbox::new(db.clone())),
        Arc::new(HttpTeamClient::new(&config.clients)?),
        Arc::new(HttpMessagingClient::new(&config.clients)?),
        config.outbox.clone(),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let relay_handle = tokio::spawn(async move { relay.run(shutdown_rx).await });

    let router = create_router::<openapi::ApiDoc>(api::routes(service, jwt))?;

    // /health: liveness with app name/version
    // /ready: database ping
    let app = router
        .merge(health_router(config.app))
        .merge(api::ready_router(AppState { db: db.clone() }));

    info!(
        "Starting {} v{} (30s graceful shutdown)",
        config.app.name, config.app.version
    );

    create_production_app(app, &config.server, Duration::from_secs(30), async move {
        info!("Shutting down: stopping outbox relay");
        let _ = shutdown_tx.send(true);
        if let Err(e) = relay_handle.await {
            tracing::error!("Outbox relay task failed: {}", e);
        }

        match db.close().await {
            Ok(_) => info!("PostgreSQL connection closed successfully"),
            Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Users API shutdown complete");
    Ok(())
}
