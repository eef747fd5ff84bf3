//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use hardinfinity::inbound::http::health::HealthState;
use hardinfinity::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use hardinfinity::settings::AppSettings;
use ortho_config::OrthoConfig;

use server::{ServerConfig, build_identity, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load configuration")?;
    let bind_addr = settings.bind_addr()?;
    let identity = build_identity(settings.jwt_secret(), settings.allow_insecure_dev_tokens)
        .wrap_err("bearer token verification is not configured")?;

    let mut config = ServerConfig::new(bind_addr, identity)
        .with_program_length(settings.program_length());
    if let Some(database_url) = settings.database_url() {
        if settings.run_migrations {
            let applied = run_pending_migrations(database_url)
                .await
                .wrap_err("failed to apply database migrations")?;
            info!(applied, "database schema up to date");
        }
        let pool = DbPool::new(
            PoolConfig::new(database_url)
                .with_max_size(settings.pool_max_size())
                .with_connection_timeout(settings.pool_connection_timeout()),
        )
        .await
        .wrap_err("failed to build the database pool")?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting server");
    let server = create_server(health_state, config).wrap_err("failed to start the server")?;
    server.await.wrap_err("server terminated with an error")
}
