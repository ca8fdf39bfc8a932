use std::sync::Arc;

use anyhow::Context;

use medstock_api::app::{AppServices, build_app};
use medstock_auth::Hs256Jwt;
use medstock_infra::{AppConfig, InMemoryStore, PostgresStore, Store};
use medstock_observability::LogSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    medstock_observability::init(&LogSettings {
        level: config.log.level.clone(),
        json: config.log.json,
    });

    if config.uses_dev_secret() {
        tracing::warn!("MEDSTOCK__AUTH__JWT_SECRET not set; using insecure dev default");
    }

    let store: Arc<dyn Store> = match &config.database.url {
        Some(url) => {
            let pg = PostgresStore::connect(url, config.database.max_connections)
                .await
                .context("failed to connect to postgres")?;
            if config.database.run_migrations {
                pg.migrate().await.context("failed to run migrations")?;
            }
            tracing::info!("using postgres store");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("no database url configured; stock is kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    let jwt = Arc::new(Hs256Jwt::new(
        &config.auth.jwt_secret,
        chrono::Duration::minutes(config.auth.token_ttl_minutes),
    ));
    let services = Arc::new(AppServices::new(store, jwt, config.stock));

    if let Some(password) = &config.auth.bootstrap_admin_password {
        services
            .operators
            .ensure_bootstrap_admin(&config.auth.bootstrap_admin_login, password)
            .await
            .context("failed to create bootstrap admin")?;
    }

    let app = build_app(services);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
