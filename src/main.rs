//! MovieShelf API server
//! Mission: Serve account signup, login and role-gated user management

use anyhow::{Context, Result};
use movieshelf_backend::{
    auth::{AuthService, JwtHandler, SqliteUserStore},
    build_router, AppConfig,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Fail fast: no listener is bound with an incomplete configuration.
    let config = AppConfig::from_env().context("Invalid configuration")?;

    init_tracing();
    info!("🎬 MovieShelf backend starting");

    let store = SqliteUserStore::new(&config.auth_db_path)
        .with_context(|| format!("Failed to open user store at {}", config.auth_db_path))?;
    info!("🗄️  User store ready at {}", config.auth_db_path);

    if let Some(seed) = &config.admin_seed {
        let created = store
            .seed_admin(seed)
            .await
            .context("Failed to seed admin account")?;
        if created {
            info!("👑 Seeded admin account {}", seed.email);
        }
    }

    let jwt = Arc::new(JwtHandler::new(&config.auth));
    let service = AuthService::new(Arc::new(store), jwt);
    let app = build_router(service);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movieshelf_backend=debug,movieshelf=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
