use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod authcode;
mod config;
mod models;
mod password;
mod repositories;
mod resolver;
mod routes;
mod token;

use common::database;

use crate::repositories::{PgSessionStore, PgUserStore, SessionStore, UserStore};
use crate::resolver::IdentityResolver;
use crate::token::{NoTokenAuthority, TokenAuthority};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub resolver: IdentityResolver,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    sqlx::migrate!().run(&pool).await?;
    info!("Database migrations applied");

    let security = config::SecurityConfig::from_env()?;
    if security.auth_code.is_some() {
        info!("Legacy auth-code policy is enabled");
    }

    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
    let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(pool));

    // Deployments with an API-token scheme swap in their own authority here
    let token_authority: Arc<dyn TokenAuthority> = Arc::new(NoTokenAuthority);

    let resolver = IdentityResolver::new(sessions.clone(), token_authority, &security);

    let app_state = AppState {
        users,
        sessions,
        resolver,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Authentication service listening on 0.0.0.0:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
