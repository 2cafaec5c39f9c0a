use std::sync::Arc;

use anyhow::Context;

use collegeplan_api::app::{app, AppState};
use collegeplan_api::config;
use collegeplan_api::database::DatabaseManager;
use collegeplan_api::identity::RemoteIdentityProvider;
use collegeplan_api::services::{PgProfileStore, PgQuestionStore, QuestionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, IDENTITY_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting collegeplan API in {:?} mode", config.environment);

    let pool = DatabaseManager::pool()
        .await
        .context("failed to connect to database")?;
    DatabaseManager::ensure_schema(&pool)
        .await
        .context("failed to ensure database schema")?;

    let questions = PgQuestionStore::new(pool.clone());

    // Maintenance diagnostic: legacy records imported before per-owner
    // scoping carry no owner tag and are invisible to the API.
    match questions.count_unowned().await {
        Ok(0) => {}
        Ok(count) => tracing::warn!("Found {} legacy questions without an owner", count),
        Err(e) => tracing::warn!("Owner diagnostic scan failed: {}", e),
    }

    let state = AppState {
        identity: Arc::new(RemoteIdentityProvider::new(&config.identity)),
        questions: Arc::new(questions),
        profiles: Arc::new(PgProfileStore::new(pool)),
    };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(config.server.port);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}
