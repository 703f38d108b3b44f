use std::time::Duration;

use nutrigrade::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutrigrade=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (app_state, pg) = AppState::init().await?;

    if let Some(pg) = &pg {
        if let Err(e) = sqlx::migrate!("./migrations").run(pg.pool()).await {
            tracing::warn!(error = %e, "migrations folder not found or migration failed; continuing");
        }
    }

    let cache = app_state.cache.clone();
    let every = Duration::from_secs(app_state.config.cache_cleanup_interval_minutes * 60);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.cleanup_expired().await;
            tracing::info!(removed, "periodic cache cleanup");
        }
    });

    let background = app_state.background.clone();
    let result = app::serve(app::build_app(app_state)).await;
    background.flush().await;
    result
}
