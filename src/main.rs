use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tododash::api::router;
use tododash::config::AppConfig;
use tododash::db;
use tododash::remote::{HttpTodoGateway, OfflineGateway, TodoGateway};
use tododash::services::StorageWatcher;
use tododash::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tododash=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url).await?;

    let gateway: Arc<dyn TodoGateway> = if config.offline {
        info!("running offline, remote todo service disabled");
        Arc::new(OfflineGateway)
    } else {
        Arc::new(HttpTodoGateway::new(config.remote.clone())?)
    };

    let state = AppState::new(pool, gateway, config.delete_policy, config.owner_filter);

    if !config.watch_interval.is_zero() {
        let watcher = StorageWatcher::new(
            state.store.clone(),
            state.notifier.clone(),
            config.watch_interval,
        );
        tokio::spawn(watcher.start());
    }

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
