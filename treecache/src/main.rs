use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use treecache::config::AppConfig;
use treecache::state::AppState;
use treecache::{routes, store};
use treecache_core::{Coordinator, CoreConfig};

fn init_tracing(write_log_to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "treecache=debug,tower_http=debug".into());

    let console_layer = tracing_subscriber::fmt::layer().with_target(false).with_level(true).pretty();

    let registry = tracing_subscriber::registry().with(filter).with(console_layer);

    if write_log_to_file {
        let file = std::fs::File::create("app.log").expect("cannot create log file");
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true);
        registry.with(json_layer).try_init().ok();
    } else {
        registry.try_init().ok();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(config.write_log_to_file);

    let coordinator = Arc::new(Coordinator::new(CoreConfig::from_env()));

    let pool = store::init_pool(&config.database_url).await?;
    store::seed_coordinator(&pool, &coordinator).await?;

    coordinator.start();

    let app = routes::build_router(AppState { coordinator: coordinator.clone() });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    coordinator.stop().await;
    Ok(())
}
