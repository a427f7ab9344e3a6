use std::sync::Arc;

use campus_matching::config::AppConfig;
use campus_matching::store::PgStore;
use campus_matching::{build_router, AppState};
use campus_shared::clients::db::create_pool;
use campus_shared::clients::rabbitmq::RabbitMQClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    campus_shared::middleware::init_tracing("campus-matching");

    let config = AppConfig::load()?;
    let port = config.port;

    let pool = create_pool(&config.database_url, config.db_pool_size)?;
    let store = Arc::new(PgStore::new(pool));

    // Matching keeps working without the broker; events are dropped.
    let rabbitmq = match RabbitMQClient::connect(&config.rabbitmq_url).await {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "rabbitmq unavailable, domain events disabled");
            None
        }
    };

    let metrics_handle = campus_shared::middleware::init_metrics()?;
    campus_matching::matching::protocol::describe_metrics();

    let state = Arc::new(AppState {
        store,
        config,
        rabbitmq,
        metrics_handle,
    });

    let app = build_router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "campus-matching starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
