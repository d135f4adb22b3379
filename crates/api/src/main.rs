mod config;
mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use config::AppConfig;
use handlers::AppState;
use jsonld::{AzureOpenAiClient, ChatCompletion, SchemaComparator, SchemaGenerator};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing();

    let client: Arc<dyn ChatCompletion> = Arc::new(AzureOpenAiClient::new(
        config.llm.endpoint.clone(),
        config.llm.deployment.clone(),
        config.llm.api_key.clone(),
        config.llm.api_version.clone(),
    ));

    tracing::info!(
        deployment = %config.llm.deployment,
        max_attempts = config.retry.max_attempts,
        "Schema service configured"
    );

    let state = Arc::new(AppState {
        generator: SchemaGenerator::new(client.clone(), config.retry_policy()),
        comparator: SchemaComparator::new(client),
        ingest: config.ingest_config(),
        max_attempts: config.retry.max_request_attempts,
    });

    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    tracing::info!("Server listening on http://{}", config.server.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
