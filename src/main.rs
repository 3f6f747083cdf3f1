use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::service::PayrollRunner;
use payroll_engine::store::InMemoryStore;

const DEFAULT_CONFIG_DIR: &str = "./config";
const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_line_number(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_dir = env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.into());
    let bind = env::var("PAYROLL_BIND").unwrap_or_else(|_| DEFAULT_BIND.into());

    let config = ConfigLoader::load(&config_dir)?;
    let store = match env::var("PAYROLL_SEED") {
        Ok(path) => InMemoryStore::from_json_file(path)?,
        Err(_) => InMemoryStore::new(),
    };

    let state = AppState::new(PayrollRunner::new(config, Arc::new(store)));
    let listener = TcpListener::bind(&bind).await?;
    info!(bind = %bind, config_dir = %config_dir, "Payroll engine listening");
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
