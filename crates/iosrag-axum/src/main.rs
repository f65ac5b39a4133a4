use clap::Parser;
use iosrag_axum::{ServerConfig, start_server};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    let config = ServerConfig::parse();
    init_tracing(&config.log_filter);

    start_server(config).await
}
