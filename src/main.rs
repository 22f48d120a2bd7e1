use anyhow::Result;
use marketplace_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    marketplace_server::init_tracing(&config);

    marketplace_server::run(config).await
}
