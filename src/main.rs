use anyhow::Result;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn"));
    // stdout belongs to the prompt.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    cinesuggest::config::check_env()?;
    let code = match cinesuggest::app::run().await {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };
    // A pending stdin read would otherwise keep the runtime from shutting down.
    std::process::exit(code)
}
