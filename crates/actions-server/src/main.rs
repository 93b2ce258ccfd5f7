use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod blockhash;
mod config;
mod error;
mod server;

use config::ServerConfig;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "actions_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting anonymous report actions server");

    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;

    warn!(
        "SECRET_KEY keypair {} doubles as the memo encryption passphrase. \
         Anyone holding it can decrypt every report; never use it to sign transactions.",
        config.secret_pubkey
    );
    info!("RPC endpoint: {} (timeout {:?})", config.rpc_url, config.rpc_timeout);
    info!("Listening on: {}:{}", config.host, config.port);

    let state = Arc::new(AppState::new(config)?);
    server::run(state).await?;
    Ok(())
}
