use ihbar_sdk::variant::{DEFAULT_BENIM_HAYATIM_RECIPIENT, DEFAULT_PLATFORM_IHBAR_RECIPIENT};
use ihbar_sdk::{keypair_from_str, ActionVariant, ServerSecret};
use solana_sdk::{pubkey::Pubkey, signer::Signer};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
/// CAIP-2 id of Solana devnet, advertised in `X-Blockchain-Ids`.
pub const DEVNET_BLOCKCHAIN_ID: &str = "solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub rpc_url: String,
    pub rpc_timeout: Duration,
    pub host: String,
    pub port: u16,
    /// Origin used for GET link templates; falls back to the request's Host header.
    pub public_base_url: Option<String>,
    pub blockchain_id: String,
    pub max_body_bytes: usize,
    pub benim_hayatim_recipient: Pubkey,
    pub platform_ihbar_recipient: Pubkey,
    /// Public key of the SECRET_KEY keypair, for logs only.
    pub secret_pubkey: Pubkey,
    pub secret: ServerSecret,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let secret_key = lookup("SECRET_KEY")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("SECRET_KEY is not set"))?;
        let keypair = keypair_from_str(&secret_key)
            .map_err(|e| anyhow::anyhow!("Failed to load SECRET_KEY: {}", e))?;

        let rpc_url = lookup("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

        let rpc_timeout = Duration::from_secs(
            lookup("RPC_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());

        let blockchain_id =
            lookup("BLOCKCHAIN_ID").unwrap_or_else(|| DEVNET_BLOCKCHAIN_ID.to_string());

        let max_body_bytes = lookup("MAX_BODY_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(16 * 1024);

        let benim_hayatim_recipient = recipient(
            lookup("BENIM_HAYATIM_RECIPIENT"),
            DEFAULT_BENIM_HAYATIM_RECIPIENT,
        )?;
        let platform_ihbar_recipient = recipient(
            lookup("PLATFORM_IHBAR_RECIPIENT"),
            DEFAULT_PLATFORM_IHBAR_RECIPIENT,
        )?;

        Ok(Self {
            rpc_url,
            rpc_timeout,
            host,
            port,
            public_base_url,
            blockchain_id,
            max_body_bytes,
            benim_hayatim_recipient,
            platform_ihbar_recipient,
            secret_pubkey: keypair.pubkey(),
            secret: ServerSecret::from_keypair(&keypair),
        })
    }

    pub fn variants(&self) -> anyhow::Result<Vec<ActionVariant>> {
        Ok(vec![
            ActionVariant::benim_hayatim(self.benim_hayatim_recipient)?,
            ActionVariant::platform_ihbar(self.platform_ihbar_recipient)?,
        ])
    }
}

fn recipient(value: Option<String>, default: &str) -> anyhow::Result<Pubkey> {
    let value = value.unwrap_or_else(|| default.to_string());
    Pubkey::from_str(&value).map_err(|e| anyhow::anyhow!("Invalid recipient {}: {}", value, e))
}
