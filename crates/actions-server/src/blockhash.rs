use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, hash::Hash};
use std::time::Duration;

use crate::error::Result;

/// Source of the recent blockhash stamped on every unsigned transaction.
#[async_trait]
pub trait BlockhashSource: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash>;
}

pub struct RpcBlockhashSource {
    rpc_client: RpcClient,
}

impl RpcBlockhashSource {
    pub fn new(rpc_url: String, timeout: Duration) -> Self {
        Self {
            rpc_client: RpcClient::new_with_timeout_and_commitment(
                rpc_url,
                timeout,
                CommitmentConfig::confirmed(),
            ),
        }
    }
}

#[async_trait]
impl BlockhashSource for RpcBlockhashSource {
    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(self.rpc_client.get_latest_blockhash().await?)
    }
}
