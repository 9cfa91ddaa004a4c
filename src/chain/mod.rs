//! Chain data access used by the filters
//!
//! Filters only see the `ChainDataProvider` trait; `RpcChainProvider`
//! backs it with a Solana JSON-RPC node. An empty answer (`Ok(None)`)
//! means the account does not exist and must never be read as zero.

pub mod remote;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::config::RpcConfig;
use crate::error::{Error, Result};

pub use remote::{HttpCheckClient, RemoteCheckClient};

/// Raw SPL token amount with its mint decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub raw: u64,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: u64, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Parse the string amount returned by the RPC node
    pub fn parse(amount: &str, decimals: u8) -> Result<Self> {
        let raw = amount
            .parse::<u64>()
            .map_err(|e| Error::AccountDecode(format!("Invalid token amount '{}': {}", amount, e)))?;
        Ok(Self { raw, decimals })
    }

    /// Amount scaled by the given decimals
    pub fn ui_amount(&self, decimals: u8) -> f64 {
        self.raw as f64 / 10f64.powi(decimals as i32)
    }

    pub fn is_zero(&self) -> bool {
        self.raw == 0
    }
}

/// Read-only chain state needed by the filters
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Raw data of an account, `None` if it does not exist
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Balance of an SPL token account
    async fn token_account_balance(&self, address: &Pubkey) -> Result<Option<TokenAmount>>;

    /// Total supply of an SPL mint
    async fn token_supply(&self, mint: &Pubkey) -> Result<Option<TokenAmount>>;
}

/// `ChainDataProvider` over the nonblocking Solana RPC client
pub struct RpcChainProvider {
    client: RpcClient,
}

impl RpcChainProvider {
    /// Create a provider from RPC configuration
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let commitment = CommitmentConfig::from_str(&config.commitment)
            .map_err(|e| Error::Config(format!("Invalid commitment '{}': {}", config.commitment, e)))?;

        let client = RpcClient::new_with_timeout_and_commitment(
            config.endpoint.clone(),
            Duration::from_millis(config.timeout_ms),
            commitment,
        );

        Ok(Self { client })
    }

    /// Underlying RPC client
    pub fn client(&self) -> &RpcClient {
        &self.client
    }
}

#[async_trait]
impl ChainDataProvider for RpcChainProvider {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await?;

        debug!(address = %address, found = response.value.is_some(), "Fetched account");
        Ok(response.value.map(|account| account.data))
    }

    async fn token_account_balance(&self, address: &Pubkey) -> Result<Option<TokenAmount>> {
        let balance = self.client.get_token_account_balance(address).await?;
        TokenAmount::parse(&balance.amount, balance.decimals).map(Some)
    }

    async fn token_supply(&self, mint: &Pubkey) -> Result<Option<TokenAmount>> {
        let supply = self.client.get_token_supply(mint).await?;
        TokenAmount::parse(&supply.amount, supply.decimals).map(Some)
    }
}
