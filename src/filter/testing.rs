//! Scripted collaborators for filter tests

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::chain::{ChainDataProvider, RemoteCheckClient, TokenAmount};
use crate::error::{Error, Result};
use crate::filter::{PoolFilter, Verdict};
use crate::pool::PoolDescriptor;

/// In-memory chain state; values can be changed between evaluations
#[derive(Default)]
pub struct MockChain {
    accounts: DashMap<Pubkey, Vec<u8>>,
    balances: DashMap<Pubkey, TokenAmount>,
    supplies: DashMap<Pubkey, TokenAmount>,
    failing: DashMap<Pubkey, String>,
    calls: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_account(&self, address: Pubkey, data: Vec<u8>) {
        self.accounts.insert(address, data);
    }

    pub fn set_balance(&self, address: Pubkey, raw: u64, decimals: u8) {
        self.balances.insert(address, TokenAmount::new(raw, decimals));
    }

    pub fn set_supply(&self, mint: Pubkey, raw: u64, decimals: u8) {
        self.supplies.insert(mint, TokenAmount::new(raw, decimals));
    }

    /// Make every read of `address` fail with an RPC error
    pub fn fail_on(&self, address: Pubkey, reason: &str) {
        self.failing.insert(address, reason.to_string());
    }

    pub fn clear_failure(&self, address: &Pubkey) {
        self.failing.remove(address);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, address: &Pubkey) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failing.get(address) {
            Some(reason) => Err(Error::Rpc(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainDataProvider for MockChain {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        self.check(address)?;
        Ok(self.accounts.get(address).map(|data| data.clone()))
    }

    async fn token_account_balance(&self, address: &Pubkey) -> Result<Option<TokenAmount>> {
        self.check(address)?;
        Ok(self.balances.get(address).map(|amount| *amount))
    }

    async fn token_supply(&self, mint: &Pubkey) -> Result<Option<TokenAmount>> {
        self.check(mint)?;
        Ok(self.supplies.get(mint).map(|amount| *amount))
    }
}

/// Remote client that replays a script, then repeats a fallback answer
pub struct MockRemote {
    script: Mutex<VecDeque<std::result::Result<Value, String>>>,
    fallback: std::result::Result<Value, String>,
    urls: Mutex<Vec<String>>,
    call_times: Mutex<Vec<Instant>>,
}

impl MockRemote {
    pub fn new(
        script: Vec<std::result::Result<Value, String>>,
        fallback: std::result::Result<Value, String>,
    ) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            urls: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same response
    pub fn always(response: std::result::Result<Value, String>) -> Self {
        Self::new(Vec::new(), response)
    }

    pub fn calls(&self) -> usize {
        self.call_times.lock().unwrap().len()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.call_times.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteCheckClient for MockRemote {
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.urls.lock().unwrap().push(url.to_string());
        self.call_times.lock().unwrap().push(Instant::now());

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
            .map_err(Error::Remote)
    }
}

/// Filter returning a fixed verdict, optionally after a delay
pub struct StaticFilter {
    name: &'static str,
    verdict: Verdict,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticFilter {
    pub fn passing(name: &'static str) -> Self {
        Self::new(name, Verdict::pass())
    }

    pub fn failing(name: &'static str, message: &str) -> Self {
        Self::new(name, Verdict::fail(message))
    }

    pub fn new(name: &'static str, verdict: Verdict) -> Self {
        Self {
            name,
            verdict,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolFilter for StaticFilter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn evaluate(&self, _pool: &PoolDescriptor) -> Verdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.verdict.clone()
    }
}
