//! Market cap over a time window
//!
//! The first successful observation of a pool opens a window. Inside it the
//! cap is recomputed on every evaluation; reaching the target is memoized
//! as a permanent pass. Missing the window drops the record, so the pool
//! gets a fresh window the next time it is seen.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, trace};

use crate::chain::{ChainDataProvider, TokenAmount};
use crate::config::MarketCapConfig;
use crate::error::{Error, Result};
use crate::filter::window::{WindowPhase, WindowTracker};
use crate::filter::{PoolFilter, Verdict};
use crate::pool::PoolDescriptor;

/// Decimal-adjusted snapshot used for one cap computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketCapSnapshot {
    pub base_reserve: f64,
    pub quote_reserve: f64,
    pub supply: f64,
}

impl MarketCapSnapshot {
    /// Quote per base token, 0 when the base reserve is empty
    pub fn price(&self) -> f64 {
        if self.base_reserve == 0.0 {
            0.0
        } else {
            self.quote_reserve / self.base_reserve
        }
    }

    pub fn market_cap(&self) -> f64 {
        self.price() * self.supply
    }
}

pub struct MarketCapWindowFilter {
    chain: Arc<dyn ChainDataProvider>,
    target: f64,
    tracker: WindowTracker,
}

impl MarketCapWindowFilter {
    pub fn new(chain: Arc<dyn ChainDataProvider>, target: f64, window: Duration) -> Self {
        Self {
            chain,
            target,
            tracker: WindowTracker::new(window),
        }
    }

    pub fn from_config(chain: Arc<dyn ChainDataProvider>, config: &MarketCapConfig) -> Self {
        Self::new(
            chain,
            config.target,
            Duration::from_secs(config.time_window_secs),
        )
    }

    /// Identities currently holding a window record
    pub fn tracked_pools(&self) -> usize {
        self.tracker.len()
    }

    async fn snapshot(&self, pool: &PoolDescriptor) -> Result<MarketCapSnapshot> {
        let (base, quote, supply) = tokio::try_join!(
            self.chain.token_account_balance(&pool.base_vault),
            self.chain.token_account_balance(&pool.quote_vault),
            self.chain.token_supply(&pool.base_mint),
        )?;

        let base = require(base, "base vault", &pool.base_vault.to_string())?;
        let quote = require(quote, "quote vault", &pool.quote_vault.to_string())?;
        let supply = require(supply, "base mint supply", &pool.base_mint.to_string())?;

        Ok(MarketCapSnapshot {
            base_reserve: base.ui_amount(pool.base_decimals),
            quote_reserve: quote.ui_amount(pool.quote_decimals),
            supply: supply.ui_amount(pool.base_decimals),
        })
    }

    fn expiry_verdict(&self, elapsed: Duration) -> Verdict {
        Verdict::fail(format!(
            "MarketCap -> Failed to reach target within {}s time window",
            self.tracker.window().as_secs()
        ))
        .with_data(json!({
            "target": self.target,
            "elapsed_secs": elapsed.as_secs(),
        }))
    }
}

fn require(amount: Option<TokenAmount>, what: &str, address: &str) -> Result<TokenAmount> {
    amount.ok_or_else(|| Error::AccountNotFound(format!("{} {}", what, address)))
}

#[async_trait]
impl PoolFilter for MarketCapWindowFilter {
    fn name(&self) -> &'static str {
        "market_cap"
    }

    async fn evaluate(&self, pool: &PoolDescriptor) -> Verdict {
        let key = pool.identity();
        let mut window = self.tracker.lock(&key).await;
        let now = Instant::now();

        match window.phase(now) {
            WindowPhase::Passed => return Verdict::pass(),
            WindowPhase::Expired { elapsed } => {
                window.expire();
                drop(window);
                self.tracker.forget_if_idle(&key);
                return self.expiry_verdict(elapsed);
            }
            WindowPhase::Unseen | WindowPhase::Tracking { .. } => {}
        }

        // Window state is left untouched when the reads fail
        let snapshot = match self.snapshot(pool).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(mint = %key, error = %e, "MarketCap -> Failed to check market cap");
                drop(window);
                self.tracker.forget_if_idle(&key);
                return Verdict::fail("MarketCap -> Failed to check market cap")
                    .with_data(json!({ "error": e.to_string() }));
            }
        };

        window.start(now);
        let market_cap = snapshot.market_cap();

        if market_cap >= self.target {
            window.mark_reached();
            trace!(mint = %key, market_cap, target = self.target, "MarketCap -> target reached");
            return Verdict::pass();
        }

        let remaining = match window.phase(now) {
            WindowPhase::Tracking { remaining, .. } => remaining,
            _ => Duration::ZERO,
        };

        Verdict::fail(format!(
            "MarketCap -> Current: {:.2} Target: {} Time left: {}s",
            market_cap,
            self.target,
            remaining.as_secs()
        ))
        .with_data(json!({
            "market_cap": market_cap,
            "target": self.target,
            "time_left_secs": remaining.as_secs(),
        }))
    }
}
