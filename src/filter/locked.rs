//! Locked-liquidity check
//!
//! Decodes the Raydium v4 liquidity state and accepts the pool only when
//! its `status` reads as exactly 1. Oversized status values are treated as
//! unlocked rather than guessed at. Never retried.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::chain::ChainDataProvider;
use crate::error::{Error, Result};
use crate::filter::{PoolFilter, Verdict};
use crate::pool::accounts::{LiquidityStateV4, MAX_SAFE_INTEGER};
use crate::pool::PoolDescriptor;

pub struct LockedLiquidityFilter {
    chain: Arc<dyn ChainDataProvider>,
}

impl LockedLiquidityFilter {
    pub fn new(chain: Arc<dyn ChainDataProvider>) -> Self {
        Self { chain }
    }

    async fn check(&self, pool: &PoolDescriptor) -> Result<Verdict> {
        let data = match self.chain.account_data(&pool.base_mint).await? {
            Some(data) if !data.is_empty() => data,
            _ => return Ok(Verdict::fail("LockedLiquidity -> Failed to fetch account data")),
        };

        let state = LiquidityStateV4::try_from_slice(&data)?;

        if state.is_liquidity_locked() {
            return Ok(Verdict::pass());
        }

        let verdict = Verdict::fail("LockedLiquidity -> Creator can Rug Pull").with_data(json!({
            "status": state.status,
            "status_in_safe_range": state.status <= MAX_SAFE_INTEGER,
        }));
        Ok(verdict)
    }
}

#[async_trait]
impl PoolFilter for LockedLiquidityFilter {
    fn name(&self) -> &'static str {
        "locked_liquidity"
    }

    async fn evaluate(&self, pool: &PoolDescriptor) -> Verdict {
        match self.check(pool).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(mint = %pool.base_mint, error = %e, "LockedLiquidity -> Failed to check if liquidity is locked");
                failure_verdict(&e)
            }
        }
    }
}

fn failure_verdict(e: &Error) -> Verdict {
    Verdict::fail(format!(
        "LockedLiquidity -> Failed to check if liquidity is locked: {}",
        e
    ))
}
