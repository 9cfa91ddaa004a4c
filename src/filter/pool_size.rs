//! Quote-side liquidity bounds

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::chain::ChainDataProvider;
use crate::error::{Error, Result};
use crate::filter::{PoolFilter, Verdict};
use crate::pool::PoolDescriptor;

/// Quote vault balance must sit within `[min, max]`; a bound of 0 is ignored
pub struct PoolSizeFilter {
    chain: Arc<dyn ChainDataProvider>,
    min: f64,
    max: f64,
}

impl PoolSizeFilter {
    pub fn new(chain: Arc<dyn ChainDataProvider>, min: f64, max: f64) -> Self {
        Self { chain, min, max }
    }

    /// Whether either bound is active
    pub fn is_bounded(min: f64, max: f64) -> bool {
        min > 0.0 || max > 0.0
    }

    async fn check(&self, pool: &PoolDescriptor) -> Result<Verdict> {
        let balance = self
            .chain
            .token_account_balance(&pool.quote_vault)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("quote vault {}", pool.quote_vault)))?;
        let size = balance.ui_amount(pool.quote_decimals);
        let data = json!({ "pool_size": size, "min": self.min, "max": self.max });

        if self.max > 0.0 && size > self.max {
            return Ok(Verdict::fail(format!("PoolSize -> Pool size {} > {}", size, self.max)).with_data(data));
        }

        if self.min > 0.0 && size < self.min {
            return Ok(Verdict::fail(format!("PoolSize -> Pool size {} < {}", size, self.min)).with_data(data));
        }

        Ok(Verdict::pass())
    }
}

#[async_trait]
impl PoolFilter for PoolSizeFilter {
    fn name(&self) -> &'static str {
        "pool_size"
    }

    async fn evaluate(&self, pool: &PoolDescriptor) -> Verdict {
        match self.check(pool).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(mint = %pool.base_mint, error = %e, "PoolSize -> Failed to check pool size");
                Verdict::fail(format!("PoolSize -> Failed to check pool size: {}", e))
            }
        }
    }
}
