//! LP burn check

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

use crate::chain::ChainDataProvider;
use crate::error::{Error, Result};
use crate::filter::{PoolFilter, Verdict};
use crate::pool::PoolDescriptor;

/// Passes only when the whole LP supply has been burned
pub struct BurnFilter {
    chain: Arc<dyn ChainDataProvider>,
}

impl BurnFilter {
    pub fn new(chain: Arc<dyn ChainDataProvider>) -> Self {
        Self { chain }
    }

    async fn check(&self, pool: &PoolDescriptor) -> Result<Verdict> {
        let supply = self
            .chain
            .token_supply(&pool.lp_mint)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("LP mint {}", pool.lp_mint)))?;

        if supply.is_zero() {
            return Ok(Verdict::pass());
        }

        Ok(Verdict::fail("Burned -> Creator didn't burn LP")
            .with_data(json!({ "lp_supply": supply.ui_amount(pool.lp_decimals) })))
    }
}

#[async_trait]
impl PoolFilter for BurnFilter {
    fn name(&self) -> &'static str {
        "burn"
    }

    async fn evaluate(&self, pool: &PoolDescriptor) -> Verdict {
        match self.check(pool).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(mint = %pool.base_mint, error = %e, "Burned -> Failed to check if LP is burned");
                Verdict::fail(format!("Burned -> Failed to check if LP is burned: {}", e))
            }
        }
    }
}
