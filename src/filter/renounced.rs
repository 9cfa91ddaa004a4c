//! Mint and freeze authority checks
//!
//! A live mint authority lets the creator inflate supply; a live freeze
//! authority lets it freeze holders' accounts.

use async_trait::async_trait;
use serde_json::json;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;
use std::sync::Arc;
use tracing::error;

use crate::chain::ChainDataProvider;
use crate::error::{Error, Result};
use crate::filter::{PoolFilter, Verdict};
use crate::pool::PoolDescriptor;

pub struct RenouncedFreezeFilter {
    chain: Arc<dyn ChainDataProvider>,
    check_renounced: bool,
    check_freezable: bool,
}

impl RenouncedFreezeFilter {
    pub fn new(chain: Arc<dyn ChainDataProvider>, check_renounced: bool, check_freezable: bool) -> Self {
        Self {
            chain,
            check_renounced,
            check_freezable,
        }
    }

    async fn check(&self, pool: &PoolDescriptor) -> Result<Verdict> {
        let data = self
            .chain
            .account_data(&pool.base_mint)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("mint {}", pool.base_mint)))?;

        if data.len() < Mint::LEN {
            return Err(Error::AccountDecode(format!(
                "mint account is {} bytes, expected at least {}",
                data.len(),
                Mint::LEN
            )));
        }

        // Token-2022 mints carry extensions past the base layout
        let mint = Mint::unpack_from_slice(&data[..Mint::LEN])
            .map_err(|e| Error::AccountDecode(format!("Mint decode failed: {}", e)))?;

        let renounced = mint.mint_authority.is_none();
        let freezable = mint.freeze_authority.is_some();

        let mut reasons = Vec::new();
        if self.check_renounced && !renounced {
            reasons.push("mint more tokens");
        }
        if self.check_freezable && freezable {
            reasons.push("freeze token accounts");
        }

        if reasons.is_empty() {
            return Ok(Verdict::pass());
        }

        Ok(Verdict::fail(format!("RenouncedFreeze -> Creator can {}", reasons.join(" and ")))
            .with_data(json!({ "renounced": renounced, "freezable": freezable })))
    }
}

#[async_trait]
impl PoolFilter for RenouncedFreezeFilter {
    fn name(&self) -> &'static str {
        "renounced_freeze"
    }

    async fn evaluate(&self, pool: &PoolDescriptor) -> Verdict {
        match self.check(pool).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(mint = %pool.base_mint, error = %e, "RenouncedFreeze -> Failed to check mint authorities");
                Verdict::fail(format!("RenouncedFreeze -> Failed to check mint authorities: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::testing::MockChain;
    use crate::pool::tests::sample_pool;
    use spl_token::solana_program::program_option::COption;
    use solana_sdk::pubkey::Pubkey;

    fn mint_bytes(mint_authority: bool, freeze_authority: bool) -> Vec<u8> {
        let mint = Mint {
            mint_authority: if mint_authority {
                COption::Some(Pubkey::new_unique())
            } else {
                COption::None
            },
            supply: 1_000_000_000,
            decimals: 6,
            is_initialized: true,
            freeze_authority: if freeze_authority {
                COption::Some(Pubkey::new_unique())
            } else {
                COption::None
            },
        };
        let mut data = vec![0u8; Mint::LEN];
        Mint::pack(mint, &mut data).unwrap();
        data
    }

    async fn run(check_renounced: bool, check_freezable: bool, data: Vec<u8>) -> Verdict {
        let chain = Arc::new(MockChain::new());
        let pool = sample_pool();
        chain.set_account(pool.base_mint, data);
        RenouncedFreezeFilter::new(chain, check_renounced, check_freezable)
            .evaluate(&pool)
            .await
    }

    #[tokio::test]
    async fn test_renounced_and_unfreezable_passes() {
        assert!(run(true, true, mint_bytes(false, false)).await.is_ok());
    }

    #[tokio::test]
    async fn test_live_mint_authority_fails() {
        let verdict = run(true, false, mint_bytes(true, false)).await;
        assert_eq!(
            verdict.message(),
            Some("RenouncedFreeze -> Creator can mint more tokens")
        );
    }

    #[tokio::test]
    async fn test_freeze_ignored_unless_checked() {
        assert!(run(true, false, mint_bytes(false, true)).await.is_ok());

        let verdict = run(false, true, mint_bytes(false, true)).await;
        assert!(!verdict.is_ok());
        assert_eq!(verdict.data().unwrap()["freezable"], true);
    }

    #[tokio::test]
    async fn test_token_2022_tail_is_ignored() {
        let mut data = mint_bytes(false, false);
        data.extend_from_slice(&[0u8; 83]);
        assert!(run(true, true, data).await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_mint_fails_closed() {
        assert!(!run(true, true, vec![7u8; 20]).await.is_ok());
    }
}
