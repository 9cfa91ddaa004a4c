//! Pool identity and on-chain layouts
//!
//! A `PoolDescriptor` is built once per candidate pool and handed to
//! every filter by shared reference. Filters never mutate it.

pub mod accounts;
pub mod program;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::error::{Error, Result};

pub use accounts::{LiquidityStateV4, TokenMetadata};

/// Addressing info for a candidate liquidity pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolDescriptor {
    /// Pool (AMM) account address
    #[serde(serialize_with = "as_base58")]
    pub id: Pubkey,
    /// Liquidity program owning the pool
    #[serde(serialize_with = "as_base58")]
    pub program_id: Pubkey,
    #[serde(serialize_with = "as_base58")]
    pub base_mint: Pubkey,
    #[serde(serialize_with = "as_base58")]
    pub quote_mint: Pubkey,
    #[serde(serialize_with = "as_base58")]
    pub lp_mint: Pubkey,
    #[serde(serialize_with = "as_base58")]
    pub base_vault: Pubkey,
    #[serde(serialize_with = "as_base58")]
    pub quote_vault: Pubkey,
    pub base_decimals: u8,
    pub quote_decimals: u8,
    pub lp_decimals: u8,
    /// OpenBook market backing the pool
    #[serde(serialize_with = "as_base58")]
    pub market_id: Pubkey,
}

impl PoolDescriptor {
    /// Build a descriptor from a decoded Raydium v4 pool account
    pub fn from_liquidity_state(
        id: Pubkey,
        program_id: Pubkey,
        state: &LiquidityStateV4,
    ) -> Result<Self> {
        let base_decimals = decimals_from_state(state.base_decimal, "base")?;
        let quote_decimals = decimals_from_state(state.quote_decimal, "quote")?;

        let descriptor = Self {
            id,
            program_id,
            base_mint: state.base_mint,
            quote_mint: state.quote_mint,
            lp_mint: state.lp_mint,
            base_vault: state.base_vault,
            quote_vault: state.quote_vault,
            base_decimals,
            quote_decimals,
            // Raydium v4 LP mints share the base decimals
            lp_decimals: base_decimals,
            market_id: state.market_id,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Identity key used by stateful filters
    pub fn identity(&self) -> String {
        self.base_mint.to_string()
    }

    /// Reject descriptors no filter could evaluate meaningfully
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("base_mint", &self.base_mint),
            ("quote_mint", &self.quote_mint),
            ("base_vault", &self.base_vault),
            ("quote_vault", &self.quote_vault),
        ];
        for (field, key) in required {
            if *key == Pubkey::default() {
                return Err(Error::InvalidPool(format!("{} is unset", field)));
            }
        }

        if self.base_mint == self.quote_mint {
            return Err(Error::InvalidPool(format!(
                "base and quote mint are both {}",
                self.base_mint
            )));
        }

        if self.base_vault == self.quote_vault {
            return Err(Error::InvalidPool(format!(
                "base and quote vault are both {}",
                self.base_vault
            )));
        }

        Ok(())
    }
}

fn decimals_from_state(value: u64, side: &str) -> Result<u8> {
    u8::try_from(value)
        .map_err(|_| Error::InvalidPool(format!("{} decimals out of range: {}", side, value)))
}

fn as_base58<S: serde::Serializer>(key: &Pubkey, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_pool() -> PoolDescriptor {
        PoolDescriptor {
            id: Pubkey::new_unique(),
            program_id: program::RAYDIUM_LIQUIDITY_V4_PROGRAM_ID,
            base_mint: Pubkey::new_unique(),
            quote_mint: program::WSOL_MINT,
            lp_mint: Pubkey::new_unique(),
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            base_decimals: 6,
            quote_decimals: 9,
            lp_decimals: 6,
            market_id: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_valid_pool() {
        assert!(sample_pool().validate().is_ok());
    }

    #[test]
    fn test_identity_is_base_mint() {
        let pool = sample_pool();
        assert_eq!(pool.identity(), pool.base_mint.to_string());
    }

    #[test]
    fn test_same_mints_rejected() {
        let mut pool = sample_pool();
        pool.quote_mint = pool.base_mint;
        assert!(matches!(pool.validate(), Err(Error::InvalidPool(_))));
    }

    #[test]
    fn test_unset_vault_rejected() {
        let mut pool = sample_pool();
        pool.quote_vault = Pubkey::default();
        let err = pool.validate().unwrap_err();
        assert!(err.to_string().contains("quote_vault"));
    }

    #[test]
    fn test_from_liquidity_state() {
        let state = LiquidityStateV4 {
            base_decimal: 6,
            quote_decimal: 9,
            base_mint: Pubkey::new_unique(),
            quote_mint: program::WSOL_MINT,
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            lp_mint: Pubkey::new_unique(),
            ..Default::default()
        };
        let id = Pubkey::new_unique();
        let pool = PoolDescriptor::from_liquidity_state(
            id,
            program::RAYDIUM_LIQUIDITY_V4_PROGRAM_ID,
            &state,
        )
        .unwrap();

        assert_eq!(pool.id, id);
        assert_eq!(pool.base_mint, state.base_mint);
        assert_eq!(pool.base_decimals, 6);
        assert_eq!(pool.quote_decimals, 9);
        assert_eq!(pool.lp_decimals, 6);
    }

    #[test]
    fn test_from_liquidity_state_bad_decimals() {
        let state = LiquidityStateV4 {
            base_decimal: 300,
            base_mint: Pubkey::new_unique(),
            quote_mint: Pubkey::new_unique(),
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            ..Default::default()
        };
        let result =
            PoolDescriptor::from_liquidity_state(Pubkey::new_unique(), Pubkey::new_unique(), &state);
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_keys_as_base58() {
        let pool = sample_pool();
        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["base_mint"], pool.base_mint.to_string());
    }
}
