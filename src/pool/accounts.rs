//! On-chain account layouts read by the filters
//!
//! # WARNING: These structures mirror external programs
//! Raydium AMM v4 and Metaplex metadata layouts are owned by their
//! programs. If deserialization fails across the board, these structures
//! may need updating.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use super::program::LIQUIDITY_STATE_V4_LEN;
use crate::error::{Error, Result};

/// Largest integer a double can hold without losing precision (2^53 - 1)
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Raydium AMM v4 liquidity state account
///
/// Field order matches the on-chain layout exactly; every field is
/// little-endian. Total size is 752 bytes.
#[derive(Debug, Clone, Default, BorshDeserialize, BorshSerialize)]
pub struct LiquidityStateV4 {
    pub status: u64,
    pub nonce: u64,
    pub max_order: u64,
    pub depth: u64,
    pub base_decimal: u64,
    pub quote_decimal: u64,
    pub state: u64,
    pub reset_flag: u64,
    pub min_size: u64,
    pub vol_max_cut_ratio: u64,
    pub amount_wave_ratio: u64,
    pub base_lot_size: u64,
    pub quote_lot_size: u64,
    pub min_price_multiplier: u64,
    pub max_price_multiplier: u64,
    pub system_decimal_value: u64,
    pub min_separate_numerator: u64,
    pub min_separate_denominator: u64,
    pub trade_fee_numerator: u64,
    pub trade_fee_denominator: u64,
    pub pnl_numerator: u64,
    pub pnl_denominator: u64,
    pub swap_fee_numerator: u64,
    pub swap_fee_denominator: u64,
    pub base_need_take_pnl: u64,
    pub quote_need_take_pnl: u64,
    pub quote_total_pnl: u64,
    pub base_total_pnl: u64,
    pub pool_open_time: u64,
    pub punish_pc_amount: u64,
    pub punish_coin_amount: u64,
    pub orderbook_to_init_time: u64,
    pub swap_base_in_amount: u128,
    pub swap_quote_out_amount: u128,
    pub swap_base2_quote_fee: u64,
    pub swap_quote_in_amount: u128,
    pub swap_base_out_amount: u128,
    pub swap_quote2_base_fee: u64,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
    pub lp_mint: Pubkey,
    pub open_orders: Pubkey,
    pub market_id: Pubkey,
    pub market_program_id: Pubkey,
    pub target_orders: Pubkey,
    pub withdraw_queue: Pubkey,
    pub lp_vault: Pubkey,
    pub owner: Pubkey,
    pub lp_reserve: u64,
    pub padding: [u64; 3],
}

impl LiquidityStateV4 {
    /// Deserialize from account data
    ///
    /// Trailing bytes past the fixed layout are ignored.
    pub fn try_from_slice(data: &[u8]) -> Result<Self> {
        if data.len() < LIQUIDITY_STATE_V4_LEN {
            return Err(Error::AccountDecode(format!(
                "Liquidity state too short: expected {} bytes, got {}",
                LIQUIDITY_STATE_V4_LEN,
                data.len()
            )));
        }

        BorshDeserialize::try_from_slice(&data[..LIQUIDITY_STATE_V4_LEN])
            .map_err(|e| Error::AccountDecode(format!("Borsh decode failed: {}", e)))
    }

    /// Whether the status value can be read as a plain integer
    pub fn status_is_safe_integer(&self) -> bool {
        self.status <= MAX_SAFE_INTEGER
    }

    /// Liquidity counts as locked only for a safe-range status of exactly 1
    pub fn is_liquidity_locked(&self) -> bool {
        self.status_is_safe_integer() && self.status == 1
    }
}

/// Metaplex creator entry
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct Creator {
    pub address: Pubkey,
    pub verified: bool,
    pub share: u8,
}

/// Metaplex metadata `data` section
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct MetadataData {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub creators: Option<Vec<Creator>>,
}

/// Leading fields of a Metaplex metadata account
///
/// Only the prefix up to `is_mutable` is decoded; later optional fields
/// (edition nonce, collection, uses, ...) are not needed by any filter.
#[derive(Debug, Clone, BorshDeserialize, BorshSerialize)]
pub struct TokenMetadata {
    pub key: u8,
    pub update_authority: Pubkey,
    pub mint: Pubkey,
    pub data: MetadataData,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
}

impl TokenMetadata {
    /// Deserialize the metadata prefix from account data
    pub fn try_from_slice(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        <Self as BorshDeserialize>::deserialize(&mut cursor)
            .map_err(|e| Error::AccountDecode(format!("Metadata decode failed: {}", e)))
    }

    /// Metadata URI with the on-chain null padding stripped
    pub fn uri(&self) -> &str {
        self.data.uri.trim_end_matches('\0').trim()
    }
}
