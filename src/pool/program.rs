//! Program IDs and fixed account sizes for the pools we inspect
//!
//! # WARNING: Layout sizes are tied to the deployed program versions
//! Raydium and Metaplex have shipped new versions before. If decoding
//! starts failing for every pool, check these against the live programs.

use solana_sdk::pubkey::Pubkey;

/// Raydium liquidity pool v4 (AMM) program
pub const RAYDIUM_LIQUIDITY_V4_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8");

/// Metaplex token metadata program
pub const METADATA_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Wrapped SOL mint, the usual quote token
pub const WSOL_MINT: Pubkey = solana_sdk::pubkey!("So11111111111111111111111111111111111111112");

/// Size of a Raydium v4 liquidity state account
pub const LIQUIDITY_STATE_V4_LEN: usize = 752;

/// Derive the Metaplex metadata PDA for a mint
pub fn metadata_address(mint: &Pubkey) -> Pubkey {
    let (address, _bump) = Pubkey::find_program_address(
        &[b"metadata", METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &METADATA_PROGRAM_ID,
    );
    address
}
