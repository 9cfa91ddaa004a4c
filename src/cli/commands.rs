//! CLI command implementations

use anyhow::{Context, Result};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::chain::{HttpCheckClient, RpcChainProvider};
use crate::config::Config;
use crate::filter::{FilterPipeline, PipelineReport};
use crate::pool::program::RAYDIUM_LIQUIDITY_V4_PROGRAM_ID;
use crate::pool::{LiquidityStateV4, PoolDescriptor};

/// Evaluate one pool; returns whether it was admitted
pub async fn check(config: &Config, pool_id: &str, watch: bool, json: bool) -> Result<bool> {
    let pool_id = Pubkey::from_str(pool_id)
        .with_context(|| format!("Invalid pool address: {}", pool_id))?;

    let chain = Arc::new(RpcChainProvider::new(&config.rpc)?);
    let remote = Arc::new(HttpCheckClient::from_timeout_ms(config.filters.request_timeout_ms)?);

    let pool = load_pool(&chain, &pool_id).await?;
    info!(pool = %pool.id, mint = %pool.base_mint, "Pool loaded");

    let pipeline = FilterPipeline::from_config(&config.filters, chain, remote);
    if pipeline.is_empty() {
        warn!("No filters enabled, every pool is admitted");
    }

    let report = if watch {
        pipeline.watch(&pool, &config.watch).await?
    } else {
        pipeline.evaluate_detailed(&pool).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&pool, &report);
    }

    Ok(report.passed)
}

/// Fetch and decode a Raydium v4 pool account
async fn load_pool(chain: &RpcChainProvider, pool_id: &Pubkey) -> Result<PoolDescriptor> {
    let account = chain
        .client()
        .get_account(pool_id)
        .await
        .with_context(|| format!("Failed to fetch pool account {}", pool_id))?;

    if account.owner != RAYDIUM_LIQUIDITY_V4_PROGRAM_ID {
        warn!(owner = %account.owner, "Pool account is not owned by the Raydium v4 program");
    }

    let state = LiquidityStateV4::try_from_slice(&account.data)
        .with_context(|| format!("Pool account {} is not a liquidity state", pool_id))?;

    Ok(PoolDescriptor::from_liquidity_state(*pool_id, account.owner, &state)?)
}

fn print_report(pool: &PoolDescriptor, report: &PipelineReport) {
    println!("\n=== POOL CHECK ===\n");
    println!("Pool:       {}", pool.id);
    println!("Base mint:  {}", pool.base_mint);
    println!("Quote mint: {}", pool.quote_mint);
    println!();

    if report.outcomes.is_empty() {
        println!("(no filters enabled)");
    }

    for outcome in &report.outcomes {
        println!("  {:<18} {}", outcome.filter, outcome.verdict);
    }

    println!(
        "\nDecision: {} ({}ms)",
        if report.passed { "ADMIT" } else { "REJECT" },
        report.elapsed.as_millis()
    );
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
