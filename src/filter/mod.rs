//! Pool admission filters
//!
//! Every check implements [`PoolFilter`]. `evaluate` always resolves to a
//! [`Verdict`]: fetch, decode and network failures become failing verdicts
//! inside the filter and never reach the pipeline.

// Shared types and state
pub mod retry;
pub mod types;
pub mod window;

// Filters
pub mod burn;
pub mod locked;
pub mod market_cap;
pub mod mutable;
pub mod pool_size;
pub mod renounced;
pub mod risk_score;

pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

use crate::pool::PoolDescriptor;

pub use burn::BurnFilter;
pub use locked::LockedLiquidityFilter;
pub use market_cap::MarketCapWindowFilter;
pub use mutable::MutableFilter;
pub use pipeline::{FilterOutcome, FilterPipeline, PipelineReport};
pub use pool_size::PoolSizeFilter;
pub use renounced::RenouncedFreezeFilter;
pub use retry::RetryPolicy;
pub use risk_score::{RemoteRiskScoreFilter, RiskScoreFlavor, RugCheckFlavor, SolsnifferFlavor};
pub use types::Verdict;
pub use window::{WindowPhase, WindowTracker};

/// A single admission check
#[async_trait]
pub trait PoolFilter: Send + Sync {
    /// Stable name used in reports and logs
    fn name(&self) -> &'static str;

    /// Evaluate one pool; never fails
    async fn evaluate(&self, pool: &PoolDescriptor) -> Verdict;
}
