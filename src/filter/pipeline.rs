//! Filter pipeline
//!
//! Fans one pool out to every enabled filter, waits for all of them and
//! AND-reduces the verdicts. Nothing short-circuits: every failing
//! filter's message is wanted on rejection.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::chain::{ChainDataProvider, RemoteCheckClient};
use crate::config::{FilterConfig, WatchConfig};
use crate::error::Result;
use crate::filter::burn::BurnFilter;
use crate::filter::locked::LockedLiquidityFilter;
use crate::filter::market_cap::MarketCapWindowFilter;
use crate::filter::mutable::MutableFilter;
use crate::filter::pool_size::PoolSizeFilter;
use crate::filter::renounced::RenouncedFreezeFilter;
use crate::filter::risk_score::RemoteRiskScoreFilter;
use crate::filter::{PoolFilter, Verdict};
use crate::pool::PoolDescriptor;

/// One filter's verdict inside a report
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    pub filter: &'static str,
    pub verdict: Verdict,
}

/// Full result of one pipeline evaluation
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub pool: String,
    pub mint: String,
    pub passed: bool,
    pub outcomes: Vec<FilterOutcome>,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    pub evaluated_at: DateTime<Utc>,
}

impl PipelineReport {
    pub fn failures(&self) -> impl Iterator<Item = &FilterOutcome> {
        self.outcomes.iter().filter(|o| !o.verdict.is_ok())
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

/// Ordered set of filters built once and shared by all evaluations
pub struct FilterPipeline {
    filters: Vec<Arc<dyn PoolFilter>>,
    filter_timeout: Option<Duration>,
}

impl FilterPipeline {
    pub fn new(filters: Vec<Arc<dyn PoolFilter>>, filter_timeout: Option<Duration>) -> Self {
        Self {
            filters,
            filter_timeout,
        }
    }

    /// Build the enabled filters in their fixed order
    pub fn from_config(
        config: &FilterConfig,
        chain: Arc<dyn ChainDataProvider>,
        remote: Arc<dyn RemoteCheckClient>,
    ) -> Self {
        let mut filters: Vec<Arc<dyn PoolFilter>> = Vec::new();
        let attempt_timeout = config.attempt_timeout();

        if config.check_if_burned {
            filters.push(Arc::new(BurnFilter::new(chain.clone())));
        }

        if config.check_if_locked {
            filters.push(Arc::new(LockedLiquidityFilter::new(chain.clone())));
        }

        if config.rug_check.enabled {
            filters.push(Arc::new(RemoteRiskScoreFilter::rug_check(
                &config.rug_check,
                remote.clone(),
                attempt_timeout,
            )));
        }

        if config.solsniffer.enabled {
            filters.push(Arc::new(RemoteRiskScoreFilter::solsniffer(
                &config.solsniffer,
                remote.clone(),
                attempt_timeout,
            )));
        }

        if config.check_if_mint_is_renounced || config.check_if_freezable {
            filters.push(Arc::new(RenouncedFreezeFilter::new(
                chain.clone(),
                config.check_if_mint_is_renounced,
                config.check_if_freezable,
            )));
        }

        if config.check_if_mutable || config.check_if_socials {
            filters.push(Arc::new(MutableFilter::new(
                chain.clone(),
                remote.clone(),
                config.check_if_mutable,
                config.check_if_socials,
            )));
        }

        if PoolSizeFilter::is_bounded(config.min_pool_size, config.max_pool_size) {
            filters.push(Arc::new(PoolSizeFilter::new(
                chain.clone(),
                config.min_pool_size,
                config.max_pool_size,
            )));
        }

        if config.market_cap.enabled {
            filters.push(Arc::new(MarketCapWindowFilter::from_config(
                chain,
                &config.market_cap,
            )));
        }

        let filter_timeout = (config.filter_timeout_ms > 0)
            .then(|| Duration::from_millis(config.filter_timeout_ms));

        let pipeline = Self::new(filters, filter_timeout);
        info!(filters = ?pipeline.filter_names(), "Filter pipeline ready");
        pipeline
    }

    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Admit or reject a pool
    ///
    /// `Err` only for a descriptor that fails validation.
    pub async fn evaluate(&self, pool: &PoolDescriptor) -> Result<bool> {
        Ok(self.evaluate_detailed(pool).await?.passed)
    }

    /// Run every filter and return each verdict alongside the decision
    pub async fn evaluate_detailed(&self, pool: &PoolDescriptor) -> Result<PipelineReport> {
        pool.validate()?;

        let started = Instant::now();
        let evaluated_at = Utc::now();

        let outcomes: Vec<FilterOutcome> = join_all(self.filters.iter().map(|filter| async move {
            FilterOutcome {
                filter: filter.name(),
                verdict: self.run_filter(filter.as_ref(), pool).await,
            }
        }))
        .await;

        let passed = outcomes.iter().all(|o| o.verdict.is_ok());

        if !passed {
            for outcome in outcomes.iter().filter(|o| !o.verdict.is_ok()) {
                trace!(
                    mint = %pool.base_mint,
                    filter = outcome.filter,
                    "{}",
                    outcome.verdict.message().unwrap_or_default()
                );
                if let Some(data) = outcome.verdict.data() {
                    debug!(mint = %pool.base_mint, filter = outcome.filter, data = %data, "Filter diagnostics");
                }
            }
        }

        Ok(PipelineReport {
            pool: pool.id.to_string(),
            mint: pool.base_mint.to_string(),
            passed,
            outcomes,
            elapsed: started.elapsed(),
            evaluated_at,
        })
    }

    async fn run_filter(&self, filter: &dyn PoolFilter, pool: &PoolDescriptor) -> Verdict {
        let Some(limit) = self.filter_timeout else {
            return filter.evaluate(pool).await;
        };

        match tokio::time::timeout(limit, filter.evaluate(pool)).await {
            Ok(verdict) => verdict,
            Err(_) => {
                warn!(mint = %pool.base_mint, filter = filter.name(), timeout_ms = limit.as_millis() as u64, "Filter timed out");
                Verdict::fail(format!(
                    "{} -> timed out after {}ms",
                    filter.name(),
                    limit.as_millis()
                ))
            }
        }
    }

    /// Re-evaluate until enough consecutive passes or the watch expires
    ///
    /// Returns the last report; `passed` is true only when the streak was
    /// reached.
    pub async fn watch(&self, pool: &PoolDescriptor, config: &WatchConfig) -> Result<PipelineReport> {
        if config.interval_ms == 0 || config.duration_ms == 0 {
            return self.evaluate_detailed(pool).await;
        }

        let interval = Duration::from_millis(config.interval_ms);
        let rounds = config.duration_ms / config.interval_ms + 1;
        let needed = config.consecutive_matches.max(1);
        let mut streak = 0u32;
        let mut last = None;

        for round in 0..rounds {
            if round > 0 {
                tokio::time::sleep(interval).await;
            }

            let mut report = self.evaluate_detailed(pool).await?;

            if report.passed {
                streak += 1;
                debug!(mint = %pool.base_mint, streak, needed, "Filter match");
                if streak >= needed {
                    return Ok(report);
                }
                // A partial streak is not an admission
                report.passed = false;
            } else {
                streak = 0;
            }

            last = Some(report);
        }

        debug!(mint = %pool.base_mint, rounds, "Watch ended without enough matches");
        match last {
            Some(report) => Ok(report),
            None => self.evaluate_detailed(pool).await,
        }
    }
}
