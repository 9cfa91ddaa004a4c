//! Honeypot checks backed by remote risk-scoring services
//!
//! Both services share one protocol: wait for the service to index the
//! mint, query it, retry only while no usable answer comes back. A report
//! that parses is authoritative, good score or bad.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::chain::RemoteCheckClient;
use crate::config::{RugCheckConfig, SolsnifferConfig};
use crate::error::Error;
use crate::filter::retry::RetryPolicy;
use crate::filter::{PoolFilter, Verdict};
use crate::pool::PoolDescriptor;

/// How one risk service is queried and read
pub trait RiskScoreFlavor: Send + Sync {
    /// Filter name in pipeline reports
    fn name(&self) -> &'static str;

    /// Prefix of every verdict message
    fn label(&self) -> &'static str;

    fn report_url(&self, mint: &Pubkey) -> String;

    /// Read a report; `None` when it lacks the expected fields
    fn interpret(&self, report: &Value) -> Option<Verdict>;
}

pub struct RemoteRiskScoreFilter<F> {
    flavor: F,
    remote: Arc<dyn RemoteCheckClient>,
    policy: RetryPolicy,
}

impl<F: RiskScoreFlavor> RemoteRiskScoreFilter<F> {
    pub fn new(flavor: F, remote: Arc<dyn RemoteCheckClient>, policy: RetryPolicy) -> Self {
        Self {
            flavor,
            remote,
            policy,
        }
    }
}

impl RemoteRiskScoreFilter<RugCheckFlavor> {
    pub fn rug_check(
        config: &RugCheckConfig,
        remote: Arc<dyn RemoteCheckClient>,
        attempt_timeout: Option<Duration>,
    ) -> Self {
        let policy = config.retry_policy(attempt_timeout);
        let flavor = RugCheckFlavor::new(&config.base_url, config.min_score);
        Self::new(flavor, remote, policy)
    }
}

impl RemoteRiskScoreFilter<SolsnifferFlavor> {
    pub fn solsniffer(
        config: &SolsnifferConfig,
        remote: Arc<dyn RemoteCheckClient>,
        attempt_timeout: Option<Duration>,
    ) -> Self {
        let policy = config.retry_policy(attempt_timeout);
        let flavor = SolsnifferFlavor {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            min_score: config.min_score,
            max_high_indicators: config.max_high_indicators,
        };
        Self::new(flavor, remote, policy)
    }
}

#[async_trait]
impl<F: RiskScoreFlavor> PoolFilter for RemoteRiskScoreFilter<F> {
    fn name(&self) -> &'static str {
        self.flavor.name()
    }

    async fn evaluate(&self, pool: &PoolDescriptor) -> Verdict {
        let url = self.flavor.report_url(&pool.base_mint);
        let label = self.flavor.label();
        let remote = &self.remote;
        let flavor = &self.flavor;
        let query_url = url.as_str();

        let outcome = self
            .policy
            .run(label, move || async move {
                let report = remote.get_json(query_url).await?;
                flavor.interpret(&report).ok_or_else(|| {
                    Error::Serialization(format!("{} returned no usable report", query_url))
                })
            })
            .await;

        match outcome {
            Ok(verdict) => {
                debug!(mint = %pool.base_mint, check = label, ok = verdict.is_ok(), "Risk report received");
                verdict
            }
            Err(e) => {
                error!(mint = %pool.base_mint, check = label, error = %e, attempts = self.policy.max_attempts(), "Risk check gave up");
                Verdict::fail(format!("{} -> failed exceeded number of retries", label)).with_data(json!({
                    "attempts": self.policy.max_attempts(),
                    "last_error": e.to_string(),
                }))
            }
        }
    }
}

/// api.rugcheck.xyz report summary: higher is safer
pub struct RugCheckFlavor {
    base_url: String,
    min_score: f64,
}

#[derive(Debug, Deserialize)]
struct RugCheckSummary {
    score: f64,
}

impl RugCheckFlavor {
    pub fn new(base_url: &str, min_score: f64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            min_score,
        }
    }
}

impl RiskScoreFlavor for RugCheckFlavor {
    fn name(&self) -> &'static str {
        "rug_check"
    }

    fn label(&self) -> &'static str {
        "Honeypot RugCheck"
    }

    fn report_url(&self, mint: &Pubkey) -> String {
        format!("{}/v1/tokens/{}/report/summary", self.base_url, mint)
    }

    fn interpret(&self, report: &Value) -> Option<Verdict> {
        let summary = RugCheckSummary::deserialize(report).ok()?;

        if summary.score > self.min_score {
            return Some(Verdict::pass().with_data(json!(summary.score)));
        }

        Some(
            Verdict::fail(format!(
                "{} -> rug score: {} < {}",
                self.label(),
                summary.score,
                self.min_score
            ))
            .with_data(json!(summary.score)),
        )
    }
}

/// solsniffer.com suggestion: score plus severity-bucketed indicators
pub struct SolsnifferFlavor {
    base_url: String,
    min_score: f64,
    max_high_indicators: u64,
}

#[derive(Debug, Deserialize)]
struct SnifferSuggestion {
    data: Vec<SnifferEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnifferEntry {
    score: f64,
    indicator_data: SnifferIndicators,
}

#[derive(Debug, Deserialize)]
struct SnifferIndicators {
    high: SeverityBucket,
}

#[derive(Debug, Deserialize)]
struct SeverityBucket {
    count: u64,
}

impl RiskScoreFlavor for SolsnifferFlavor {
    fn name(&self) -> &'static str {
        "solsniffer"
    }

    fn label(&self) -> &'static str {
        "Honeypot SolSniffer"
    }

    fn report_url(&self, mint: &Pubkey) -> String {
        format!("{}/api/v1/sniffer/suggestion/{}", self.base_url, mint)
    }

    fn interpret(&self, report: &Value) -> Option<Verdict> {
        let suggestion = SnifferSuggestion::deserialize(report).ok()?;
        let entry = suggestion.data.first()?;
        let high_count = entry.indicator_data.high.count;
        let raw_entry = report["data"][0].clone();

        let data = json!({
            "score": entry.score,
            "high_count": high_count,
            "report": raw_entry,
        });

        if entry.score < self.min_score || high_count > self.max_high_indicators {
            return Some(
                Verdict::fail(format!(
                    "{} -> score: {}, high risk indicators: {}",
                    self.label(),
                    entry.score,
                    high_count
                ))
                .with_data(data),
            );
        }

        Some(Verdict::pass().with_data(data))
    }
}
