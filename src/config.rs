//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::filter::RetryPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Solana RPC connection
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_commitment")]
    pub commitment: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            commitment: default_commitment(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Which filters run and how
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub check_if_burned: bool,
    #[serde(default)]
    pub check_if_locked: bool,
    #[serde(default = "default_true")]
    pub check_if_mint_is_renounced: bool,
    #[serde(default)]
    pub check_if_freezable: bool,
    #[serde(default)]
    pub check_if_mutable: bool,
    #[serde(default)]
    pub check_if_socials: bool,
    /// Minimum quote-side liquidity (0 = no lower bound)
    #[serde(default)]
    pub min_pool_size: f64,
    /// Maximum quote-side liquidity (0 = no upper bound)
    #[serde(default)]
    pub max_pool_size: f64,
    /// Upper bound for one filter's evaluation (0 = unbounded)
    #[serde(default = "default_filter_timeout_ms")]
    pub filter_timeout_ms: u64,
    /// Upper bound for one remote query attempt (0 = unbounded)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub rug_check: RugCheckConfig,
    #[serde(default)]
    pub solsniffer: SolsnifferConfig,
    #[serde(default)]
    pub market_cap: MarketCapConfig,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            check_if_burned: true,
            check_if_locked: false,
            check_if_mint_is_renounced: true,
            check_if_freezable: false,
            check_if_mutable: false,
            check_if_socials: false,
            min_pool_size: 0.0,
            max_pool_size: 0.0,
            filter_timeout_ms: default_filter_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            rug_check: RugCheckConfig::default(),
            solsniffer: SolsnifferConfig::default(),
            market_cap: MarketCapConfig::default(),
        }
    }
}

impl FilterConfig {
    /// Bound for one remote query attempt
    pub fn attempt_timeout(&self) -> Option<Duration> {
        (self.request_timeout_ms > 0).then(|| Duration::from_millis(self.request_timeout_ms))
    }

    /// Enabled remote checks whose worst case reaches `filter_timeout_ms`
    pub fn remote_checks_outlasting_filter_bound(&self) -> Vec<(&'static str, Duration)> {
        if self.filter_timeout_ms == 0 {
            return Vec::new();
        }

        let bound = Duration::from_millis(self.filter_timeout_ms);
        let attempt_timeout = self.attempt_timeout();
        let checks = [
            ("rug_check", self.rug_check.enabled, self.rug_check.retry_policy(attempt_timeout)),
            ("solsniffer", self.solsniffer.enabled, self.solsniffer.retry_policy(attempt_timeout)),
        ];

        checks
            .into_iter()
            .filter(|(_, enabled, policy)| *enabled && policy.worst_case() >= bound)
            .map(|(name, _, policy)| (name, policy.worst_case()))
            .collect()
    }
}

/// api.rugcheck.xyz honeypot check
#[derive(Debug, Clone, Deserialize)]
pub struct RugCheckConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rugcheck_url")]
    pub base_url: String,
    /// Wait before the first query so the service can index the mint
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Scores at or below this are rejected
    #[serde(default = "default_rugcheck_min_score")]
    pub min_score: f64,
}

impl Default for RugCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_rugcheck_url(),
            wait_timeout_secs: default_wait_timeout_secs(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            min_score: default_rugcheck_min_score(),
        }
    }
}

impl RugCheckConfig {
    pub fn retry_policy(&self, attempt_timeout: Option<Duration>) -> RetryPolicy {
        RetryPolicy {
            initial_wait: Duration::from_secs(self.wait_timeout_secs),
            max_retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            attempt_timeout,
        }
    }
}

/// solsniffer.com honeypot check
#[derive(Debug, Clone, Deserialize)]
pub struct SolsnifferConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_solsniffer_url")]
    pub base_url: String,
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Scores below this are rejected
    #[serde(default = "default_solsniffer_min_score")]
    pub min_score: f64,
    /// More high-severity indicators than this are rejected
    #[serde(default = "default_max_high_indicators")]
    pub max_high_indicators: u64,
}

impl Default for SolsnifferConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_solsniffer_url(),
            wait_timeout_secs: default_wait_timeout_secs(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            min_score: default_solsniffer_min_score(),
            max_high_indicators: default_max_high_indicators(),
        }
    }
}

impl SolsnifferConfig {
    pub fn retry_policy(&self, attempt_timeout: Option<Duration>) -> RetryPolicy {
        RetryPolicy {
            initial_wait: Duration::from_secs(self.wait_timeout_secs),
            max_retries: self.retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            attempt_timeout,
        }
    }
}

/// Market cap must reach `target` within `time_window_secs` of first sight
#[derive(Debug, Clone, Deserialize)]
pub struct MarketCapConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Target in quote-token units
    #[serde(default)]
    pub target: f64,
    #[serde(default = "default_time_window_secs")]
    pub time_window_secs: u64,
}

impl Default for MarketCapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: 0.0,
            time_window_secs: default_time_window_secs(),
        }
    }
}

/// Repeated evaluation before admitting a pool
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_watch_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_watch_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_consecutive_matches")]
    pub consecutive_matches: u32,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_watch_interval_ms(),
            duration_ms: default_watch_duration_ms(),
            consecutive_matches: default_consecutive_matches(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rpc_endpoint() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_filter_timeout_ms() -> u64 {
    60_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_rugcheck_url() -> String {
    "https://api.rugcheck.xyz".to_string()
}

fn default_solsniffer_url() -> String {
    "https://solsniffer.com".to_string()
}

fn default_wait_timeout_secs() -> u64 {
    5
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_rugcheck_min_score() -> f64 {
    600.0
}

fn default_solsniffer_min_score() -> f64 {
    40.0
}

fn default_max_high_indicators() -> u64 {
    1
}

fn default_time_window_secs() -> u64 {
    60
}

fn default_watch_interval_ms() -> u64 {
    2000
}

fn default_watch_duration_ms() -> u64 {
    60_000
}

fn default_consecutive_matches() -> u32 {
    1
}

const COMMITMENTS: [&str; 3] = ["processed", "confirmed", "finalized"];

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("rpc.commitment", default_commitment())?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix POOL_GUARD__)
            .add_source(
                config::Environment::with_prefix("POOL_GUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_http_url("rpc.endpoint", &self.rpc.endpoint)?;

        if !COMMITMENTS.contains(&self.rpc.commitment.as_str()) {
            anyhow::bail!(
                "rpc.commitment must be one of {:?}, got '{}'",
                COMMITMENTS,
                self.rpc.commitment
            );
        }

        let filters = &self.filters;

        // Pool size bounds
        if filters.min_pool_size < 0.0 || filters.max_pool_size < 0.0 {
            anyhow::bail!("min_pool_size and max_pool_size cannot be negative");
        }

        if filters.min_pool_size > 0.0
            && filters.max_pool_size > 0.0
            && filters.min_pool_size > filters.max_pool_size
        {
            anyhow::bail!(
                "min_pool_size ({}) is greater than max_pool_size ({})",
                filters.min_pool_size,
                filters.max_pool_size
            );
        }

        if filters.rug_check.enabled {
            validate_http_url("filters.rug_check.base_url", &filters.rug_check.base_url)?;
        }

        if filters.solsniffer.enabled {
            validate_http_url("filters.solsniffer.base_url", &filters.solsniffer.base_url)?;
        }

        if filters.market_cap.enabled {
            if filters.market_cap.time_window_secs == 0 {
                anyhow::bail!("market_cap.time_window_secs must be positive when enabled");
            }
            if filters.market_cap.target <= 0.0 {
                anyhow::bail!("market_cap.target must be positive when enabled");
            }
        }

        // A filter bound shorter than a remote check's worst case cuts it off early
        for (name, worst_case) in filters.remote_checks_outlasting_filter_bound() {
            tracing::warn!(
                filter = name,
                filter_timeout_ms = filters.filter_timeout_ms,
                worst_case_ms = worst_case.as_millis() as u64,
                "filter_timeout_ms is shorter than the remote check's worst case"
            );
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        let filters = &self.filters;
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    commitment: {}
    timeout: {}ms
  Filters:
    burned: {}
    locked: {}
    renounced: {}
    freezable: {}
    mutable: {}
    socials: {}
    pool_size: {} - {}
    filter_timeout: {}ms
    request_timeout: {}ms
  RugCheck:
    enabled: {}
    url: {}
    wait: {}s, retries: {}, delay: {}ms
    min_score: {}
  SolSniffer:
    enabled: {}
    url: {}
    wait: {}s, retries: {}, delay: {}ms
    min_score: {}, max_high_indicators: {}
  Market Cap:
    enabled: {}
    target: {}
    window: {}s
  Watch:
    interval: {}ms
    duration: {}ms
    consecutive_matches: {}
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.commitment,
            self.rpc.timeout_ms,
            filters.check_if_burned,
            filters.check_if_locked,
            filters.check_if_mint_is_renounced,
            filters.check_if_freezable,
            filters.check_if_mutable,
            filters.check_if_socials,
            filters.min_pool_size,
            filters.max_pool_size,
            filters.filter_timeout_ms,
            filters.request_timeout_ms,
            filters.rug_check.enabled,
            mask_url(&filters.rug_check.base_url),
            filters.rug_check.wait_timeout_secs,
            filters.rug_check.retries,
            filters.rug_check.retry_delay_ms,
            filters.rug_check.min_score,
            filters.solsniffer.enabled,
            mask_url(&filters.solsniffer.base_url),
            filters.solsniffer.wait_timeout_secs,
            filters.solsniffer.retries,
            filters.solsniffer.retry_delay_ms,
            filters.solsniffer.min_score,
            filters.solsniffer.max_high_indicators,
            filters.market_cap.enabled,
            filters.market_cap.target,
            filters.market_cap.time_window_secs,
            self.watch.interval_ms,
            self.watch.duration_ms,
            self.watch.consecutive_matches,
        )
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value).with_context(|| format!("Invalid {}: {}", field, value))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{} must be an http(s) URL, got {}", field, value);
    }
    Ok(())
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}
