//! Pool Guard Library
//!
//! Admission-control pipeline for newly discovered Raydium liquidity pools.

pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod pool;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use filter::{FilterPipeline, PoolFilter, Verdict};
pub use pool::PoolDescriptor;
