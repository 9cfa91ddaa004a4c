//! Metadata mutability and socials checks

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, trace};

use crate::chain::{ChainDataProvider, RemoteCheckClient};
use crate::error::{Error, Result};
use crate::filter::{PoolFilter, Verdict};
use crate::pool::program::metadata_address;
use crate::pool::{PoolDescriptor, TokenMetadata};

pub struct MutableFilter {
    chain: Arc<dyn ChainDataProvider>,
    remote: Arc<dyn RemoteCheckClient>,
    check_mutable: bool,
    check_socials: bool,
}

impl MutableFilter {
    pub fn new(
        chain: Arc<dyn ChainDataProvider>,
        remote: Arc<dyn RemoteCheckClient>,
        check_mutable: bool,
        check_socials: bool,
    ) -> Self {
        Self {
            chain,
            remote,
            check_mutable,
            check_socials,
        }
    }

    async fn check(&self, pool: &PoolDescriptor) -> Result<Verdict> {
        let address = metadata_address(&pool.base_mint);
        let data = self
            .chain
            .account_data(&address)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("metadata {}", address)))?;
        let metadata = TokenMetadata::try_from_slice(&data)?;

        let mutable = self.check_mutable && metadata.is_mutable;
        let has_socials = if self.check_socials {
            self.has_socials(&metadata).await?
        } else {
            true
        };

        if !mutable && has_socials {
            return Ok(Verdict::pass());
        }

        let mut reasons = Vec::new();
        if mutable {
            reasons.push("metadata can be changed");
        }
        if !has_socials {
            reasons.push("has no socials");
        }

        Ok(Verdict::fail(format!("MutableSocials -> Token {}", reasons.join(" and ")))
            .with_data(json!({ "uri": metadata.uri(), "is_mutable": metadata.is_mutable })))
    }

    async fn has_socials(&self, metadata: &TokenMetadata) -> Result<bool> {
        let uri = metadata.uri();
        if uri.is_empty() {
            return Ok(false);
        }

        let document = self.remote.get_json(uri).await?;
        let found = has_social_links(&document);
        trace!(uri = %uri, found, "Checked metadata socials");
        Ok(found)
    }
}

/// True when the off-chain metadata lists at least one non-empty extension
fn has_social_links(document: &Value) -> bool {
    let Some(extensions) = document.get("extensions").and_then(Value::as_object) else {
        return false;
    };

    extensions.values().any(|value| match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    })
}

#[async_trait]
impl PoolFilter for MutableFilter {
    fn name(&self) -> &'static str {
        "mutable_socials"
    }

    async fn evaluate(&self, pool: &PoolDescriptor) -> Verdict {
        match self.check(pool).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(mint = %pool.base_mint, error = %e, "MutableSocials -> Failed to check token metadata");
                Verdict::fail(format!("MutableSocials -> Failed to check token metadata: {}", e))
            }
        }
    }
}
