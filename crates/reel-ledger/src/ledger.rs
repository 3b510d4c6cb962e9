//! Ledger trait and backend selection.

use async_trait::async_trait;
use tracing::info;

use reel_models::ContentId;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::redis_store::RedisLedger;
use crate::rest::RestLedger;

/// Persistent set of content ids that have already been published.
#[async_trait]
pub trait PublicationLedger: Send + Sync {
    /// Whether the id has been recorded.
    ///
    /// An error means "unknown", never "not present".
    async fn contains(&self, id: &ContentId) -> LedgerResult<bool>;

    /// Record the id. Adding an id that is already present is a no-op.
    async fn add(&self, id: &ContentId) -> LedgerResult<()>;

    /// List every recorded id.
    async fn members(&self) -> LedgerResult<Vec<ContentId>>;

    /// Short backend name for logs and metrics.
    fn backend(&self) -> &'static str;
}

/// Build the backend selected by the configured URL scheme.
pub fn connect(config: &LedgerConfig) -> LedgerResult<Box<dyn PublicationLedger>> {
    if config.is_native_redis() {
        info!(set = %config.set_key, "Using native Redis ledger");
        return Ok(Box::new(RedisLedger::new(config)?));
    }

    if config.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
        return Err(LedgerError::config(
            "REST ledger requires a bearer token",
        ));
    }

    info!(set = %config.set_key, "Using REST ledger");
    Ok(Box::new(RestLedger::new(config)?))
}

/// Convert raw set members into ids, skipping empty entries.
pub(crate) fn members_to_ids(raw: Vec<String>) -> Vec<ContentId> {
    let mut ids: Vec<ContentId> = raw.into_iter().filter_map(|m| ContentId::new(m).ok()).collect();
    ids.sort();
    ids
}
