//! Native Redis backend.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use reel_models::ContentId;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{members_to_ids, PublicationLedger};
use crate::metrics::record_request;

const BACKEND: &str = "redis";

/// Ledger stored in a Redis set, accessed over the Redis protocol.
pub struct RedisLedger {
    client: redis::Client,
    set_key: String,
    timeout: Duration,
}

impl RedisLedger {
    /// Create a new Redis ledger. No connection is opened until first use.
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        let client = redis::Client::open(config.url.trim())
            .map_err(|e| LedgerError::config(format!("invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            set_key: config.set_key.clone(),
            timeout: config.timeout,
        })
    }

    async fn connection(&self) -> LedgerResult<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// Run one operation under the configured timeout, recording metrics.
    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> LedgerResult<T>
    where
        F: Future<Output = LedgerResult<T>>,
    {
        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout(self.timeout.as_secs())),
        };
        record_request(
            BACKEND,
            operation,
            result.is_ok(),
            started.elapsed().as_secs_f64() * 1000.0,
        );

        if let Err(ref e) = result {
            warn!(operation, error = %e, "Ledger request failed");
        }
        result
    }
}

#[async_trait]
impl PublicationLedger for RedisLedger {
    async fn contains(&self, id: &ContentId) -> LedgerResult<bool> {
        let present = self
            .timed("contains", async {
                let mut conn = self.connection().await?;
                let present: bool = conn.sismember(&self.set_key, id.as_str()).await?;
                Ok(present)
            })
            .await?;
        debug!(content_id = %id, present, "Ledger membership check");
        Ok(present)
    }

    async fn add(&self, id: &ContentId) -> LedgerResult<()> {
        let added = self
            .timed("add", async {
                let mut conn = self.connection().await?;
                let added: i64 = conn.sadd(&self.set_key, id.as_str()).await?;
                Ok(added)
            })
            .await?;
        debug!(content_id = %id, newly_added = added == 1, "Ledger insert");
        Ok(())
    }

    async fn members(&self) -> LedgerResult<Vec<ContentId>> {
        let raw = self
            .timed("members", async {
                let mut conn = self.connection().await?;
                let raw: Vec<String> = conn.smembers(&self.set_key).await?;
                Ok(raw)
            })
            .await?;
        Ok(members_to_ids(raw))
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}
