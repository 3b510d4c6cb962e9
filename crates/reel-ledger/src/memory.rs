//! In-process ledger for tests and dry runs.

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;

use reel_models::ContentId;

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::PublicationLedger;

/// Ledger backed by an in-memory set. Not durable.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    ids: Mutex<BTreeSet<ContentId>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with ids.
    pub fn with_members<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = ContentId>,
    {
        Self {
            ids: Mutex::new(ids.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.lock().map(|ids| ids.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> LedgerResult<std::sync::MutexGuard<'_, BTreeSet<ContentId>>> {
        self.ids
            .lock()
            .map_err(|_| LedgerError::unavailable("memory ledger lock poisoned"))
    }
}

#[async_trait]
impl PublicationLedger for MemoryLedger {
    async fn contains(&self, id: &ContentId) -> LedgerResult<bool> {
        Ok(self.lock()?.contains(id))
    }

    async fn add(&self, id: &ContentId) -> LedgerResult<()> {
        self.lock()?.insert(id.clone());
        Ok(())
    }

    async fn members(&self) -> LedgerResult<Vec<ContentId>> {
        Ok(self.lock()?.iter().cloned().collect())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ContentId {
        ContentId::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_contains() {
        let ledger = MemoryLedger::new();
        assert!(!ledger.contains(&id("A")).await.unwrap());
        ledger.add(&id("A")).await.unwrap();
        assert!(ledger.contains(&id("A")).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let ledger = MemoryLedger::new();
        ledger.add(&id("A")).await.unwrap();
        ledger.add(&id("A")).await.unwrap();
        assert!(ledger.contains(&id("A")).await.unwrap());
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_members_lists_prepopulated() {
        let ledger = MemoryLedger::with_members([id("B"), id("A")]);
        let members = ledger.members().await.unwrap();
        assert_eq!(members, vec![id("A"), id("B")]);
    }
}
