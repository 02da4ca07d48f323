//! Where portfolio mutations are acknowledged.
//!
//! The fund API only serves holdings, it does not accept changes. Mutations
//! therefore go through [`PortfolioStore`], whose acknowledgment the view
//! applies. [`LocalPortfolioStore`] acknowledges everything immediately and
//! keeps nothing, so edits live only as long as the session.

use crate::error::StoreError;
use crate::holding::PortfolioItem;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

#[async_trait]
pub trait PortfolioStore: Send + Sync {
    /// Records a new holding, returning it as stored.
    async fn create(&self, item: PortfolioItem) -> Result<PortfolioItem, StoreError>;

    /// Replaces the holding with the same id, returning it as stored.
    async fn update(&self, item: PortfolioItem) -> Result<PortfolioItem, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;

    /// Called with the holdings the fund API served, before they are shown.
    fn observe(&self, _items: &[PortfolioItem]) {}
}

/// Session-only store. It tracks which ids exist so that updates and deletes
/// of unknown holdings are rejected the way a server would.
#[derive(Debug, Default)]
pub struct LocalPortfolioStore {
    known: Mutex<HashSet<i64>>,
}

impl LocalPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioStore for LocalPortfolioStore {
    async fn create(&self, item: PortfolioItem) -> Result<PortfolioItem, StoreError> {
        self.known
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(item.id);
        tracing::info!(id = item.id, fund_code = %item.fund_code, "holding added (local only)");
        Ok(item)
    }

    async fn update(&self, item: PortfolioItem) -> Result<PortfolioItem, StoreError> {
        if !self
            .known
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&item.id)
        {
            return Err(StoreError::UnknownHolding(item.id));
        }
        tracing::info!(id = item.id, "holding updated (local only)");
        Ok(item)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        if !self
            .known
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
        {
            return Err(StoreError::UnknownHolding(id));
        }
        tracing::info!(id, "holding deleted (local only)");
        Ok(())
    }

    /// Makes served holdings known so they can be edited and deleted.
    fn observe(&self, items: &[PortfolioItem]) {
        let mut known = self.known.lock().unwrap_or_else(|e| e.into_inner());
        known.extend(items.iter().map(|item| item.id));
    }
}
