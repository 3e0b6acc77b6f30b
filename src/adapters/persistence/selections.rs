//! In-memory Selection Store
//!
//! `SelectionStore` implementation backed by a map. The production
//! source-of-record is the upstream strategy database; this store
//! stands in for it in paper mode and in tests, applying the same
//! write semantics the upstream rows get.

use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::selection::{InvalidationReason, Selection, StrategyRef};
use crate::ports::store::SelectionStore;

/// Map-backed selection store keyed by `unique_id`.
#[derive(Default)]
pub struct InMemorySelectionStore {
    selections: RwLock<HashMap<StrategyRef, Selection>>,
}

impl InMemorySelectionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace selections wholesale, as the upstream
    /// strategy would.
    pub async fn seed(&self, selections: Vec<Selection>) {
        let mut map = self.selections.write().await;
        for selection in selections {
            map.insert(selection.unique_id.clone(), selection);
        }
    }

    /// Update the live snapshot on one selection, as the upstream
    /// market feed would between cycles.
    pub async fn update_snapshot(
        &self,
        unique_id: &str,
        snapshot: crate::domain::selection::MarketSnapshot,
    ) {
        let mut map = self.selections.write().await;
        if let Some(selection) = map.get_mut(unique_id) {
            selection.snapshot = snapshot;
        }
    }

    /// Read one selection back, bookkeeping included.
    pub async fn get(&self, unique_id: &str) -> Option<Selection> {
        self.selections.read().await.get(unique_id).cloned()
    }
}

#[async_trait]
impl SelectionStore for InMemorySelectionStore {
    /// A selection leaves the active batch once it is invalid and
    /// needs nothing further: either already cashed out, or carrying a
    /// reason that never cashes out.
    async fn fetch_active_selections(&self) -> Result<Vec<Selection>> {
        let map = self.selections.read().await;
        let mut batch: Vec<Selection> = map
            .values()
            .filter(|s| {
                if s.valid {
                    return true;
                }
                if s.cashed_out {
                    return false;
                }
                s.invalidated_reason
                    .as_deref()
                    .and_then(InvalidationReason::parse)
                    .is_some_and(InvalidationReason::wants_cash_out)
            })
            .cloned()
            .collect();

        // Transient per-cycle flags never survive a fresh read.
        for selection in &mut batch {
            selection.cash_out_queued = false;
            selection.newly_invalidated = false;
        }

        batch.sort_by(|a, b| a.unique_id.cmp(&b.unique_id));
        Ok(batch)
    }

    async fn upsert_bookkeeping(&self, selection: &Selection) -> Result<()> {
        let mut map = self.selections.write().await;
        let Some(row) = map.get_mut(&selection.unique_id) else {
            bail!("Unknown selection: {}", selection.unique_id);
        };
        row.size_matched = selection.size_matched;
        row.average_price_matched = selection.average_price_matched;
        row.fully_matched = selection.fully_matched;
        row.processed_at = selection.processed_at;
        Ok(())
    }

    async fn mark_invalidated(
        &self,
        unique_id: &StrategyRef,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut map = self.selections.write().await;
        let Some(row) = map.get_mut(unique_id) else {
            bail!("Unknown selection: {unique_id}");
        };
        if row.valid {
            row.valid = false;
            row.invalidated_at = Some(at);
            row.invalidated_reason = Some(reason.to_string());
        }
        Ok(())
    }

    async fn mark_cashed_out(&self, unique_id: &StrategyRef) -> Result<()> {
        let mut map = self.selections.write().await;
        let Some(row) = map.get_mut(unique_id) else {
            bail!("Unknown selection: {unique_id}");
        };
        row.cashed_out = true;
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
