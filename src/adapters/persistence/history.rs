//! Bet History Ledger - Append-only JSONL Records
//!
//! Persists bet history records to daily JSONL files in the format
//! `bets/YYYY-MM-DD.jsonl`. Each line is a self-contained JSON record.
//! All records are loaded into memory at startup; the order-id index
//! built from them is what makes `append` idempotent across restarts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::domain::selection::{BetHistoryRecord, StrategyRef};
use crate::ports::store::BetHistoryStore;

/// Append-only JSONL bet history with daily file rotation.
pub struct JsonlBetHistory {
    /// Base directory for bet files.
    bets_dir: PathBuf,
    /// All records, loaded at startup and appended to in step with
    /// the files.
    records: RwLock<Vec<BetHistoryRecord>>,
    /// Exchange order ids already recorded.
    order_index: RwLock<HashSet<String>>,
}

impl JsonlBetHistory {
    /// Open the ledger under the given data directory, loading all
    /// existing records.
    pub async fn open(data_dir: &str) -> Result<Self> {
        let bets_dir = Path::new(data_dir).join("bets");
        fs::create_dir_all(&bets_dir)
            .await
            .context("Failed to create bets directory")?;

        let records = Self::load_all(&bets_dir).await?;
        let order_index = records.iter().map(|r| r.order_id.clone()).collect();

        info!(
            records = records.len(),
            dir = %bets_dir.display(),
            "Bet history ledger loaded"
        );

        Ok(Self {
            bets_dir,
            records: RwLock::new(records),
            order_index: RwLock::new(order_index),
        })
    }

    /// Read every record from every daily file, skipping malformed
    /// lines rather than failing the whole load.
    async fn load_all(bets_dir: &Path) -> Result<Vec<BetHistoryRecord>> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(bets_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "jsonl") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            for line in content.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<BetHistoryRecord>(line) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        warn!(
                            file = %path.display(),
                            error = %e,
                            "Skipping malformed bet history record"
                        );
                    }
                }
            }
        }

        records.sort_by_key(|r| r.recorded_at);
        Ok(records)
    }

    async fn write_line(&self, record: &BetHistoryRecord) -> Result<()> {
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let path = self.bets_dir.join(format!("{date}.jsonl"));

        let mut json =
            serde_json::to_string(record).context("Failed to serialize bet history record")?;
        json.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open bet history file")?;

        file.write_all(json.as_bytes())
            .await
            .context("Failed to write bet history record")?;
        file.flush().await.context("Failed to flush bet history")?;

        Ok(())
    }
}

#[async_trait]
impl BetHistoryStore for JsonlBetHistory {
    #[instrument(skip(self, record), fields(order_id = %record.order_id))]
    async fn append(&self, record: &BetHistoryRecord) -> Result<()> {
        {
            let index = self.order_index.read().await;
            if index.contains(&record.order_id) {
                return Ok(());
            }
        }

        self.write_line(record).await?;

        // Index only after the durable write so a failed write is
        // retried rather than silently dropped.
        self.order_index.write().await.insert(record.order_id.clone());
        self.records.write().await.push(record.clone());

        Ok(())
    }

    async fn records_for(&self, strategy_ref: &StrategyRef) -> Result<Vec<BetHistoryRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| r.strategy_ref == *strategy_ref)
            .cloned()
            .collect())
    }

    async fn contains_order(&self, order_id: &str) -> Result<bool> {
        Ok(self.order_index.read().await.contains(order_id))
    }

    async fn is_healthy(&self) -> bool {
        let test_path = self.bets_dir.join(".health_check");
        let result = fs::write(&test_path, b"ok").await;
        let _ = fs::remove_file(&test_path).await;
        result.is_ok()
    }
}
