//! 인메모리 저장소.
//!
//! MongoDB 없이 수집기를 실행하거나 테스트할 때 사용합니다.
//! MongoDB 구현과 동일한 계약(유일성, `seq` 순서, 원자적 fetched 마킹)을 따릅니다.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use stockfinder_core::{CollectorCheckpoint, TickerDescriptor, TickerRecord};
use tokio::sync::RwLock;

use super::{CheckpointStore, TickerQuery, TickerStore, UpsertSummary};
use crate::Result;

#[derive(Debug, Default)]
struct Inner {
    tickers: HashMap<(String, String), TickerRecord>,
    checkpoints: BTreeMap<String, CollectorCheckpoint>,
    next_seq: i64,
}

/// 인메모리 티커/체크포인트 저장소.
///
/// `Clone`은 같은 데이터를 공유합니다.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `seq` 순으로 정렬된 전체 레코드 (Fundamental 포함).
    pub async fn snapshot(&self) -> Vec<TickerRecord> {
        let inner = self.inner.read().await;
        let mut records: Vec<_> = inner.tickers.values().cloned().collect();
        records.sort_by_key(|r| r.seq);
        records
    }
}

#[async_trait]
impl TickerStore for MemoryStore {
    async fn upsert_tickers(&self, descriptors: &[TickerDescriptor]) -> Result<UpsertSummary> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let mut summary = UpsertSummary::default();

        for descriptor in descriptors {
            let key = (descriptor.code.clone(), descriptor.exchange.clone());
            if inner.tickers.contains_key(&key) {
                summary.existing += 1;
                continue;
            }
            inner.next_seq += 1;
            let seq = inner.next_seq;
            inner.tickers.insert(
                key,
                TickerRecord::from_descriptor(descriptor.clone(), seq, now),
            );
            summary.inserted += 1;
        }

        Ok(summary)
    }

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.inner.read().await.tickers.is_empty())
    }

    async fn next_unfetched_batch(
        &self,
        limit: usize,
        after_seq: Option<i64>,
    ) -> Result<Vec<TickerRecord>> {
        let inner = self.inner.read().await;
        let mut batch: Vec<_> = inner
            .tickers
            .values()
            .filter(|r| !r.fundamentals_fetched)
            .filter(|r| after_seq.map_or(true, |after| r.seq > after))
            .map(TickerRecord::without_fundamentals)
            .collect();
        batch.sort_by_key(|r| r.seq);
        batch.truncate(limit);
        Ok(batch)
    }

    async fn mark_fetched(
        &self,
        code: &str,
        exchange: &str,
        fundamentals: serde_json::Value,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let key = (code.to_string(), exchange.to_string());
        match inner.tickers.get_mut(&key) {
            Some(record) if !record.fundamentals_fetched => {
                let now = Utc::now();
                record.fundamentals = Some(fundamentals);
                record.fundamentals_fetched = true;
                record.fetched_at = Some(now);
                record.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get_ticker(&self, code: &str, exchange: &str) -> Result<Option<TickerRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tickers
            .get(&(code.to_string(), exchange.to_string()))
            .cloned())
    }

    async fn list_tickers(&self, query: &TickerQuery) -> Result<Vec<TickerRecord>> {
        let inner = self.inner.read().await;
        let mut records: Vec<_> = inner
            .tickers
            .values()
            .filter(|r| query.matches(r))
            .map(TickerRecord::without_fundamentals)
            .collect();
        records.sort_by_key(|r| r.seq);
        Ok(records
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn count_tickers(&self, fetched: Option<bool>) -> Result<u64> {
        let inner = self.inner.read().await;
        let count = inner
            .tickers
            .values()
            .filter(|r| fetched.map_or(true, |f| r.fundamentals_fetched == f))
            .count();
        Ok(count as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for MemoryStore {
    async fn save_checkpoint(&self, checkpoint: &CollectorCheckpoint) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .checkpoints
            .insert(checkpoint.workflow.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load_checkpoint(&self, workflow: &str) -> Result<Option<CollectorCheckpoint>> {
        Ok(self.inner.read().await.checkpoints.get(workflow).cloned())
    }

    async fn list_checkpoints(&self) -> Result<Vec<CollectorCheckpoint>> {
        Ok(self
            .inner
            .read()
            .await
            .checkpoints
            .values()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockfinder_core::{CheckpointStatus, FUNDAMENTAL_COLLECT_WORKFLOW};

    fn descriptors(codes: &[&str]) -> Vec<TickerDescriptor> {
        codes
            .iter()
            .map(|c| TickerDescriptor::new(*c, "US").with_country("USA"))
            .collect()
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = MemoryStore::new();
        assert!(store.is_empty().await.unwrap());

        let summary = store
            .upsert_tickers(&descriptors(&["AAPL", "MSFT"]))
            .await
            .unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.existing, 0);

        let summary = store
            .upsert_tickers(&descriptors(&["MSFT", "GOOG"]))
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.existing, 1);

        assert_eq!(store.count_tickers(None).await.unwrap(), 3);
        assert!(!store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_preserves_fetched_state() {
        let store = MemoryStore::new();
        store.upsert_tickers(&descriptors(&["AAPL"])).await.unwrap();
        assert!(store
            .mark_fetched("AAPL", "US", json!({"General": {}}))
            .await
            .unwrap());

        store.upsert_tickers(&descriptors(&["AAPL"])).await.unwrap();

        let record = store.get_ticker("AAPL", "US").await.unwrap().unwrap();
        assert!(record.fundamentals_fetched);
        assert!(record.fundamentals.is_some());
    }

    #[tokio::test]
    async fn test_batch_order_and_cursor() {
        let store = MemoryStore::new();
        store
            .upsert_tickers(&descriptors(&["A", "B", "C", "D"]))
            .await
            .unwrap();

        let batch = store.next_unfetched_batch(2, None).await.unwrap();
        let codes: Vec<_> = batch.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["A", "B"]);

        let after = batch.last().map(|r| r.seq);
        let batch = store.next_unfetched_batch(10, after).await.unwrap();
        let codes: Vec<_> = batch.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["C", "D"]);
    }

    #[tokio::test]
    async fn test_mark_fetched_removes_from_batch() {
        let store = MemoryStore::new();
        store
            .upsert_tickers(&descriptors(&["A", "B"]))
            .await
            .unwrap();

        assert!(store.mark_fetched("A", "US", json!({"x": 1})).await.unwrap());
        // 두 번째 마킹은 무시
        assert!(!store.mark_fetched("A", "US", json!({"x": 2})).await.unwrap());
        // 없는 티커
        assert!(!store.mark_fetched("Z", "US", json!({})).await.unwrap());

        let batch = store.next_unfetched_batch(10, None).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].code, "B");

        let record = store.get_ticker("A", "US").await.unwrap().unwrap();
        assert_eq!(record.fundamentals, Some(json!({"x": 1})));
        assert!(record.fetched_at.is_some());

        assert_eq!(store.count_tickers(Some(true)).await.unwrap(), 1);
        assert_eq!(store.count_tickers(Some(false)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_tickers_paging_without_fundamentals() {
        let store = MemoryStore::new();
        store
            .upsert_tickers(&descriptors(&["A", "B", "C"]))
            .await
            .unwrap();
        store.mark_fetched("B", "US", json!({"x": 1})).await.unwrap();

        let page = store
            .list_tickers(&TickerQuery {
                limit: 2,
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        let codes: Vec<_> = page.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, ["B", "C"]);
        assert!(page.iter().all(|r| r.fundamentals.is_none()));

        let fetched = store
            .list_tickers(&TickerQuery {
                fetched: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].code, "B");
    }

    #[tokio::test]
    async fn test_checkpoint_overwrite() {
        let store = MemoryStore::new();
        assert!(store
            .load_checkpoint(FUNDAMENTAL_COLLECT_WORKFLOW)
            .await
            .unwrap()
            .is_none());

        let mut cp =
            CollectorCheckpoint::new(FUNDAMENTAL_COLLECT_WORKFLOW, CheckpointStatus::Running);
        store.save_checkpoint(&cp).await.unwrap();

        cp.status = CheckpointStatus::Idle;
        cp.total_processed = 42;
        store.save_checkpoint(&cp).await.unwrap();

        let loaded = store
            .load_checkpoint(FUNDAMENTAL_COLLECT_WORKFLOW)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.status, CheckpointStatus::Idle);
        assert_eq!(loaded.total_processed, 42);
        assert_eq!(store.list_checkpoints().await.unwrap().len(), 1);
    }
}
