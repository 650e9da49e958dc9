//! 저장소 모듈.
//!
//! - [`TickerStore`]: 티커 레코드 저장소 (수집 진행 상태 = fetched 마커)
//! - [`CheckpointStore`]: 워크플로우 체크포인트 저장소
//!
//! 구현체:
//! - [`mongo::MongoStore`]: MongoDB (운영)
//! - [`memory::MemoryStore`]: 프로세스 메모리 (테스트, 로컬 실행)

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stockfinder_core::{CollectorCheckpoint, TickerDescriptor, TickerRecord};

use crate::Result;

/// 목록 조회 기본 개수
pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// 티커 upsert 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertSummary {
    /// 새로 추가된 티커 수
    pub inserted: usize,
    /// 이미 존재해 건너뛴 티커 수
    pub existing: usize,
}

/// 티커 목록 조회 조건.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerQuery {
    pub country: Option<String>,
    pub exchange: Option<String>,
    /// Fundamental 수집 여부 필터
    pub fetched: Option<bool>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for TickerQuery {
    fn default() -> Self {
        Self {
            country: None,
            exchange: None,
            fetched: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl TickerQuery {
    /// 레코드가 필터 조건을 만족하는지 확인
    pub fn matches(&self, record: &TickerRecord) -> bool {
        self.country
            .as_ref()
            .map_or(true, |c| record.country.as_deref() == Some(c.as_str()))
            && self.exchange.as_ref().map_or(true, |e| &record.exchange == e)
            && self
                .fetched
                .map_or(true, |f| record.fundamentals_fetched == f)
    }
}

/// 티커 저장소 trait.
///
/// 레코드는 `(code, exchange)`당 하나이며, 시스템이 삭제하지 않습니다.
#[async_trait]
pub trait TickerStore: Send + Sync {
    /// 티커 추가 (이미 있는 티커는 그대로 둠).
    ///
    /// 새 레코드는 미수집 상태와 증가하는 `seq`를 받습니다.
    async fn upsert_tickers(&self, descriptors: &[TickerDescriptor]) -> Result<UpsertSummary>;

    /// 저장된 티커가 하나도 없는지 확인.
    async fn is_empty(&self) -> Result<bool>;

    /// 미수집 티커를 `seq` 오름차순으로 최대 `limit`개 조회.
    ///
    /// `after_seq`가 주어지면 그보다 큰 `seq`만 반환합니다 (패스 커서).
    async fn next_unfetched_batch(
        &self,
        limit: usize,
        after_seq: Option<i64>,
    ) -> Result<Vec<TickerRecord>>;

    /// Fundamental 저장과 수집 완료 마킹을 단일 레코드 원자 연산으로 수행.
    ///
    /// 실제로 마킹했으면 `true`, 이미 수집됐거나 티커가 없으면 `false`.
    async fn mark_fetched(
        &self,
        code: &str,
        exchange: &str,
        fundamentals: serde_json::Value,
    ) -> Result<bool>;

    /// 단일 티커 조회 (Fundamental 포함).
    async fn get_ticker(&self, code: &str, exchange: &str) -> Result<Option<TickerRecord>>;

    /// 티커 목록 조회 (`seq` 순, Fundamental 제외).
    async fn list_tickers(&self, query: &TickerQuery) -> Result<Vec<TickerRecord>>;

    /// 티커 수 (`fetched`로 필터 가능).
    async fn count_tickers(&self, fetched: Option<bool>) -> Result<u64>;

    /// 저장소 연결 확인.
    async fn ping(&self) -> Result<()>;
}

/// 체크포인트 저장소 trait.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// 체크포인트 저장 (워크플로우당 하나, 덮어씀).
    async fn save_checkpoint(&self, checkpoint: &CollectorCheckpoint) -> Result<()>;

    /// 체크포인트 로드.
    async fn load_checkpoint(&self, workflow: &str) -> Result<Option<CollectorCheckpoint>>;

    /// 전체 체크포인트 (워크플로우 이름 순).
    async fn list_checkpoints(&self) -> Result<Vec<CollectorCheckpoint>>;
}
