//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑되어 여러 요청 간에 공유됩니다.
//! API는 읽기 전용이므로 저장소에 쓰지 않습니다.

use std::sync::Arc;

use stockfinder_data::{CheckpointStore, TickerStore};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 티커 저장소
    pub tickers: Arc<dyn TickerStore>,

    /// 체크포인트 저장소
    pub checkpoints: Arc<dyn CheckpointStore>,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 저장소 하나로 상태 생성.
    pub fn new<S>(store: S) -> Self
    where
        S: TickerStore + CheckpointStore + 'static,
    {
        let store = Arc::new(store);
        Self {
            tickers: store.clone(),
            checkpoints: store,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임 (초)
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.tickers.ping().await.is_ok()
    }
}

/// 테스트용 상태 (빈 인메모리 저장소).
#[cfg(test)]
pub fn create_test_state() -> AppState {
    AppState::new(stockfinder_data::MemoryStore::new())
}
