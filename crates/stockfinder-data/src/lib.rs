//! 데이터 소스 및 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - EODHD API 클라이언트 (거래소/티커 목록, Fundamental, 잔여 호출 수)
//! - 티커 저장소 및 체크포인트 저장소 trait
//! - MongoDB 구현과 인메모리 구현

pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

// Provider 재내보내기
pub use provider::{EodhdClient, EodhdError, MarketDataProvider};

// 저장소 재내보내기
pub use storage::memory::MemoryStore;
pub use storage::mongo::{MongoConfig, MongoStore};
pub use storage::{CheckpointStore, TickerQuery, TickerStore, UpsertSummary};
