//! StockFinder data collector.
//!
//! 이 crate는 EODHD에서 데이터를 수집해 MongoDB에 저장하는 바이너리를 제공합니다:
//! - 티커 목록 동기화 (거래소 목록 → 국가 필터 → 거래소별 티커)
//! - Fundamental 데이터 수집 (배치 재개, Rate limit 대기)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::CollectorConfig;
pub use error::{CollectorError, Result};
pub use stats::{CollectionStats, TickerSyncStats};
