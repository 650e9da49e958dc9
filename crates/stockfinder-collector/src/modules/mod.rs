//! 데이터 수집 모듈.

pub mod checkpoint;
pub mod fundamental_collect;
pub mod ticker_sync;

pub use fundamental_collect::{
    collect_fundamentals, CollectorState, FundamentalCollector, RunMode,
};
pub use ticker_sync::{ensure_tickers, needs_sync, sync_tickers, TickerSyncOptions};
