//! 도메인 모델.

pub mod checkpoint;
pub mod ticker;

pub use checkpoint::{
    CheckpointStatus, CollectorCheckpoint, FUNDAMENTAL_COLLECT_WORKFLOW, TICKER_SYNC_WORKFLOW,
};
pub use ticker::{format_symbol, parse_symbol, ExchangeInfo, TickerDescriptor, TickerRecord};
