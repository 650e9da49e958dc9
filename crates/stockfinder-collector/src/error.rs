//! 에러 타입 정의.

use stockfinder_core::CoreError;
use stockfinder_data::{DataError, EodhdError};
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 저장소 에러
    #[error("Database error: {0}")]
    Database(#[from] DataError),

    /// 데이터 소스 에러 (EODHD)
    #[error("Data source error: {0}")]
    DataSource(#[from] EodhdError),
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
