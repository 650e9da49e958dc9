//! 데이터 모듈 오류 타입.

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터베이스 연결 오류
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// 쿼리 실행 오류
    #[error("Query error: {0}")]
    QueryError(String),

    /// 중복 레코드
    #[error("Duplicate record: {0}")]
    DuplicateError(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// 잘못된 데이터 형식
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// 설정 오류
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 저장할 수 없는 Fundamental 데이터 (BSON 변환 실패, 문서 크기 초과)
    #[error("Rejected payload: {0}")]
    PayloadRejected(String),
}

impl DataError {
    /// 해당 레코드의 데이터 문제로 저장이 거부됐는지 여부.
    ///
    /// 저장소 연결과 무관하므로 호출자는 레코드 하나만 건너뛰면 됩니다.
    pub fn is_payload_rejected(&self) -> bool {
        matches!(self, Self::PayloadRejected(_))
    }
}

impl From<mongodb::error::Error> for DataError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            // MongoDB 고유 인덱스 위반
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == 11000 =>
            {
                DataError::DuplicateError(write_error.message.clone())
            }
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::Authentication { .. } => DataError::ConnectionError(err.to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<mongodb::bson::ser::Error> for DataError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for DataError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<stockfinder_core::CoreError> for DataError {
    fn from(err: stockfinder_core::CoreError) -> Self {
        DataError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
