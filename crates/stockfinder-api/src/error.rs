//! API 에러 타입.
//!
//! 모든 엔드포인트는 같은 JSON 에러 형식을 사용합니다.
//!
//! ```json
//! {
//!   "code": "TICKER_NOT_FOUND",
//!   "message": "티커를 찾을 수 없습니다: AAPL.US"
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stockfinder_data::DataError;
use thiserror::Error;

/// API 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_SYMBOL", "NOT_FOUND", "STORE_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 상세 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// 상세 정보 추가.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// API 에러.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 잘못된 요청 (심볼 형식, 쿼리 파라미터)
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    /// 리소스 없음
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    /// 저장소 에러
    #[error("저장소 오류: {0}")]
    Store(#[from] DataError),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    /// HTTP 상태 코드
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 응답 본문
    pub fn body(&self) -> ApiErrorResponse {
        match self {
            Self::BadRequest { code, message } | Self::NotFound { code, message } => {
                ApiErrorResponse::new(*code, message.clone())
            }
            // 내부 에러 상세는 로그에만 남김
            Self::Store(_) => ApiErrorResponse::new("STORE_ERROR", "저장소 조회에 실패했습니다"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Store(e) = &self {
            tracing::error!(error = %e, "저장소 조회 실패");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;
