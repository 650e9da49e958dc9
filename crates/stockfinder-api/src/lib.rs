//! StockFinder 읽기 전용 REST API.
//!
//! 수집기가 저장한 티커와 Fundamental 데이터를 조회합니다.
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`error`]: JSON 에러 응답
//! - [`config`]: 서버 설정

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use routes::*;
pub use state::AppState;
