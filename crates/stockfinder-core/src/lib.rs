//! # StockFinder Core
//!
//! StockFinder 수집기 전반에서 사용되는 기본 타입을 제공합니다:
//! - 티커 기술자/레코드, 거래소 정보
//! - 워크플로우 체크포인트
//! - 환경변수 기반 설정 헬퍼
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use domain::*;
pub use error::{CoreError, Result};
pub use logging::{init_logging, LogConfig, LogFormat};
