//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/tickers` - 티커 목록/상세/Fundamental
//! - `/api/v1/stats` - 수집 현황

pub mod health;
pub mod stats;
pub mod tickers;

pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use stats::{stats_router, StatsResponse, TickerCounts};
pub use tickers::{
    tickers_router, TickerDetailResponse, TickerListParams, TickerListResponse, TickerSummary,
};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/tickers", tickers_router())
        .nest("/api/v1/stats", stats_router())
}
