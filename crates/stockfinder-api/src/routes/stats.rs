//! 수집 현황 endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use stockfinder_core::CollectorCheckpoint;

use crate::error::ApiResult;
use crate::state::AppState;

/// 티커 수집 현황
#[derive(Debug, Serialize, Deserialize)]
pub struct TickerCounts {
    pub total: u64,
    pub fetched: u64,
    pub unfetched: u64,
}

/// 수집 현황 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub tickers: TickerCounts,
    pub checkpoints: Vec<CollectorCheckpoint>,
}

/// 수집 현황 조회.
///
/// GET /api/v1/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatsResponse>> {
    let total = state.tickers.count_tickers(None).await?;
    let fetched = state.tickers.count_tickers(Some(true)).await?;
    let checkpoints = state.checkpoints.list_checkpoints().await?;

    Ok(Json(StatsResponse {
        tickers: TickerCounts {
            total,
            fetched,
            unfetched: total.saturating_sub(fetched),
        },
        checkpoints,
    }))
}

/// 수집 현황 라우터 생성.
pub fn stats_router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_stats))
}
