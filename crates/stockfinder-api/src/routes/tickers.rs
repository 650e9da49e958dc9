//! 티커 조회 endpoint.
//!
//! - `GET /api/v1/tickers`: 티커 목록 (필터, 페이지)
//! - `GET /api/v1/tickers/{symbol}`: 티커 상세 (Fundamental 포함)
//! - `GET /api/v1/tickers/{symbol}/fundamentals`: Fundamental 원본만

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockfinder_core::{parse_symbol, TickerRecord};
use stockfinder_data::storage::DEFAULT_LIST_LIMIT;
use stockfinder_data::TickerQuery;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 목록 조회 최대 개수
pub const MAX_LIST_LIMIT: u64 = 1000;

/// 목록 조회 쿼리 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct TickerListParams {
    pub country: Option<String>,
    pub exchange: Option<String>,
    pub fetched: Option<bool>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl TickerListParams {
    fn into_query(self) -> TickerQuery {
        TickerQuery {
            country: self.country,
            exchange: self.exchange,
            fetched: self.fetched,
            limit: self.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT),
            offset: self.offset.unwrap_or(0),
        }
    }
}

/// 티커 요약 (Fundamental 제외).
#[derive(Debug, Serialize, Deserialize)]
pub struct TickerSummary {
    pub symbol: String,
    pub code: String,
    pub exchange: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub isin: Option<String>,
    pub ticker_type: Option<String>,
    pub fundamentals_fetched: bool,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl From<&TickerRecord> for TickerSummary {
    fn from(record: &TickerRecord) -> Self {
        Self {
            symbol: record.symbol(),
            code: record.code.clone(),
            exchange: record.exchange.clone(),
            name: record.name.clone(),
            country: record.country.clone(),
            currency: record.currency.clone(),
            isin: record.isin.clone(),
            ticker_type: record.ticker_type.clone(),
            fundamentals_fetched: record.fundamentals_fetched,
            fetched_at: record.fetched_at,
        }
    }
}

/// 티커 목록 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct TickerListResponse {
    pub tickers: Vec<TickerSummary>,
    pub count: usize,
    pub limit: u64,
    pub offset: u64,
}

/// 티커 상세 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct TickerDetailResponse {
    #[serde(flatten)]
    pub summary: TickerSummary,
    pub fundamentals: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 티커 목록 조회.
///
/// GET /api/v1/tickers
pub async fn list_tickers(
    State(state): State<Arc<AppState>>,
    params: Result<Query<TickerListParams>, QueryRejection>,
) -> ApiResult<Json<TickerListResponse>> {
    let Query(params) =
        params.map_err(|e| ApiError::bad_request("INVALID_QUERY", e.body_text()))?;
    let query = params.into_query();

    let records = state.tickers.list_tickers(&query).await?;
    let tickers: Vec<TickerSummary> = records.iter().map(TickerSummary::from).collect();

    Ok(Json(TickerListResponse {
        count: tickers.len(),
        tickers,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// 티커 상세 조회.
///
/// GET /api/v1/tickers/{symbol}
pub async fn get_ticker(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<TickerDetailResponse>> {
    let record = find_ticker(&state, &symbol).await?;

    Ok(Json(TickerDetailResponse {
        summary: TickerSummary::from(&record),
        created_at: record.created_at,
        updated_at: record.updated_at,
        fundamentals: record.fundamentals,
    }))
}

/// Fundamental 원본 조회.
///
/// GET /api/v1/tickers/{symbol}/fundamentals
pub async fn get_fundamentals(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let record = find_ticker(&state, &symbol).await?;

    match record.fundamentals {
        Some(payload) if record.fundamentals_fetched => Ok(Json(payload)),
        _ => Err(ApiError::not_found(
            "FUNDAMENTALS_NOT_FETCHED",
            format!("아직 수집되지 않은 티커입니다: {}", symbol),
        )),
    }
}

async fn find_ticker(state: &AppState, symbol: &str) -> ApiResult<TickerRecord> {
    let (code, exchange) = parse_symbol(symbol).ok_or_else(|| {
        ApiError::bad_request(
            "INVALID_SYMBOL",
            format!("심볼은 CODE.EXCHANGE 형식이어야 합니다: {}", symbol),
        )
    })?;

    state
        .tickers
        .get_ticker(code, exchange)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(
                "TICKER_NOT_FOUND",
                format!("티커를 찾을 수 없습니다: {}", symbol),
            )
        })
}

/// 티커 라우터 생성.
pub fn tickers_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tickers))
        .route("/{symbol}", get(get_ticker))
        .route("/{symbol}/fundamentals", get(get_fundamentals))
}
