//! 데이터 Provider 모듈.
//!
//! ## EOD Historical Data (EODHD)
//! - `EodhdClient`: EODHD REST API 클라이언트 (API 키 필요)
//! - 거래소 목록, 거래소별 티커 목록
//! - 티커별 Fundamental 데이터 (재무제표, 밸류에이션 등)
//! - 일일 잔여 API 호출 수
//!
//! 수집기는 [`MarketDataProvider`] trait에만 의존하므로
//! 테스트에서는 스크립트된 Provider로 대체할 수 있습니다.

pub mod eodhd;

pub use eodhd::{EodhdClient, EodhdError};

use async_trait::async_trait;
use stockfinder_core::{ExchangeInfo, TickerDescriptor};

/// 시장 데이터 Provider trait.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Provider 이름.
    fn name(&self) -> &str;

    /// 전체 거래소 목록 조회.
    async fn list_exchanges(&self) -> Result<Vec<ExchangeInfo>, EodhdError>;

    /// 거래소별 티커 목록 조회.
    ///
    /// 반환되는 기술자의 `exchange`는 조회에 사용한 거래소 코드입니다.
    async fn list_exchange_symbols(
        &self,
        exchange: &str,
    ) -> Result<Vec<TickerDescriptor>, EodhdError>;

    /// 단일 티커의 Fundamental 데이터 조회.
    ///
    /// # Arguments
    /// * `symbol` - `CODE.EXCHANGE` 형식 심볼 (예: "AAPL.US")
    async fn fetch_fundamentals(&self, symbol: &str) -> Result<serde_json::Value, EodhdError>;

    /// 일일 잔여 API 호출 수 (알 수 없으면 `None`).
    async fn remaining_api_calls(&self) -> Result<Option<i64>, EodhdError>;
}
