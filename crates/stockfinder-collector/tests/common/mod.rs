//! 테스트 지원: 스크립트 Provider, 저장 거부 저장소

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use stockfinder_core::{CollectorCheckpoint, ExchangeInfo, TickerDescriptor, TickerRecord};
use stockfinder_data::{
    CheckpointStore, DataError, EodhdError, MarketDataProvider, MemoryStore, TickerQuery,
    TickerStore, UpsertSummary,
};
use tokio_util::sync::CancellationToken;

/// 모든 호출을 기록하는 스크립트 Provider.
#[derive(Default)]
pub struct ScriptedProvider {
    exchanges: Vec<ExchangeInfo>,
    symbols: HashMap<String, Vec<TickerDescriptor>>,
    failing_listings: HashSet<String>,
    /// 심볼별 예약 응답 (비어 있으면 성공)
    responses: Mutex<HashMap<String, VecDeque<Result<Value, EodhdError>>>>,
    /// 항상 404를 반환하는 심볼
    missing: HashSet<String>,
    quota: Mutex<VecDeque<Option<i64>>>,
    calls: Mutex<Vec<String>>,
    /// Fundamental 호출이 이 횟수에 도달하면 토큰 취소
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exchange(mut self, code: &str, country: &str, tickers: &[(&str, &str)]) -> Self {
        self.exchanges.push(ExchangeInfo {
            code: code.to_string(),
            name: format!("{} Exchange", code),
            country: country.to_string(),
            currency: None,
        });
        let descriptors = tickers
            .iter()
            .map(|(ticker, ticker_type)| {
                let mut d = TickerDescriptor::new(*ticker, code);
                d.ticker_type = Some(ticker_type.to_string());
                d
            })
            .collect();
        self.symbols.insert(code.to_string(), descriptors);
        self
    }

    pub fn with_failing_listing(mut self, code: &str) -> Self {
        self.failing_listings.insert(code.to_string());
        self
    }

    pub fn with_response(self, symbol: &str, outcome: Result<Value, EodhdError>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn with_missing(mut self, symbol: &str) -> Self {
        self.missing.insert(symbol.to_string());
        self
    }

    pub fn with_quota(self, remaining: Option<i64>) -> Self {
        self.quota.lock().unwrap().push_back(remaining);
        self
    }

    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    /// 기록된 전체 호출 (예: `exchanges`, `symbols:US`, `user`, `fundamentals:AAPL.US`)
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Fundamental 조회에 사용된 심볼 (호출 순)
    pub fn fundamentals_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("fundamentals:").map(str::to_string))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_exchanges(&self) -> Result<Vec<ExchangeInfo>, EodhdError> {
        self.record("exchanges".to_string());
        Ok(self.exchanges.clone())
    }

    async fn list_exchange_symbols(
        &self,
        exchange: &str,
    ) -> Result<Vec<TickerDescriptor>, EodhdError> {
        self.record(format!("symbols:{}", exchange));
        if self.failing_listings.contains(exchange) {
            return Err(EodhdError::Status {
                status: 500,
                body: "upstream error".to_string(),
            });
        }
        Ok(self.symbols.get(exchange).cloned().unwrap_or_default())
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<Value, EodhdError> {
        self.record(format!("fundamentals:{}", symbol));

        if let Some((limit, token)) = &self.cancel_after {
            if self.fundamentals_calls().len() >= *limit {
                token.cancel();
            }
        }

        let queued = self
            .responses
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(VecDeque::pop_front);
        if let Some(outcome) = queued {
            return outcome;
        }
        if self.missing.contains(symbol) {
            return Err(EodhdError::NotFound(format!("fundamentals/{}", symbol)));
        }
        Ok(json!({ "General": { "Code": symbol } }))
    }

    async fn remaining_api_calls(&self) -> Result<Option<i64>, EodhdError> {
        self.record("user".to_string());
        Ok(self.quota.lock().unwrap().pop_front().flatten())
    }
}

/// 주어진 보통주만 가진 `US` 거래소 하나를 반환하는 Provider
pub fn us_provider(codes: &[&str]) -> ScriptedProvider {
    let tickers: Vec<(&str, &str)> = codes.iter().map(|c| (*c, "Common Stock")).collect();
    ScriptedProvider::new().with_exchange("US", "USA", &tickers)
}

/// 지정한 종목 코드의 Fundamental 저장을 거부하는 저장소.
///
/// 나머지 동작은 모두 내부 [`MemoryStore`]에 위임합니다.
#[derive(Clone)]
pub struct RejectingStore {
    pub inner: MemoryStore,
    rejected: HashSet<String>,
}

impl RejectingStore {
    pub fn new(inner: MemoryStore, rejected_codes: &[&str]) -> Self {
        Self {
            inner,
            rejected: rejected_codes.iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[async_trait]
impl TickerStore for RejectingStore {
    async fn upsert_tickers(
        &self,
        descriptors: &[TickerDescriptor],
    ) -> stockfinder_data::Result<UpsertSummary> {
        self.inner.upsert_tickers(descriptors).await
    }

    async fn is_empty(&self) -> stockfinder_data::Result<bool> {
        self.inner.is_empty().await
    }

    async fn next_unfetched_batch(
        &self,
        limit: usize,
        after_seq: Option<i64>,
    ) -> stockfinder_data::Result<Vec<TickerRecord>> {
        self.inner.next_unfetched_batch(limit, after_seq).await
    }

    async fn mark_fetched(
        &self,
        code: &str,
        exchange: &str,
        fundamentals: Value,
    ) -> stockfinder_data::Result<bool> {
        if self.rejected.contains(code) {
            return Err(DataError::PayloadRejected(format!(
                "{}.{}: BSON does not support unsigned integers",
                code, exchange
            )));
        }
        self.inner.mark_fetched(code, exchange, fundamentals).await
    }

    async fn get_ticker(
        &self,
        code: &str,
        exchange: &str,
    ) -> stockfinder_data::Result<Option<TickerRecord>> {
        self.inner.get_ticker(code, exchange).await
    }

    async fn list_tickers(&self, query: &TickerQuery) -> stockfinder_data::Result<Vec<TickerRecord>> {
        self.inner.list_tickers(query).await
    }

    async fn count_tickers(&self, fetched: Option<bool>) -> stockfinder_data::Result<u64> {
        self.inner.count_tickers(fetched).await
    }

    async fn ping(&self) -> stockfinder_data::Result<()> {
        self.inner.ping().await
    }
}

#[async_trait]
impl CheckpointStore for RejectingStore {
    async fn save_checkpoint(&self, checkpoint: &CollectorCheckpoint) -> stockfinder_data::Result<()> {
        self.inner.save_checkpoint(checkpoint).await
    }

    async fn load_checkpoint(
        &self,
        workflow: &str,
    ) -> stockfinder_data::Result<Option<CollectorCheckpoint>> {
        self.inner.load_checkpoint(workflow).await
    }

    async fn list_checkpoints(&self) -> stockfinder_data::Result<Vec<CollectorCheckpoint>> {
        self.inner.list_checkpoints().await
    }
}
