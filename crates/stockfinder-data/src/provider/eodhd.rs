//! EOD Historical Data (EODHD) API 클라이언트.
//!
//! ## 사용 엔드포인트
//! - `/exchanges-list/`: 전체 거래소 목록 (국가 포함)
//! - `/exchange-symbol-list/{EXCHANGE}`: 거래소별 티커 목록
//! - `/fundamentals/{CODE.EXCHANGE}`: 티커별 Fundamental 데이터
//! - `/user`: 일일 호출 한도 및 사용량
//!
//! 모든 요청에 `api_token`과 `fmt=json` 쿼리를 붙입니다.
//! 에러 메시지에는 API 키가 포함된 URL을 남기지 않습니다.
//!
//! ## 사용 예시
//! ```rust,ignore
//! let client = EodhdClient::new("YOUR_API_KEY")?;
//! let data = client.fetch_fundamentals("AAPL.US").await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use stockfinder_core::{ExchangeInfo, TickerDescriptor};

use super::MarketDataProvider;

/// 에러 본문 최대 보존 길이
const MAX_ERROR_BODY: usize = 200;

/// EODHD API 에러
#[derive(Debug, Error)]
pub enum EodhdError {
    #[error("HTTP 요청 실패: {0}")]
    Http(reqwest::Error),

    #[error("Rate limit 초과")]
    RateLimited,

    #[error("인증 실패 (HTTP {0})")]
    Unauthorized(u16),

    #[error("리소스 없음: {0}")]
    NotFound(String),

    #[error("HTTP {status} 응답: {body}")]
    Status { status: u16, body: String },

    #[error("응답 파싱 실패: {0}")]
    Decode(String),

    #[error("데이터 없음: {symbol}")]
    NoData { symbol: String },
}

impl EodhdError {
    /// Rate limit 에러 여부
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl From<reqwest::Error> for EodhdError {
    fn from(err: reqwest::Error) -> Self {
        // URL에 api_token이 포함되므로 제거
        Self::Http(err.without_url())
    }
}

/// 거래소 목록 응답 항목
#[derive(Debug, Deserialize)]
struct RawExchange {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Currency", default)]
    currency: Option<String>,
}

/// 거래소별 티커 목록 응답 항목
#[derive(Debug, Deserialize)]
struct RawSymbol {
    #[serde(rename = "Code", default)]
    code: Option<String>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
    #[serde(rename = "Currency", default)]
    currency: Option<String>,
    #[serde(rename = "Type", default)]
    ticker_type: Option<String>,
    #[serde(rename = "Isin", default)]
    isin: Option<String>,
}

/// `/user` 응답 (호출 한도)
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(rename = "dailyRateLimit", default)]
    daily_rate_limit: Option<i64>,
    #[serde(rename = "apiRequests", default)]
    api_requests: Option<i64>,
    #[serde(rename = "extraLimit", default)]
    extra_limit: Option<i64>,
}

impl UserInfo {
    /// 잔여 호출 수 = 일일 한도 + 추가 한도 - 사용량 (오버플로우 시 알 수 없음)
    fn remaining(&self) -> Option<i64> {
        let limit = self.daily_rate_limit?;
        let used = self.api_requests?;
        limit
            .checked_add(self.extra_limit.unwrap_or(0))?
            .checked_sub(used)
    }
}

/// EODHD API 클라이언트.
#[derive(Clone)]
pub struct EodhdClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl EodhdClient {
    /// 기본 API 주소
    pub const DEFAULT_BASE_URL: &'static str = "https://eodhd.com/api";

    /// 새 클라이언트 생성.
    ///
    /// # Arguments
    /// * `api_key` - EODHD API 토큰
    pub fn new(api_key: impl Into<String>) -> Result<Self, EodhdError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("stockfinder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// API 주소 변경 (프록시, 테스트 서버 등)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// API 주소
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET 요청 후 JSON 역직렬화.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, EodhdError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[("api_token", self.api_key.as_str()), ("fmt", "json")])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EodhdError::RateLimited);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EodhdError::Unauthorized(status.as_u16()));
        }
        if status == StatusCode::NOT_FOUND {
            return Err(EodhdError::NotFound(path.to_string()));
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(EodhdError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| EodhdError::Decode(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl MarketDataProvider for EodhdClient {
    fn name(&self) -> &str {
        "EODHD"
    }

    async fn list_exchanges(&self) -> Result<Vec<ExchangeInfo>, EodhdError> {
        let raw: Vec<RawExchange> = self.get_json("exchanges-list/").await?;

        let exchanges: Vec<ExchangeInfo> = raw
            .into_iter()
            .filter(|e| !e.code.trim().is_empty())
            .map(|e| ExchangeInfo {
                code: e.code,
                name: e.name.unwrap_or_default(),
                country: e.country.unwrap_or_default(),
                currency: e.currency,
            })
            .collect();

        tracing::debug!(count = exchanges.len(), "EODHD 거래소 목록 조회 완료");
        Ok(exchanges)
    }

    async fn list_exchange_symbols(
        &self,
        exchange: &str,
    ) -> Result<Vec<TickerDescriptor>, EodhdError> {
        let raw: Vec<RawSymbol> = self
            .get_json(&format!("exchange-symbol-list/{}", exchange))
            .await?;

        let symbols: Vec<TickerDescriptor> = raw
            .into_iter()
            .filter_map(|s| {
                let code = s.code?.trim().to_string();
                if code.is_empty() {
                    return None;
                }
                Some(TickerDescriptor {
                    code,
                    exchange: exchange.to_string(),
                    name: s.name,
                    country: s.country,
                    currency: s.currency,
                    isin: s.isin,
                    ticker_type: s.ticker_type,
                })
            })
            .collect();

        tracing::debug!(exchange, count = symbols.len(), "EODHD 티커 목록 조회 완료");
        Ok(symbols)
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> Result<serde_json::Value, EodhdError> {
        let value: serde_json::Value = self.get_json(&format!("fundamentals/{}", symbol)).await?;

        let is_empty = match &value {
            serde_json::Value::Null => true,
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::Array(items) => items.is_empty(),
            _ => false,
        };
        if is_empty {
            return Err(EodhdError::NoData {
                symbol: symbol.to_string(),
            });
        }
        if !value.is_object() {
            return Err(EodhdError::Decode(format!(
                "fundamentals/{}: 객체가 아닌 응답 ({})",
                symbol,
                json_kind(&value)
            )));
        }

        Ok(value)
    }

    async fn remaining_api_calls(&self) -> Result<Option<i64>, EodhdError> {
        let info: UserInfo = self.get_json("user").await?;
        Ok(info.remaining())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
