//! 티커 도메인 모델.
//!
//! - [`ExchangeInfo`]: 거래소 목록 항목
//! - [`TickerDescriptor`]: 티커 목록 조회 결과 (저장 전)
//! - [`TickerRecord`]: 저장소에 보관되는 티커 레코드 (fetched 마커 + fundamentals)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 거래소 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeInfo {
    /// 거래소 코드 (예: US, XETRA, LSE)
    pub code: String,
    /// 거래소명
    pub name: String,
    /// 국가 (예: USA, Germany)
    pub country: String,
    /// 통화
    pub currency: Option<String>,
}

/// 티커 기술자.
///
/// `(code, exchange)` 쌍이 티커를 유일하게 식별합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerDescriptor {
    /// 종목 코드 (예: AAPL)
    pub code: String,
    /// 거래소 코드 (예: US)
    pub exchange: String,
    /// 종목명
    pub name: Option<String>,
    /// 국가
    pub country: Option<String>,
    /// 통화
    pub currency: Option<String>,
    /// ISIN
    pub isin: Option<String>,
    /// 종목 유형 (예: Common Stock)
    pub ticker_type: Option<String>,
}

impl TickerDescriptor {
    /// 최소 정보로 기술자 생성.
    pub fn new(code: impl Into<String>, exchange: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            exchange: exchange.into(),
            name: None,
            country: None,
            currency: None,
            isin: None,
            ticker_type: None,
        }
    }

    /// 국가 지정.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// API 호출용 심볼 (`CODE.EXCHANGE`)
    pub fn symbol(&self) -> String {
        format_symbol(&self.code, &self.exchange)
    }
}

/// 저장된 티커 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRecord {
    pub code: String,
    pub exchange: String,
    pub name: Option<String>,
    pub country: Option<String>,
    pub currency: Option<String>,
    pub isin: Option<String>,
    pub ticker_type: Option<String>,
    /// 삽입 순서 (배치 정렬 및 패스 커서)
    pub seq: i64,
    /// Fundamental 수집 완료 여부
    pub fundamentals_fetched: bool,
    /// Fundamental 수집 시각
    pub fetched_at: Option<DateTime<Utc>>,
    /// Fundamental 원본 데이터 (API 응답 그대로)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fundamentals: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TickerRecord {
    /// 기술자로부터 미수집 상태의 새 레코드 생성.
    pub fn from_descriptor(descriptor: TickerDescriptor, seq: i64, now: DateTime<Utc>) -> Self {
        Self {
            code: descriptor.code,
            exchange: descriptor.exchange,
            name: descriptor.name,
            country: descriptor.country,
            currency: descriptor.currency,
            isin: descriptor.isin,
            ticker_type: descriptor.ticker_type,
            seq,
            fundamentals_fetched: false,
            fetched_at: None,
            fundamentals: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// API 호출용 심볼 (`CODE.EXCHANGE`)
    pub fn symbol(&self) -> String {
        format_symbol(&self.code, &self.exchange)
    }

    /// Fundamental 데이터를 제외한 사본 (목록 조회용)
    pub fn without_fundamentals(&self) -> Self {
        Self {
            fundamentals: None,
            ..self.clone()
        }
    }
}

/// `CODE.EXCHANGE` 형식 심볼 생성
pub fn format_symbol(code: &str, exchange: &str) -> String {
    format!("{}.{}", code, exchange)
}

/// `CODE.EXCHANGE` 심볼 분리.
///
/// 종목 코드 자체에 점이 포함될 수 있으므로 마지막 점을 기준으로 나눕니다.
/// 코드나 거래소가 비어 있으면 `None`.
pub fn parse_symbol(symbol: &str) -> Option<(&str, &str)> {
    let (code, exchange) = symbol.rsplit_once('.')?;
    if code.is_empty() || exchange.is_empty() {
        return None;
    }
    Some((code, exchange))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_roundtrip() {
        let d = TickerDescriptor::new("AAPL", "US");
        assert_eq!(d.symbol(), "AAPL.US");
        assert_eq!(parse_symbol("AAPL.US"), Some(("AAPL", "US")));
    }

    #[test]
    fn test_parse_symbol_with_dotted_code() {
        assert_eq!(parse_symbol("BRK.B.US"), Some(("BRK.B", "US")));
        assert_eq!(parse_symbol("AAPL"), None);
        assert_eq!(parse_symbol(".US"), None);
        assert_eq!(parse_symbol("AAPL."), None);
    }

    #[test]
    fn test_record_from_descriptor_is_unfetched() {
        let now = Utc::now();
        let record = TickerRecord::from_descriptor(
            TickerDescriptor::new("SAP", "XETRA").with_country("Germany"),
            7,
            now,
        );
        assert!(!record.fundamentals_fetched);
        assert!(record.fetched_at.is_none());
        assert_eq!(record.seq, 7);
        assert_eq!(record.country.as_deref(), Some("Germany"));
        assert_eq!(record.symbol(), "SAP.XETRA");
    }
}
