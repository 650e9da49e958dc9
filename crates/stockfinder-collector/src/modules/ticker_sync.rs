//! 티커 목록 동기화 모듈.
//!
//! 1. 거래소 목록 조회 후 국가 필터 적용 (`COUNTRIES`, 대소문자 구분 정확히 일치)
//! 2. 거래소별 티커 목록 조회 후 종목 유형 필터 적용 (`TICKER_TYPES`)
//! 3. 모든 목록 조회가 끝난 뒤에만 저장 (조회 실패 시 아무것도 저장하지 않음)
//! 4. 저장이 모두 성공하면 `ticker_sync` 체크포인트를 완료로 표시

use std::time::Instant;

use stockfinder_core::{CheckpointStatus, ExchangeInfo, TickerDescriptor, TICKER_SYNC_WORKFLOW};
use stockfinder_data::{CheckpointStore, MarketDataProvider, TickerStore};
use tracing::{debug, info, warn};

use super::checkpoint;
use crate::config::TickerSyncConfig;
use crate::stats::TickerSyncStats;
use crate::Result;

/// 티커 동기화 옵션
#[derive(Debug, Clone, Copy, Default)]
pub struct TickerSyncOptions {
    /// 저장소 상태와 무관하게 동기화 실행
    pub force: bool,
}

/// 동기화가 필요한지 확인.
///
/// 저장소가 비어 있거나, 마지막 동기화가 완료되지 않았으면 `true`.
pub async fn needs_sync<S>(store: &S) -> Result<bool>
where
    S: TickerStore + CheckpointStore + ?Sized,
{
    if store.is_empty().await? {
        info!("저장된 티커 없음");
        return Ok(true);
    }
    if !checkpoint::is_completed(store, TICKER_SYNC_WORKFLOW).await? {
        info!("이전 티커 동기화가 완료되지 않음");
        return Ok(true);
    }
    Ok(false)
}

/// 필요할 때만 티커 동기화 실행.
///
/// 동기화를 건너뛰면 `None`.
pub async fn ensure_tickers<P, S>(
    provider: &P,
    store: &S,
    config: &TickerSyncConfig,
    options: TickerSyncOptions,
) -> Result<Option<TickerSyncStats>>
where
    P: MarketDataProvider + ?Sized,
    S: TickerStore + CheckpointStore + ?Sized,
{
    if !options.force && !needs_sync(store).await? {
        info!("티커 목록 최신 상태, 동기화 건너뛰기");
        return Ok(None);
    }
    sync_tickers(provider, store, config).await.map(Some)
}

/// 티커 목록 동기화.
pub async fn sync_tickers<P, S>(
    provider: &P,
    store: &S,
    config: &TickerSyncConfig,
) -> Result<TickerSyncStats>
where
    P: MarketDataProvider + ?Sized,
    S: TickerStore + CheckpointStore + ?Sized,
{
    let start = Instant::now();
    let mut stats = TickerSyncStats::default();
    let mut cp = checkpoint::load_or_new(store, TICKER_SYNC_WORKFLOW).await?;
    checkpoint::save_status(store, &mut cp, CheckpointStatus::Running).await?;

    info!(
        provider = provider.name(),
        countries = ?config.countries,
        ticker_types = ?config.ticker_types,
        "티커 동기화 시작"
    );

    // 1. 거래소 목록
    let exchanges: Vec<ExchangeInfo> = provider
        .list_exchanges()
        .await?
        .into_iter()
        .filter(|ex| country_matches(&config.countries, &ex.country))
        .collect();
    stats.exchanges = exchanges.len();

    if exchanges.is_empty() {
        warn!(countries = ?config.countries, "조건에 맞는 거래소 없음");
    }

    // 2. 거래소별 티커 목록 (저장 전에 전부 조회)
    let mut listings: Vec<(String, Vec<TickerDescriptor>)> = Vec::with_capacity(exchanges.len());
    for exchange in &exchanges {
        let symbols = provider.list_exchange_symbols(&exchange.code).await?;
        let total = symbols.len();

        let kept: Vec<TickerDescriptor> = symbols
            .into_iter()
            .filter(|t| !t.code.trim().is_empty())
            .filter(|t| type_matches(&config.ticker_types, t.ticker_type.as_deref()))
            .map(|t| with_exchange_country(t, exchange))
            .collect();

        debug!(
            exchange = %exchange.code,
            country = %exchange.country,
            total,
            kept = kept.len(),
            "거래소 티커 조회"
        );

        stats.filtered_out += total - kept.len();
        stats.listed += kept.len();
        listings.push((exchange.code.clone(), kept));
    }

    if stats.listed == 0 {
        warn!("저장할 티커 없음");
    }

    // 3. 저장
    for (exchange, tickers) in &listings {
        if tickers.is_empty() {
            continue;
        }
        let summary = store.upsert_tickers(tickers).await?;
        stats.inserted += summary.inserted;
        stats.existing += summary.existing;
        info!(
            exchange = %exchange,
            inserted = summary.inserted,
            existing = summary.existing,
            "티커 저장"
        );
    }

    // 4. 완료 표시
    cp.total_processed = stats.inserted as u64;
    cp.last_symbol = None;
    checkpoint::save_status(store, &mut cp, CheckpointStatus::Completed).await?;

    stats.elapsed = start.elapsed();
    Ok(stats)
}

fn country_matches(countries: &[String], country: &str) -> bool {
    countries.is_empty() || countries.iter().any(|c| c == country.trim())
}

fn type_matches(ticker_types: &[String], ticker_type: Option<&str>) -> bool {
    if ticker_types.is_empty() {
        return true;
    }
    ticker_type.is_some_and(|t| ticker_types.iter().any(|allowed| allowed == t.trim()))
}

/// 티커 국가가 비어 있으면 거래소 국가 사용
fn with_exchange_country(mut ticker: TickerDescriptor, exchange: &ExchangeInfo) -> TickerDescriptor {
    let missing = ticker
        .country
        .as_deref()
        .map_or(true, |c| c.trim().is_empty());
    if missing {
        ticker.country = Some(exchange.country.clone());
    }
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_filter_is_exact() {
        let countries = vec!["USA".to_string(), "Germany".to_string()];
        assert!(country_matches(&countries, "USA"));
        assert!(country_matches(&countries, " Germany "));
        assert!(!country_matches(&countries, "usa"));
        assert!(!country_matches(&countries, "UK"));
        assert!(country_matches(&[], "UK"));
    }

    #[test]
    fn test_type_filter() {
        let types = vec!["Common Stock".to_string()];
        assert!(type_matches(&types, Some("Common Stock")));
        assert!(!type_matches(&types, Some("ETF")));
        assert!(!type_matches(&types, None));
        assert!(type_matches(&[], None));
    }

    #[test]
    fn test_country_fallback() {
        let exchange = ExchangeInfo {
            code: "XETRA".into(),
            name: "Xetra".into(),
            country: "Germany".into(),
            currency: Some("EUR".into()),
        };

        let ticker = with_exchange_country(TickerDescriptor::new("SAP", "XETRA"), &exchange);
        assert_eq!(ticker.country.as_deref(), Some("Germany"));

        let ticker = with_exchange_country(
            TickerDescriptor::new("ASML", "XETRA").with_country("Netherlands"),
            &exchange,
        );
        assert_eq!(ticker.country.as_deref(), Some("Netherlands"));
    }
}
