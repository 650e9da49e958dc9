//! 환경변수 기반 설정 모듈.

use std::fmt;
use std::time::Duration;

use stockfinder_core::config::{self, EnvLookup};
use stockfinder_data::{EodhdClient, MongoConfig};

use crate::Result;

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// EODHD API 설정
    pub eodhd: EodhdConfig,
    /// MongoDB 설정
    pub mongo: MongoConfig,
    /// 티커 목록 동기화 설정
    pub ticker_sync: TickerSyncConfig,
    /// Fundamental 수집 설정
    pub fundamental_collect: FundamentalCollectConfig,
}

/// EODHD API 설정
#[derive(Clone)]
pub struct EodhdConfig {
    pub api_key: String,
    pub base_url: String,
}

impl fmt::Debug for EodhdConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EodhdConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl EodhdConfig {
    /// 설정으로 API 클라이언트 생성
    pub fn client(&self) -> Result<EodhdClient> {
        Ok(EodhdClient::new(self.api_key.clone())?.with_base_url(self.base_url.clone()))
    }
}

/// 티커 목록 동기화 설정
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerSyncConfig {
    /// 수집 대상 국가 (비어 있으면 전체)
    pub countries: Vec<String>,
    /// 수집 대상 종목 유형 (비어 있으면 전체)
    pub ticker_types: Vec<String>,
}

/// Fundamental 수집 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundamentalCollectConfig {
    /// 배치당 티커 수
    pub batch_size: usize,
    /// Rate limit 발생 시 대기 시간 (분)
    pub minutes_to_wait: u64,
    /// Fundamental 1회 호출이 소모하는 API 호출 수 (0이면 잔여량 확인 안 함)
    pub api_calls_per_ticker: u64,
    /// API 요청 간 딜레이 (밀리초)
    pub request_delay_ms: u64,
    /// 패스 종료 후 다음 패스까지 대기 시간 (분)
    pub idle_poll_minutes: u64,
}

impl Default for FundamentalCollectConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            minutes_to_wait: 10,
            api_calls_per_ticker: 10,
            request_delay_ms: 0,
            idle_poll_minutes: 60,
        }
    }
}

impl CollectorConfig {
    /// 키 조회 함수로 설정 로드.
    ///
    /// 운영 환경에서는 `.env` 로드 후 [`process_env`](config::process_env)를 넘깁니다.
    pub fn from_lookup(lookup: EnvLookup<'_>) -> Result<Self> {
        let defaults = FundamentalCollectConfig::default();

        let batch_size = config::positive_or(lookup, "BATCH_SIZE", defaults.batch_size as u64)?;

        Ok(Self {
            eodhd: EodhdConfig {
                api_key: config::required(lookup, "EODHD_API_KEY")?,
                base_url: config::string_or(
                    lookup,
                    "EODHD_BASE_URL",
                    EodhdClient::DEFAULT_BASE_URL,
                ),
            },
            mongo: MongoConfig::from_lookup(lookup)?,
            ticker_sync: TickerSyncConfig {
                countries: config::list(lookup, "COUNTRIES"),
                ticker_types: match config::lookup_trimmed(lookup, "TICKER_TYPES") {
                    Some(raw) => config::split_list(&raw),
                    None => vec!["Common Stock".to_string()],
                },
            },
            fundamental_collect: FundamentalCollectConfig {
                batch_size: usize::try_from(batch_size).unwrap_or(usize::MAX),
                minutes_to_wait: config::positive_or(
                    lookup,
                    "MINUTES_TO_WAIT",
                    defaults.minutes_to_wait,
                )?,
                api_calls_per_ticker: config::parse_or(
                    lookup,
                    "API_CALLS_PER_TICKER",
                    defaults.api_calls_per_ticker,
                )?,
                request_delay_ms: config::parse_or(
                    lookup,
                    "REQUEST_DELAY_MS",
                    defaults.request_delay_ms,
                )?,
                idle_poll_minutes: config::positive_or(
                    lookup,
                    "IDLE_POLL_MINUTES",
                    defaults.idle_poll_minutes,
                )?,
            },
        })
    }
}

impl FundamentalCollectConfig {
    /// Rate limit 대기 시간을 Duration으로 반환
    pub fn rate_limit_wait(&self) -> Duration {
        Duration::from_secs(self.minutes_to_wait.saturating_mul(60))
    }

    /// API 요청 간 딜레이를 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// 유휴 대기 시간을 Duration으로 반환
    pub fn idle_poll_interval(&self) -> Duration {
        Duration::from_secs(self.idle_poll_minutes.saturating_mul(60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<CollectorConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let lookup = |k: &str| vars.get(k).cloned();
        CollectorConfig::from_lookup(&lookup)
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("EODHD_API_KEY", "demo")]).unwrap();

        assert_eq!(config.eodhd.api_key, "demo");
        assert_eq!(config.eodhd.base_url, "https://eodhd.com/api");
        assert!(config.ticker_sync.countries.is_empty());
        assert_eq!(config.ticker_sync.ticker_types, ["Common Stock"]);
        assert_eq!(config.mongo, MongoConfig::default());
        assert_eq!(config.fundamental_collect, FundamentalCollectConfig::default());
        assert_eq!(
            config.fundamental_collect.rate_limit_wait(),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_missing_api_key() {
        assert!(load(&[]).is_err());
        assert!(load(&[("EODHD_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn test_countries_are_trimmed() {
        let config = load(&[
            ("EODHD_API_KEY", "demo"),
            ("COUNTRIES", " USA , Germany,,"),
            ("TICKER_TYPES", "Common Stock,ETF"),
        ])
        .unwrap();

        assert_eq!(config.ticker_sync.countries, ["USA", "Germany"]);
        assert_eq!(config.ticker_sync.ticker_types, ["Common Stock", "ETF"]);
    }

    #[test]
    fn test_non_positive_values_rejected() {
        for (key, value) in [
            ("BATCH_SIZE", "0"),
            ("BATCH_SIZE", "-5"),
            ("BATCH_SIZE", "many"),
            ("MINUTES_TO_WAIT", "0"),
            ("IDLE_POLL_MINUTES", "-1"),
        ] {
            assert!(
                load(&[("EODHD_API_KEY", "demo"), (key, value)]).is_err(),
                "{}={} should be rejected",
                key,
                value
            );
        }
    }

    #[test]
    fn test_collect_overrides() {
        let config = load(&[
            ("EODHD_API_KEY", "demo"),
            ("BATCH_SIZE", "2"),
            ("MINUTES_TO_WAIT", "1"),
            ("API_CALLS_PER_TICKER", "0"),
            ("REQUEST_DELAY_MS", "250"),
        ])
        .unwrap();

        let collect = &config.fundamental_collect;
        assert_eq!(collect.batch_size, 2);
        assert_eq!(collect.rate_limit_wait(), Duration::from_secs(60));
        assert_eq!(collect.api_calls_per_ticker, 0);
        assert_eq!(collect.request_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = load(&[("EODHD_API_KEY", "super-secret")]).unwrap();
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
