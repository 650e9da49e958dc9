//! tracing을 사용한 로깅 인프라.
//!
//! 이 모듈은 다양한 출력 형식을 지원하는 구조화된 로깅을 제공합니다:
//! - **pretty**: 개발용 사람이 읽기 쉬운 형식
//! - **json**: 운영환경/로그 집계용 JSON 형식
//! - **compact**: 로그 크기를 줄이기 위한 간결한 형식
//!
//! 레벨은 `LOG_LEVEL`(기본 `INFO`)에서 읽으며, `RUST_LOG`가 설정되어 있으면 우선합니다.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{self, EnvLookup};
use crate::{CoreError, Result};

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 색상이 포함된 사람이 읽기 쉬운 형식 (개발용)
    #[default]
    Pretty,
    /// 로그 집계용 JSON 형식 (운영용)
    Json,
    /// 간결한 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 로그 레벨 필터 (예: "info", "debug", "stockfinder_collector=debug")
    pub level: String,
    /// 출력 형식
    pub format: LogFormat,
    /// 대상(모듈 경로) 포함 여부
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            with_target: true,
        }
    }
}

impl LogConfig {
    /// 새 로그 설정을 생성합니다. 레벨은 [`normalize_level`]로 정규화됩니다.
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: normalize_level(&level.into()),
            ..Default::default()
        }
    }

    /// 로그 형식을 설정합니다.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// 환경 변수(`LOG_LEVEL`, `LOG_FORMAT`)에서 설정을 생성합니다.
    ///
    /// `level_override`가 주어지면 `LOG_LEVEL`보다 우선합니다 (CLI 인자용).
    pub fn from_lookup(lookup: EnvLookup<'_>, level_override: Option<&str>) -> Self {
        let level = level_override
            .map(str::to_string)
            .unwrap_or_else(|| config::string_or(lookup, "LOG_LEVEL", "INFO"));
        let format = config::lookup_trimmed(lookup, "LOG_FORMAT")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Self::new(level).with_format(format)
    }
}

/// 레벨 이름 정규화.
///
/// `INFO`, `WARNING`, `CRITICAL` 같은 이름을 tracing 필터 레벨로 변환합니다.
/// 그 외 값(`stockfinder_collector=debug` 같은 디렉티브)은 소문자로만 바꿉니다.
pub fn normalize_level(level: &str) -> String {
    let lower = level.trim().to_lowercase();
    match lower.as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "notset" => "trace".to_string(),
        _ => lower,
    }
}

/// 주어진 설정으로 로깅 시스템을 초기화합니다.
///
/// # 예제
///
/// ```no_run
/// use stockfinder_core::logging::{init_logging, LogConfig, LogFormat};
///
/// let config = LogConfig::new("debug").with_format(LogFormat::Json);
/// init_logging(config).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_target(config.with_target))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_target(config.with_target))
            .try_init(),
    };
    result.map_err(|e| CoreError::Logging(e.to_string()))?;

    tracing::info!(
        format = ?config.format,
        level = %config.level,
        "Logging initialized"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("COMPACT".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("invalid".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_config_from_lookup() {
        let vars: HashMap<String, String> = [("LOG_LEVEL", "WARNING"), ("LOG_FORMAT", "json")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let lookup = |k: &str| vars.get(k).cloned();

        let config = LogConfig::from_lookup(&lookup, None);
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Json);

        let overridden = LogConfig::from_lookup(&lookup, Some("DEBUG"));
        assert_eq!(overridden.level, "debug");
    }

    #[test]
    fn test_normalize_level() {
        assert_eq!(normalize_level("INFO"), "info");
        assert_eq!(normalize_level("Critical"), "error");
        assert_eq!(
            normalize_level("stockfinder_collector=DEBUG"),
            "stockfinder_collector=debug"
        );
    }

    #[test]
    fn test_log_config_defaults_to_info() {
        let lookup = |_: &str| -> Option<String> { None };
        let config = LogConfig::from_lookup(&lookup, None);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
