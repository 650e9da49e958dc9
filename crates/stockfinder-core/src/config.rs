//! 환경변수 기반 설정 헬퍼.
//!
//! 모든 파싱 함수는 키 조회 함수(`EnvLookup`)를 받습니다.
//! 운영 환경에서는 [`process_env`]를, 테스트에서는 `HashMap` 기반 조회를 넘깁니다.
//! 빈 문자열(공백 포함)은 설정되지 않은 것으로 취급합니다.

use std::str::FromStr;

use crate::{CoreError, Result};

/// 환경변수 조회 함수 타입
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// 프로세스 환경변수 조회
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// 공백을 제거한 값 조회 (빈 값은 None)
pub fn lookup_trimmed(lookup: EnvLookup<'_>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 필수 값 조회
pub fn required(lookup: EnvLookup<'_>, key: &str) -> Result<String> {
    lookup_trimmed(lookup, key)
        .ok_or_else(|| CoreError::config(format!("{} 환경변수가 설정되지 않았습니다", key)))
}

/// 문자열 값 조회 (없으면 기본값)
pub fn string_or(lookup: EnvLookup<'_>, key: &str, default: &str) -> String {
    lookup_trimmed(lookup, key).unwrap_or_else(|| default.to_string())
}

/// 값 파싱 (없으면 기본값, 파싱 실패는 에러).
pub fn parse_or<T>(lookup: EnvLookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup_trimmed(lookup, key) {
        Some(raw) => raw.parse::<T>().map_err(|e| {
            CoreError::config(format!("{} 값이 올바르지 않습니다 ({}): {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

/// 양의 정수 파싱 (0 또는 음수, 숫자가 아닌 값은 에러).
pub fn positive_or(lookup: EnvLookup<'_>, key: &str, default: u64) -> Result<u64> {
    let raw = match lookup_trimmed(lookup, key) {
        Some(raw) => raw,
        None => return Ok(default),
    };

    match raw.parse::<i64>() {
        Ok(v) if v > 0 => Ok(v as u64),
        _ => Err(CoreError::config(format!(
            "{} 환경변수는 양의 정수여야 합니다 (현재 값: {})",
            key, raw
        ))),
    }
}

/// 쉼표 구분 목록 파싱 (각 항목 trim, 빈 항목 제거)
pub fn list(lookup: EnvLookup<'_>, key: &str) -> Vec<String> {
    lookup_trimmed(lookup, key)
        .map(|raw| split_list(&raw))
        .unwrap_or_default()
}

/// 쉼표 구분 문자열 분리
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_required_rejects_blank() {
        let vars = env(&[("EODHD_API_KEY", "   ")]);
        let lookup = |k: &str| vars.get(k).cloned();
        assert!(required(&lookup, "EODHD_API_KEY").is_err());
        assert!(required(&lookup, "MISSING").is_err());
    }

    #[test]
    fn test_positive_or() {
        let vars = env(&[("A", "25"), ("B", "0"), ("C", "-3"), ("D", "abc")]);
        let lookup = |k: &str| vars.get(k).cloned();
        assert_eq!(positive_or(&lookup, "A", 10).unwrap(), 25);
        assert!(positive_or(&lookup, "B", 10).is_err());
        assert!(positive_or(&lookup, "C", 10).is_err());
        assert!(positive_or(&lookup, "D", 10).is_err());
        assert_eq!(positive_or(&lookup, "E", 10).unwrap(), 10);
    }

    #[test]
    fn test_parse_or_reports_invalid_value() {
        let vars = env(&[("PORT", "70000")]);
        let lookup = |k: &str| vars.get(k).cloned();
        assert!(parse_or::<u16>(&lookup, "PORT", 27017).is_err());
        assert_eq!(parse_or::<u16>(&lookup, "OTHER", 27017).unwrap(), 27017);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" USA, Germany ,,"), vec!["USA", "Germany"]);
        assert!(split_list("").is_empty());
    }
}
