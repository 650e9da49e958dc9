//! API 서버 설정.

use std::net::SocketAddr;

use stockfinder_core::config::{parse_or, EnvLookup};
use stockfinder_core::Result;
use stockfinder_data::MongoConfig;

/// 기본 바인딩 주소
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// API 서버 설정
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// 바인딩 주소 (`API_LISTEN_ADDR`)
    pub listen_addr: SocketAddr,
    /// MongoDB 설정
    pub mongo: MongoConfig,
}

impl ApiConfig {
    /// 키 조회 함수로 설정 로드.
    pub fn from_lookup(lookup: EnvLookup<'_>) -> anyhow::Result<Self> {
        let default_addr: SocketAddr = DEFAULT_LISTEN_ADDR.parse()?;
        Ok(Self {
            listen_addr: listen_addr(lookup, default_addr)?,
            mongo: MongoConfig::from_lookup(lookup)?,
        })
    }
}

fn listen_addr(lookup: EnvLookup<'_>, default: SocketAddr) -> Result<SocketAddr> {
    parse_or(lookup, "API_LISTEN_ADDR", default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listen_addr() {
        let lookup = |_: &str| -> Option<String> { None };
        let config = ApiConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.listen_addr.port(), 8000);
        assert_eq!(config.mongo.database, "stockfinder");
    }

    #[test]
    fn test_invalid_listen_addr() {
        let lookup = |k: &str| (k == "API_LISTEN_ADDR").then(|| "localhost".to_string());
        assert!(ApiConfig::from_lookup(&lookup).is_err());

        let lookup = |k: &str| (k == "API_LISTEN_ADDR").then(|| "127.0.0.1:9000".to_string());
        let config = ApiConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
    }
}
