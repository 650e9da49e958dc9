//! 수집 통계 구조체.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fundamental 수집 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionStats {
    /// 총 시도 횟수
    pub total: usize,
    /// 성공 횟수 (fetched 마킹)
    pub success: usize,
    /// 에러 횟수 (다음 패스에서 재시도)
    pub errors: usize,
    /// 빈 데이터 (조회 성공, 데이터 없음 또는 404)
    pub empty: usize,
    /// Rate limit 발생 횟수
    pub rate_limited: usize,
    /// 완료된 패스 수
    pub passes: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CollectionStats {
    /// 새 통계 객체 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            errors = self.errors,
            empty = self.empty,
            rate_limited = self.rate_limited,
            passes = self.passes,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 완료"
        );
    }
}

/// 티커 목록 동기화 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerSyncStats {
    /// 국가 필터를 통과한 거래소 수
    pub exchanges: usize,
    /// 유형 필터를 통과한 티커 수
    pub listed: usize,
    /// 유형 필터로 제외된 티커 수
    pub filtered_out: usize,
    /// 새로 추가된 티커 수
    pub inserted: usize,
    /// 이미 존재한 티커 수
    pub existing: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl TickerSyncStats {
    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            exchanges = self.exchanges,
            listed = self.listed,
            filtered_out = self.filtered_out,
            inserted = self.inserted,
            existing = self.existing,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "티커 동기화 완료"
        );
    }
}
