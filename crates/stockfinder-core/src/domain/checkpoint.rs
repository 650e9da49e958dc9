//! 워크플로우 체크포인트 모델.
//!
//! 체크포인트는 참고용 상태입니다. 어떤 티커를 수집할지는 항상
//! 티커 레코드의 `fundamentals_fetched` 마커가 결정합니다.
//! 체크포인트가 보존하는 것은 두 가지입니다:
//! - Rate limit 대기 만료 시각 (재시작 후에도 대기 유지)
//! - 티커 목록 동기화 완료 여부

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 티커 목록 동기화 워크플로우 이름
pub const TICKER_SYNC_WORKFLOW: &str = "ticker_sync";

/// Fundamental 수집 워크플로우 이름
pub const FUNDAMENTAL_COLLECT_WORKFLOW: &str = "fundamental_collect";

/// 체크포인트 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointStatus {
    /// 실행 중
    Running,
    /// Rate limit 대기 중
    RateLimited,
    /// 유휴 상태 (미수집 티커 없음)
    Idle,
    /// 완료됨
    Completed,
}

impl CheckpointStatus {
    /// 문자열로 변환
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::RateLimited => "rate_limited",
            Self::Idle => "idle",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for CheckpointStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckpointStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "rate_limited" => Ok(Self::RateLimited),
            "idle" => Ok(Self::Idle),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Unknown checkpoint status: {}", s)),
        }
    }
}

/// 워크플로우 체크포인트.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorCheckpoint {
    /// 워크플로우 이름
    pub workflow: String,
    /// 현재 상태
    pub status: CheckpointStatus,
    /// 마지막 처리 심볼
    pub last_symbol: Option<String>,
    /// 누적 처리 수
    pub total_processed: u64,
    /// Rate limit 대기 만료 시각
    pub cooldown_until: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl CollectorCheckpoint {
    pub fn new(workflow: impl Into<String>, status: CheckpointStatus) -> Self {
        Self {
            workflow: workflow.into(),
            status,
            last_symbol: None,
            total_processed: 0,
            cooldown_until: None,
            updated_at: Utc::now(),
        }
    }

    /// `now` 시점에 아직 유효한 대기 만료 시각.
    pub fn active_cooldown(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.status, self.cooldown_until) {
            (CheckpointStatus::RateLimited, Some(until)) if until > now => Some(until),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            CheckpointStatus::Running,
            CheckpointStatus::RateLimited,
            CheckpointStatus::Idle,
            CheckpointStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<CheckpointStatus>().unwrap(), status);
        }
        assert!("paused".parse::<CheckpointStatus>().is_err());
    }

    #[test]
    fn test_active_cooldown() {
        let now = Utc::now();
        let mut cp = CollectorCheckpoint::new(
            FUNDAMENTAL_COLLECT_WORKFLOW,
            CheckpointStatus::RateLimited,
        );
        cp.cooldown_until = Some(now + Duration::minutes(5));
        assert_eq!(cp.active_cooldown(now), cp.cooldown_until);

        // 만료된 대기
        assert_eq!(cp.active_cooldown(now + Duration::minutes(6)), None);

        // 상태가 바뀌면 대기 없음
        cp.status = CheckpointStatus::Running;
        assert_eq!(cp.active_cooldown(now), None);
    }
}
