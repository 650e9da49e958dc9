//! 워크플로우 체크포인트 관리 모듈.
//!
//! 체크포인트는 참고용입니다. 어떤 티커를 수집할지는 티커의 fetched 마커가 결정하고,
//! 체크포인트는 다음 두 가지를 재시작 후에도 유지하기 위해 사용합니다:
//!
//! - **Rate limit 대기**: 만료 시각을 저장해 재시작 직후 다시 호출하지 않음
//! - **티커 동기화 완료 여부**: 목록 저장 도중 중단되면 다음 실행에서 다시 동기화

use chrono::{DateTime, Utc};
use stockfinder_core::{CheckpointStatus, CollectorCheckpoint};
use stockfinder_data::CheckpointStore;

use crate::Result;

/// 체크포인트 로드 (없으면 `Running` 상태의 새 체크포인트).
pub async fn load_or_new<S>(store: &S, workflow: &str) -> Result<CollectorCheckpoint>
where
    S: CheckpointStore + ?Sized,
{
    Ok(store
        .load_checkpoint(workflow)
        .await?
        .unwrap_or_else(|| CollectorCheckpoint::new(workflow, CheckpointStatus::Running)))
}

/// 상태 변경 후 저장.
///
/// `RateLimited`가 아닌 상태로 바뀌면 대기 만료 시각을 지웁니다.
pub async fn save_status<S>(
    store: &S,
    checkpoint: &mut CollectorCheckpoint,
    status: CheckpointStatus,
) -> Result<()>
where
    S: CheckpointStore + ?Sized,
{
    checkpoint.status = status;
    if status != CheckpointStatus::RateLimited {
        checkpoint.cooldown_until = None;
    }
    checkpoint.updated_at = Utc::now();
    store.save_checkpoint(checkpoint).await?;
    Ok(())
}

/// Rate limit 대기 상태와 만료 시각 저장.
pub async fn save_cooldown<S>(
    store: &S,
    checkpoint: &mut CollectorCheckpoint,
    until: DateTime<Utc>,
) -> Result<()>
where
    S: CheckpointStore + ?Sized,
{
    checkpoint.cooldown_until = Some(until);
    save_status(store, checkpoint, CheckpointStatus::RateLimited).await
}

/// 워크플로우가 완료 상태인지 확인.
pub async fn is_completed<S>(store: &S, workflow: &str) -> Result<bool>
where
    S: CheckpointStore + ?Sized,
{
    Ok(store
        .load_checkpoint(workflow)
        .await?
        .is_some_and(|cp| cp.status == CheckpointStatus::Completed))
}
