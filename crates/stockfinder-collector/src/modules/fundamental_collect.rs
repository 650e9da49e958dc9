//! Fundamental 수집 모듈.
//!
//! 미수집 티커를 배치 단위로 가져와 하나씩 Fundamental을 조회하고 저장합니다.
//!
//! ## 상태
//!
//! - [`CollectorState::FetchingBatch`]: 패스 커서 이후의 미수집 티커 배치 처리
//! - [`CollectorState::RateLimitedWait`]: Rate limit 대기 후 같은 티커부터 재시도
//! - [`CollectorState::IdlePoll`]: 패스 종료, 커서 초기화 후 대기
//!
//! ## 패스 커서
//!
//! 커서는 마지막으로 처리한 티커의 `seq`입니다. 성공하거나 Rate limit 외의
//! 이유로 실패한 티커는 커서를 전진시키고, Rate limit에 걸린 티커는 전진시키지
//! 않습니다. 실패한 티커는 다음 패스에서 다시 시도되므로 같은 티커를 쉬지 않고
//! 반복 호출하지 않습니다. 저장소가 데이터 자체를 거부한 경우(BSON 변환 실패,
//! 문서 크기 초과)도 같은 방식으로 건너뜁니다.
//!
//! ## 재시작
//!
//! 진행 상태는 티커의 fetched 마커에만 있습니다. 체크포인트에 아직 만료되지 않은
//! 대기 시각이 있으면 남은 시간만큼 대기한 뒤 시작합니다.

use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use stockfinder_core::{
    CheckpointStatus, CollectorCheckpoint, TickerRecord, FUNDAMENTAL_COLLECT_WORKFLOW,
};
use stockfinder_data::{CheckpointStore, EodhdError, MarketDataProvider, TickerStore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::checkpoint;
use crate::config::FundamentalCollectConfig;
use crate::{CollectionStats, Result};

/// 진행 로그 간격 (티커 수)
const PROGRESS_LOG_INTERVAL: usize = 100;

/// 수집기 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorState {
    /// 배치 처리
    FetchingBatch,
    /// Rate limit 대기
    RateLimitedWait {
        /// 대기 만료 시각
        until: DateTime<Utc>,
        /// 대기 시간
        wait: Duration,
    },
    /// 패스 종료 후 대기
    IdlePoll,
}

/// 실행 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 종료 신호까지 계속 실행
    Continuous,
    /// 첫 `IdlePoll` 도달 시 종료
    UntilIdle,
}

/// Fundamental 수집기.
pub struct FundamentalCollector<'a, P: ?Sized, S: ?Sized> {
    provider: &'a P,
    store: &'a S,
    config: &'a FundamentalCollectConfig,
    shutdown: CancellationToken,
    /// 패스 커서 (마지막 처리 티커의 seq)
    cursor: Option<i64>,
    checkpoint: CollectorCheckpoint,
    stats: CollectionStats,
}

impl<'a, P, S> FundamentalCollector<'a, P, S>
where
    P: MarketDataProvider + ?Sized,
    S: TickerStore + CheckpointStore + ?Sized,
{
    pub fn new(
        provider: &'a P,
        store: &'a S,
        config: &'a FundamentalCollectConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            provider,
            store,
            config,
            shutdown,
            cursor: None,
            checkpoint: CollectorCheckpoint::new(
                FUNDAMENTAL_COLLECT_WORKFLOW,
                CheckpointStatus::Running,
            ),
            stats: CollectionStats::new(),
        }
    }

    /// 수집 실행.
    ///
    /// 저장소 에러만 호출자에게 전달되고, 티커별 조회 실패는 기록 후 계속합니다.
    pub async fn run(mut self, mode: RunMode) -> Result<CollectionStats> {
        let start = Instant::now();
        let mut state = self.initial_state().await?;

        info!(
            batch_size = self.config.batch_size,
            minutes_to_wait = self.config.minutes_to_wait,
            mode = ?mode,
            "Fundamental 수집 시작"
        );

        while !self.shutdown.is_cancelled() {
            state = match state {
                CollectorState::FetchingBatch => self.fetch_batch().await?,
                CollectorState::RateLimitedWait { until, wait } => {
                    self.wait_cooldown(until, wait).await?
                }
                CollectorState::IdlePoll => {
                    self.stats.passes += 1;
                    self.cursor = None;
                    checkpoint::save_status(
                        self.store,
                        &mut self.checkpoint,
                        CheckpointStatus::Idle,
                    )
                    .await?;

                    if mode == RunMode::UntilIdle {
                        info!("미수집 티커 처리 완료");
                        break;
                    }

                    info!(
                        minutes = self.config.idle_poll_minutes,
                        "패스 완료, 다음 패스까지 대기"
                    );
                    self.sleep(self.config.idle_poll_interval()).await;
                    CollectorState::FetchingBatch
                }
            };
        }

        if self.shutdown.is_cancelled() {
            info!(last_symbol = ?self.checkpoint.last_symbol, "종료 신호 수신, 수집 중단");
        }

        self.stats.elapsed = start.elapsed();
        Ok(self.stats)
    }

    /// 저장된 체크포인트로 시작 상태 결정.
    async fn initial_state(&mut self) -> Result<CollectorState> {
        self.checkpoint = checkpoint::load_or_new(self.store, FUNDAMENTAL_COLLECT_WORKFLOW).await?;

        let now = Utc::now();
        match self.checkpoint.active_cooldown(now) {
            Some(until) => {
                let wait = (until - now).to_std().unwrap_or_default();
                info!(
                    until = %until,
                    remaining_secs = wait.as_secs(),
                    "이전 Rate limit 대기 이어서 진행"
                );
                Ok(CollectorState::RateLimitedWait { until, wait })
            }
            None => {
                checkpoint::save_status(self.store, &mut self.checkpoint, CheckpointStatus::Running)
                    .await?;
                Ok(CollectorState::FetchingBatch)
            }
        }
    }

    /// 배치 하나 처리.
    async fn fetch_batch(&mut self) -> Result<CollectorState> {
        let batch = self
            .store
            .next_unfetched_batch(self.config.batch_size, self.cursor)
            .await?;

        if batch.is_empty() {
            return Ok(CollectorState::IdlePoll);
        }

        if let Some(state) = self.check_quota(batch.len()).await? {
            return Ok(state);
        }

        debug!(
            size = batch.len(),
            after_seq = ?self.cursor,
            "배치 처리 시작"
        );

        for (idx, ticker) in batch.iter().enumerate() {
            if self.shutdown.is_cancelled() {
                break;
            }
            if idx > 0 && self.config.request_delay_ms > 0 {
                self.sleep(self.config.request_delay()).await;
                if self.shutdown.is_cancelled() {
                    break;
                }
            }

            if let Some(state) = self.fetch_one(ticker).await? {
                return Ok(state);
            }

            if self.stats.total % PROGRESS_LOG_INTERVAL == 0 {
                info!(
                    processed = self.stats.total,
                    success = self.stats.success,
                    errors = self.stats.errors,
                    "Fundamental 수집 진행"
                );
            }
        }

        checkpoint::save_status(self.store, &mut self.checkpoint, CheckpointStatus::Running)
            .await?;
        Ok(CollectorState::FetchingBatch)
    }

    /// 티커 하나 처리. Rate limit이면 대기 상태 반환.
    async fn fetch_one(&mut self, ticker: &TickerRecord) -> Result<Option<CollectorState>> {
        let symbol = ticker.symbol();
        self.stats.total += 1;

        match self.provider.fetch_fundamentals(&symbol).await {
            Ok(payload) => match self
                .store
                .mark_fetched(&ticker.code, &ticker.exchange, payload)
                .await
            {
                Ok(true) => {
                    self.stats.success += 1;
                    self.checkpoint.total_processed += 1;
                    debug!(symbol = %symbol, "Fundamental 저장");
                }
                Ok(false) => {
                    debug!(symbol = %symbol, "이미 수집된 티커");
                }
                Err(e) if e.is_payload_rejected() => {
                    self.stats.errors += 1;
                    warn!(symbol = %symbol, error = %e, "Fundamental 저장 불가, 다음 패스에서 재시도");
                }
                Err(e) => return Err(e.into()),
            },
            Err(e) if e.is_rate_limited() => {
                self.stats.rate_limited += 1;
                warn!(symbol = %symbol, "Rate limit 초과");
                return self.enter_cooldown().await.map(Some);
            }
            Err(e @ (EodhdError::NoData { .. } | EodhdError::NotFound(_))) => {
                self.stats.empty += 1;
                warn!(symbol = %symbol, error = %e, "Fundamental 데이터 없음, 다음 패스에서 재시도");
            }
            Err(e) => {
                self.stats.errors += 1;
                warn!(symbol = %symbol, error = %e, "Fundamental 조회 실패, 다음 패스에서 재시도");
            }
        }

        self.cursor = Some(ticker.seq);
        self.checkpoint.last_symbol = Some(symbol);
        Ok(None)
    }

    /// 잔여 API 호출 수 확인. 부족하면 대기 상태 반환.
    async fn check_quota(&mut self, batch_len: usize) -> Result<Option<CollectorState>> {
        if self.config.api_calls_per_ticker == 0 {
            return Ok(None);
        }
        let required = (batch_len as i64).saturating_mul(self.config.api_calls_per_ticker as i64);

        match self.provider.remaining_api_calls().await {
            Ok(Some(remaining)) if remaining < required => {
                warn!(remaining, required, "잔여 API 호출 수 부족");
                self.enter_cooldown().await.map(Some)
            }
            Ok(remaining) => {
                debug!(?remaining, required, "잔여 API 호출 수 확인");
                Ok(None)
            }
            Err(e) if e.is_rate_limited() => {
                warn!("잔여 호출 수 조회 중 Rate limit 초과");
                self.enter_cooldown().await.map(Some)
            }
            Err(e) => {
                warn!(error = %e, "잔여 API 호출 수 조회 실패, 확인 없이 진행");
                Ok(None)
            }
        }
    }

    /// Rate limit 대기 상태로 전환하고 만료 시각 저장.
    async fn enter_cooldown(&mut self) -> Result<CollectorState> {
        let wait = self.config.rate_limit_wait();
        let now = Utc::now();
        let until = TimeDelta::from_std(wait)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        checkpoint::save_cooldown(self.store, &mut self.checkpoint, until).await?;
        info!(
            until = %until,
            minutes = self.config.minutes_to_wait,
            "Rate limit 대기 시작"
        );

        Ok(CollectorState::RateLimitedWait { until, wait })
    }

    /// 대기 후 커서를 유지한 채 배치 처리로 복귀.
    async fn wait_cooldown(&mut self, until: DateTime<Utc>, wait: Duration) -> Result<CollectorState> {
        self.sleep(wait).await;
        if self.shutdown.is_cancelled() {
            // 만료 시각은 체크포인트에 남겨 재시작 시 이어서 대기
            return Ok(CollectorState::RateLimitedWait { until, wait });
        }

        info!("Rate limit 대기 종료, 수집 재개");
        checkpoint::save_status(self.store, &mut self.checkpoint, CheckpointStatus::Running)
            .await?;
        Ok(CollectorState::FetchingBatch)
    }

    /// 종료 신호로 중단 가능한 대기
    async fn sleep(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.shutdown.cancelled() => {}
        }
    }
}

/// Fundamental 수집 실행.
pub async fn collect_fundamentals<P, S>(
    provider: &P,
    store: &S,
    config: &FundamentalCollectConfig,
    mode: RunMode,
    shutdown: CancellationToken,
) -> Result<CollectionStats>
where
    P: MarketDataProvider + ?Sized,
    S: TickerStore + CheckpointStore + ?Sized,
{
    FundamentalCollector::new(provider, store, config, shutdown)
        .run(mode)
        .await
}
