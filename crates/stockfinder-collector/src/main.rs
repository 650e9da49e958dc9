//! StockFinder data collector CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use stockfinder_collector::modules::{self, RunMode, TickerSyncOptions};
use stockfinder_collector::CollectorConfig;
use stockfinder_core::config::process_env;
use stockfinder_core::{init_logging, LogConfig};
use stockfinder_data::{CheckpointStore, MongoStore, TickerStore};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "stockfinder-collector")]
#[command(about = "StockFinder EODHD fundamentals collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// 로그 레벨 (LOG_LEVEL 환경변수보다 우선)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Default)]
enum Commands {
    /// 티커 동기화 후 종료 신호까지 Fundamental 수집 (기본)
    #[default]
    Run,

    /// 티커 목록만 동기화
    SyncTickers {
        /// 저장소 상태와 무관하게 동기화
        #[arg(long)]
        force: bool,
    },

    /// 미수집 티커를 한 번 처리하고 종료
    Collect,

    /// 티커 수와 체크포인트 출력
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(LogConfig::from_lookup(&process_env, cli.log_level.as_deref()))?;

    tracing::info!("StockFinder Collector 시작");

    let config = CollectorConfig::from_lookup(&process_env).context("설정 로드 실패")?;
    tracing::debug!(?config, "설정 로드 완료");

    let store = MongoStore::connect(&config.mongo)
        .await
        .context("MongoDB 연결 실패")?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("종료 신호 수신");
                shutdown.cancel();
            }
        });
    }

    match cli.command.unwrap_or_default() {
        Commands::Run => {
            let provider = config.eodhd.client()?;
            if let Some(stats) = modules::ensure_tickers(
                &provider,
                &store,
                &config.ticker_sync,
                TickerSyncOptions::default(),
            )
            .await?
            {
                stats.log_summary();
            }

            let stats = modules::collect_fundamentals(
                &provider,
                &store,
                &config.fundamental_collect,
                RunMode::Continuous,
                shutdown,
            )
            .await?;
            stats.log_summary("Fundamental 수집");
        }
        Commands::SyncTickers { force } => {
            let provider = config.eodhd.client()?;
            match modules::ensure_tickers(
                &provider,
                &store,
                &config.ticker_sync,
                TickerSyncOptions { force },
            )
            .await?
            {
                Some(stats) => stats.log_summary(),
                None => tracing::info!("동기화 불필요 (--force로 강제 실행)"),
            }
        }
        Commands::Collect => {
            let provider = config.eodhd.client()?;
            if let Some(stats) = modules::ensure_tickers(
                &provider,
                &store,
                &config.ticker_sync,
                TickerSyncOptions::default(),
            )
            .await?
            {
                stats.log_summary();
            }

            let stats = modules::collect_fundamentals(
                &provider,
                &store,
                &config.fundamental_collect,
                RunMode::UntilIdle,
                shutdown,
            )
            .await?;
            stats.log_summary("Fundamental 수집");
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Status => {
            let total = store.count_tickers(None).await?;
            let fetched = store.count_tickers(Some(true)).await?;
            let checkpoints = store.list_checkpoints().await?;

            let status = json!({
                "tickers": {
                    "total": total,
                    "fetched": fetched,
                    "unfetched": total.saturating_sub(fetched),
                },
                "checkpoints": checkpoints,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    tracing::info!("StockFinder Collector 종료");
    Ok(())
}
