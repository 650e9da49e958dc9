//! StockFinder API 서버.
//!
//! 수집된 티커와 Fundamental 데이터를 읽기 전용으로 제공합니다.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use axum::Router;
use clap::Parser;
use stockfinder_api::routes::create_api_router;
use stockfinder_api::state::AppState;
use stockfinder_api::ApiConfig;
use stockfinder_core::config::process_env;
use stockfinder_core::{init_logging, LogConfig};
use stockfinder_data::MongoStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "stockfinder-api")]
#[command(about = "StockFinder read-only REST API", long_about = None)]
#[command(version)]
struct Cli {
    /// 로그 레벨 (LOG_LEVEL 환경변수보다 우선)
    #[arg(long)]
    log_level: Option<String>,
}

/// 라우터에 공통 미들웨어 적용.
fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    init_logging(LogConfig::from_lookup(&process_env, cli.log_level.as_deref()))?;

    info!("Starting StockFinder API server...");

    let config = ApiConfig::from_lookup(&process_env)?;
    let store = MongoStore::connect(&config.mongo).await?;

    let state = Arc::new(AppState::new(store));
    info!(version = %state.version, "Application state initialized");

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// Ctrl+C 또는 SIGTERM 대기.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
