//! # kubedeck-app
//!
//! kubedeck 바이너리 진입점.
//! DI 와이어링, 연결 모니터 실행, 라이프사이클 관리.

mod lifecycle;
mod status;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use kubedeck_core::config::AppConfig;
use kubedeck_core::config_manager::{ConfigManager, CONFIG_FILE_NAME};
use kubedeck_core::ports::auth::AuthProvider;
use kubedeck_core::ports::resource_client::ResourceClient;
use kubedeck_network::auth::TokenAuthProvider;
use kubedeck_network::connectivity::ConnectionMonitor;
use kubedeck_network::http_client::KubeHttpClient;
use kubedeck_network::retrying_client::RetryingClient;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;

/// Kubernetes/OpenShift 터미널 대시보드
#[derive(Parser, Debug)]
#[command(name = "kubedeck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API 서버 URL (설정 파일 값 덮어쓰기)
    #[arg(long, short = 's')]
    server: Option<String>,

    /// Bearer 토큰 (미지정 시 설정 파일 → KUBEDECK_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// 기본 네임스페이스
    #[arg(long, short = 'n')]
    namespace: Option<String>,

    /// 컨텍스트 이름
    #[arg(long)]
    context: Option<String>,

    /// 설정 파일 경로 (기본: 플랫폼별 설정 디렉토리)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 헬스체크 주기 (초)
    #[arg(long)]
    health_interval_secs: Option<u64>,

    /// 1회 연결 확인 후 JSON 리포트 출력하고 종료
    #[arg(long)]
    once: bool,
}

/// 설정 파일 경로 결정 (CLI 인자 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/io.kubedeck.kubedeck/config.json`
/// - Windows: `%APPDATA%\kubedeck\kubedeck\config\config.json`
/// - Linux: `~/.config/kubedeck/config.json`
fn resolve_config_path(config: Option<&PathBuf>) -> PathBuf {
    config
        .cloned()
        .or_else(|| {
            ProjectDirs::from("io", "kubedeck", "kubedeck")
                .map(|p| p.config_dir().join(CONFIG_FILE_NAME))
        })
        .unwrap_or_else(|| PathBuf::from(".kubedeck").join(CONFIG_FILE_NAME))
}

/// CLI 인자로 설정 오버라이드 (파일에는 저장하지 않음)
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(ref server) = args.server {
        config.cluster.server_url = server.clone();
    }
    if let Some(ref token) = args.token {
        config.cluster.token = Some(token.clone());
    }
    if let Some(ref namespace) = args.namespace {
        config.cluster.namespace = namespace.clone();
    }
    if let Some(ref context) = args.context {
        config.cluster.context_name = context.clone();
    }
    if let Some(secs) = args.health_interval_secs {
        config.monitor.health_check_interval_ms = secs.saturating_mul(1000);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화
    let log_filter = format!(
        "kubedeck={},kubedeck_app={},kubedeck_core={},kubedeck_network={}",
        args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("kubedeck 시작");

    // 설정 로드
    let config_path = resolve_config_path(args.config.as_ref());
    let config_manager = ConfigManager::with_path(config_path.clone())
        .with_context(|| format!("설정 로드 실패: {}", config_path.display()))?;
    info!("설정 파일: {}", config_manager.config_path().display());

    let mut config = config_manager.get();
    apply_overrides(&mut config, &args);
    config.monitor.validate()?;
    info!(
        "클러스터: {} (컨텍스트 {})",
        config.cluster.server_url, config.cluster.context_name
    );

    let lifecycle = LifecycleManager::new();

    // ── 어댑터 생성 (DI 와이어링) ──

    // 1. 인증
    let token_auth = Arc::new(TokenAuthProvider::from_config(&config.cluster));
    let auth: Arc<dyn AuthProvider> = token_auth.clone();

    // 2. REST 클라이언트 + 재시도 데코레이터
    let http_client = Arc::new(KubeHttpClient::new(
        &config.cluster,
        token_auth,
        config.monitor.request_timeout(),
    )?);
    let client: Arc<dyn ResourceClient> = Arc::new(
        RetryingClient::new(http_client, config.retry.max_retries)
            .with_cancellation(lifecycle.token().child_token()),
    );

    // 3. 연결 모니터
    let monitor = ConnectionMonitor::new(auth, client, config.monitor.clone());
    monitor.add_event_listener(|event| status::log_event(&event));
    monitor.start(lifecycle.token())?;

    if args.once {
        let limit = config.monitor.request_timeout() + Duration::from_secs(1);
        let report = status::run_once(&monitor, limit).await;
        println!("{}", serde_json::to_string_pretty(&report)?);

        let healthy = report["healthy"].as_bool().unwrap_or(false);
        monitor.stop();
        lifecycle.shutdown();
        if !healthy {
            std::process::exit(1);
        }
        return Ok(());
    }

    // 4. 상태 리포터
    let reporter_monitor = monitor.clone();
    let reporter_period = config.monitor.health_check_interval();
    let reporter_token = lifecycle.token().child_token();
    tokio::spawn(async move {
        status::run_status_reporter(reporter_monitor, reporter_period, reporter_token).await;
    });

    info!("kubedeck 실행 중 (Ctrl+C로 종료)");

    if let Err(e) = lifecycle.wait_for_signal().await {
        warn!("시그널 핸들러 등록 실패: {e}");
        lifecycle.shutdown();
    }

    monitor.stop();
    info!("kubedeck 종료");
    Ok(())
}
