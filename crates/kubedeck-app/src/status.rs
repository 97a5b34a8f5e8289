//! 연결 상태 출력.
//!
//! 이벤트 로깅 리스너, 주기적 상태 요약, `--once` 모드 JSON 리포트.

use kubedeck_core::models::connection::{
    ConnectionEvent, ConnectionEventType, ConnectionInfo, ConnectionStatus, HealthCheck, Metrics,
};
use kubedeck_network::connectivity::ConnectionMonitor;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 연결 이벤트를 tracing으로 기록 (리스너 워커 스레드에서 호출됨)
pub fn log_event(event: &ConnectionEvent) {
    match event.event_type {
        ConnectionEventType::Error => {
            warn!("[연결] {}: {}", event.message, event.error);
        }
        ConnectionEventType::HealthCheck => {
            debug!("[연결] {}", event.message);
        }
        ConnectionEventType::Connected
        | ConnectionEventType::Disconnected
        | ConnectionEventType::Reconnecting => {
            info!("[연결] {}", event.message);
        }
    }
}

/// 한 줄 상태 요약
pub fn summary_line(info: &ConnectionInfo, metrics: &Metrics) -> String {
    let mut line = format!(
        "상태={} 컨텍스트={} 네임스페이스={}",
        info.status, info.context_name, info.namespace
    );

    if info.status == ConnectionStatus::Connected {
        let platform = if info.is_openshift {
            "OpenShift"
        } else {
            "Kubernetes"
        };
        line.push_str(&format!(
            " 클러스터={} ({platform} {}) 지연={}ms",
            info.cluster_name,
            info.server_version,
            metrics.average_latency.as_millis()
        ));
    } else if !info.error.is_empty() {
        line.push_str(&format!(" 에러={}", info.error));
    }

    line.push_str(&format!(
        " 요청={} 에러수={} 연결={} 가동={}s",
        metrics.request_count,
        metrics.error_count,
        metrics.total_connections,
        metrics.uptime.as_secs()
    ));
    line
}

/// `--once` 모드 리포트
pub fn once_report(
    info: &ConnectionInfo,
    metrics: &Metrics,
    check: &HealthCheck,
) -> serde_json::Value {
    serde_json::json!({
        "healthy": check.success && info.status == ConnectionStatus::Connected,
        "connection": info,
        "health_check": check,
        "metrics": metrics,
    })
}

/// 최초 연결 시도가 끝날 때까지 대기 (`Connecting` 벗어남 또는 `limit` 경과)
pub async fn wait_for_initial_connect(monitor: &ConnectionMonitor, limit: Duration) {
    let settled = tokio::time::timeout(limit, async {
        while monitor.status().status == ConnectionStatus::Connecting {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    if settled.is_err() {
        warn!("최초 연결 대기 시간 초과: {limit:?}");
    }
}

/// `--once` 모드: 최초 연결 대기 → 강제 헬스체크 → 리포트
///
/// 리포트의 연결 정보는 헬스체크 결과가 반영된 이후의 상태다.
pub async fn run_once(monitor: &ConnectionMonitor, limit: Duration) -> serde_json::Value {
    wait_for_initial_connect(monitor, limit).await;
    let check = monitor.force_health_check().await;
    once_report(&monitor.status(), &monitor.metrics(), &check)
}

/// 주기적 상태 요약 루프: 토큰 취소 시 종료
pub async fn run_status_reporter(
    monitor: ConnectionMonitor,
    period: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("상태 리포터 종료");
                break;
            }
            _ = ticker.tick() => {
                info!("{}", summary_line(&monitor.status(), &monitor.metrics()));
            }
        }
    }
}
