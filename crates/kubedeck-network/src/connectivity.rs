//! 클러스터 연결 상태 관리.
//!
//! 주기적 헬스체크로 연결 상태를 감지하고, 실패 시 자동 재연결한다.
//! 상태/메트릭/이벤트/리스너는 하나의 `RwLock` 아래에 있으며,
//! 상태 변경과 그에 대응하는 이벤트는 같은 임계 구역에서 기록된다.
//!
//! 상태 전이:
//! `Unknown → Connecting → {Connected, Error}`, `Connected → Error`,
//! `Error → Reconnecting → {Connected, Error}`, 모든 상태 `→ Disconnected` (stop 또는 상위 토큰 취소)

use chrono::Utc;
use kubedeck_core::config::MonitorConfig;
use kubedeck_core::error::CoreError;
use kubedeck_core::models::connection::{
    ConnectionEvent, ConnectionEventType, ConnectionInfo, ConnectionStatus, Details, HealthCheck,
    Metrics,
};
use kubedeck_core::models::resource::ServerInfo;
use kubedeck_core::ports::auth::AuthProvider;
use kubedeck_core::ports::resource_client::ResourceClient;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::event_log::{EventLog, ListenerSet};

/// 모니터 라이프사이클 (1회용)
enum Lifecycle {
    NotStarted,
    Running(CancellationToken),
    Stopped,
}

/// 락으로 보호되는 공유 상태
struct MonitorState {
    info: ConnectionInfo,
    metrics: Metrics,
    events: EventLog,
    listeners: ListenerSet,
    started_at: Option<Instant>,
    lifecycle: Lifecycle,
}

impl MonitorState {
    fn is_running(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Running(_))
    }

    /// 이벤트 기록 + 리스너 큐 전달
    ///
    /// 리스너 콜백은 워커 스레드에서 실행되므로 락 안에서 호출해도 콜백이 실행되지 않는다.
    fn emit(&mut self, event: ConnectionEvent) {
        self.listeners.dispatch(&event);
        self.events.push(event);
    }
}

struct MonitorInner {
    auth: Arc<dyn AuthProvider>,
    client: Arc<dyn ResourceClient>,
    config: MonitorConfig,
    state: RwLock<MonitorState>,
    /// 자동 재연결 루프 실행 중 여부 (동시에 하나만)
    reconnecting: AtomicBool,
}

/// 클러스터 연결 모니터
///
/// 복제 비용이 낮은 핸들이며, 모든 복제본은 같은 상태를 공유한다.
/// 한 번 `stop()`한 모니터는 다시 시작할 수 없다.
#[derive(Clone)]
pub struct ConnectionMonitor {
    inner: Arc<MonitorInner>,
}

impl ConnectionMonitor {
    /// 새 연결 모니터 생성 (`Unknown` 상태)
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        client: Arc<dyn ResourceClient>,
        config: MonitorConfig,
    ) -> Self {
        let state = MonitorState {
            info: ConnectionInfo::default(),
            metrics: Metrics::default(),
            events: EventLog::new(config.max_events),
            listeners: ListenerSet::new(),
            started_at: None,
            lifecycle: Lifecycle::NotStarted,
        };

        Self {
            inner: Arc::new(MonitorInner {
                auth,
                client,
                config,
                state: RwLock::new(state),
                reconnecting: AtomicBool::new(false),
            }),
        }
    }

    /// 모니터 시작
    ///
    /// `parent`의 자식 토큰을 만들어 최초 연결 시도와 헬스체크 루프를 띄운다.
    /// 실행 중이면 `AlreadyStarted`, 중지된 모니터면 `MonitorStopped`.
    /// tokio 런타임 안에서 호출해야 한다.
    pub fn start(&self, parent: &CancellationToken) -> Result<(), CoreError> {
        let token = {
            let mut state = self.inner.state.write();
            match state.lifecycle {
                Lifecycle::Running(_) => return Err(CoreError::AlreadyStarted),
                Lifecycle::Stopped => return Err(CoreError::MonitorStopped),
                Lifecycle::NotStarted => {}
            }

            let token = parent.child_token();
            state.lifecycle = Lifecycle::Running(token.clone());
            state.started_at = Some(Instant::now());
            state.info.status = ConnectionStatus::Connecting;
            state.info.context_name = self.inner.auth.context();
            state.info.namespace = self.inner.auth.namespace();

            let event = ConnectionEvent::new(ConnectionEventType::Connected, "연결 모니터 시작")
                .with_detail(
                    "health_check_interval_ms",
                    self.inner.config.health_check_interval_ms,
                );
            state.emit(event);
            token
        };

        info!(
            "연결 모니터 시작: 헬스체크={}ms, 타임아웃={}ms, 재연결 {}회",
            self.inner.config.health_check_interval_ms,
            self.inner.config.request_timeout_ms,
            self.inner.config.retry_attempts
        );

        // 최초 연결 시도
        let inner = Arc::clone(&self.inner);
        let initial_token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = initial_token.cancelled() => debug!("최초 연결 시도 취소됨"),
                result = inner.connect_once(None) => {
                    if let Err(e) = result {
                        warn!("최초 연결 실패: {e}");
                    }
                }
            }
        });

        // 헬스체크 루프
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            inner.health_check_loop(token).await;
        });

        Ok(())
    }

    /// 모니터 중지
    ///
    /// 시작하지 않았거나 이미 중지된 경우 아무것도 하지 않는다.
    pub fn stop(&self) {
        let mut state = self.inner.state.write();
        let token = match std::mem::replace(&mut state.lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(token) => token,
            previous => {
                state.lifecycle = previous;
                debug!("연결 모니터가 실행 중이 아님, stop 무시");
                return;
            }
        };

        token.cancel();
        state.info.status = ConnectionStatus::Disconnected;
        state.emit(ConnectionEvent::new(
            ConnectionEventType::Disconnected,
            "연결 모니터 중지",
        ));
        info!("연결 모니터 중지");
    }

    /// 현재 연결 정보 (복제본)
    pub fn status(&self) -> ConnectionInfo {
        self.inner.state.read().info.clone()
    }

    /// 현재 메트릭 (복제본)
    pub fn metrics(&self) -> Metrics {
        let state = self.inner.state.read();
        let mut metrics = state.metrics.clone();
        metrics.uptime = match (state.is_running(), state.started_at) {
            (true, Some(started_at)) => started_at.elapsed(),
            _ => Duration::ZERO,
        };
        metrics
    }

    /// 최근 `limit`개 이벤트 (시간순). `limit`이 0이면 전체.
    pub fn events(&self, limit: usize) -> Vec<ConnectionEvent> {
        self.inner.state.read().events.recent(limit)
    }

    /// 현재 상태가 정확히 `Connected`인지
    pub fn is_healthy(&self) -> bool {
        self.inner.state.read().info.status == ConnectionStatus::Connected
    }

    /// 이벤트 리스너 등록: 이후 발생하는 모든 이벤트를 순서대로 전달받는다
    pub fn add_event_listener<F>(&self, listener: F)
    where
        F: Fn(ConnectionEvent) + Send + 'static,
    {
        self.inner.state.write().listeners.register(listener);
    }

    /// 헬스체크 즉시 실행
    ///
    /// 주기 타이머와 무관하게 동기적으로 실행하며, 실행 중이면 결과를 상태에 반영한다.
    /// 실패해도 자동 재연결은 시작하지 않는다.
    pub async fn force_health_check(&self) -> HealthCheck {
        let check = self.inner.perform_health_check().await;
        self.inner.record_health_check(&check);
        check
    }

    /// 수동 재연결: 1회 연결 시도를 동기적으로 실행
    pub async fn reconnect(&self) -> Result<(), CoreError> {
        if !self
            .inner
            .transition(ConnectionStatus::Reconnecting, || {
                ConnectionEvent::new(ConnectionEventType::Reconnecting, "수동 재연결 요청")
            })
        {
            return Err(CoreError::NotRunning);
        }

        info!("수동 재연결 시도");
        self.inner.connect_once(None).await
    }
}

impl MonitorInner {
    /// 실행 중일 때만 상태를 바꾸고 이벤트를 기록한다
    fn transition<F>(&self, status: ConnectionStatus, event: F) -> bool
    where
        F: FnOnce() -> ConnectionEvent,
    {
        let mut state = self.state.write();
        if !state.is_running() {
            return false;
        }
        state.info.status = status;
        state.emit(event());
        true
    }

    fn current_status(&self) -> ConnectionStatus {
        self.state.read().info.status
    }

    fn timeout_error(&self) -> CoreError {
        CoreError::Timeout {
            timeout_ms: self.config.request_timeout_ms,
        }
    }

    /// 자격증명 검증 → 연결 테스트 → 서버 정보 조회
    async fn establish(&self) -> Result<ServerInfo, CoreError> {
        self.auth
            .is_valid()
            .await
            .map_err(|e| e.at_stage("자격증명 검증"))?;
        self.client
            .test_connection()
            .await
            .map_err(|e| e.at_stage("연결 테스트"))?;
        self.client
            .server_info()
            .await
            .map_err(|e| e.at_stage("서버 정보 조회"))
    }

    /// 타임아웃이 걸린 1회 연결 시도 + 결과 기록
    ///
    /// 성공/실패 모두 이벤트를 정확히 하나 남긴다.
    async fn connect_once(&self, attempt: Option<u32>) -> Result<(), CoreError> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.config.request_timeout(), self.establish())
            .await
            .unwrap_or_else(|_| Err(self.timeout_error().at_stage("연결 시도")));
        let latency = started.elapsed();
        let now = Utc::now();

        let mut state = self.state.write();
        if !state.is_running() {
            debug!("모니터 중지 이후 연결 결과 무시");
            return outcome.map(|_| ());
        }

        state.info.last_checked = Some(now);
        state.metrics.last_request_time = Some(now);

        match outcome {
            Ok(server_info) => {
                state.info.status = ConnectionStatus::Connected;
                state.info.context_name = self.auth.context();
                state.info.namespace = self.auth.namespace();
                state.info.server_version = server_info.git_version.clone();
                state.info.cluster_name = server_info.cluster_name.clone();
                state.info.host = server_info.host.clone();
                state.info.is_openshift = server_info.is_openshift;
                state.info.connected_at = Some(now);
                state.info.error.clear();
                state.metrics.total_connections += 1;
                state.metrics.record_latency(latency);

                let mut event = ConnectionEvent::new(
                    ConnectionEventType::Connected,
                    format!("클러스터 연결 성공 ({})", server_info.git_version),
                )
                .with_detail("server_version", server_info.git_version)
                .with_detail("latency_ms", latency.as_millis() as u64);
                if let Some(attempt) = attempt {
                    event = event.with_detail("attempt", attempt);
                }
                state.emit(event);
                info!("클러스터 연결 성공: {}", state.info.host);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                state.info.status = ConnectionStatus::Error;
                state.info.error = message.clone();
                state.metrics.error_count += 1;

                let mut event =
                    ConnectionEvent::new(ConnectionEventType::Error, "클러스터 연결 실패")
                        .with_error(&message);
                if let Some(attempt) = attempt {
                    event = event.with_detail("attempt", attempt);
                }
                state.emit(event);
                warn!("클러스터 연결 실패: {message}");
                Err(e)
            }
        }
    }

    /// 헬스체크 실행 (`test_connection`만, 재인증 없음)
    async fn perform_health_check(&self) -> HealthCheck {
        let timestamp = Utc::now();
        let started = Instant::now();
        let request = self.client.test_connection();
        let result = tokio::time::timeout(self.config.request_timeout(), request)
            .await
            .unwrap_or_else(|_| Err(self.timeout_error()));
        let duration = started.elapsed();

        let mut details = Details::new();
        details.insert(
            "latency_ms".to_string(),
            serde_json::json!(duration.as_millis() as u64),
        );

        match result {
            Ok(()) => HealthCheck {
                timestamp,
                duration,
                success: true,
                error: String::new(),
                details,
            },
            Err(e) => HealthCheck {
                timestamp,
                duration,
                success: false,
                error: e.to_string(),
                details,
            },
        }
    }

    /// 헬스체크 결과를 상태/메트릭/이벤트에 반영 (실행 중일 때만)
    fn record_health_check(&self, check: &HealthCheck) {
        let mut state = self.state.write();
        if !state.is_running() {
            return;
        }

        state.info.last_checked = Some(check.timestamp);
        state.metrics.last_request_time = Some(check.timestamp);

        if check.success {
            let previous = state.info.status;
            state.info.status = ConnectionStatus::Connected;
            state.info.error.clear();
            state.metrics.request_count += 1;
            state.metrics.record_latency(check.duration);

            let event = if previous == ConnectionStatus::Connected {
                ConnectionEvent::new(ConnectionEventType::HealthCheck, "헬스체크 성공")
            } else {
                state.info.connected_at = Some(check.timestamp);
                info!("헬스체크로 연결 복구 확인 (이전 상태: {previous})");
                ConnectionEvent::new(ConnectionEventType::Connected, "헬스체크로 연결 복구")
            };
            state.emit(event.with_detail("latency_ms", check.duration.as_millis() as u64));
        } else {
            state.info.status = ConnectionStatus::Error;
            state.info.error = check.error.clone();
            state.metrics.error_count += 1;
            state.emit(
                ConnectionEvent::new(ConnectionEventType::Error, "헬스체크 실패")
                    .with_error(&check.error),
            );
            warn!("헬스체크 실패: {}", check.error);
        }
    }

    /// 주기적 헬스체크 루프: 토큰 취소 시 종료
    async fn health_check_loop(self: Arc<Self>, token: CancellationToken) {
        let period = self.config.health_check_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("헬스체크 루프 종료");
                    self.finish_cancelled();
                    break;
                }
                _ = ticker.tick() => {
                    let check = self.perform_health_check().await;
                    if token.is_cancelled() {
                        continue;
                    }
                    self.record_health_check(&check);
                    if !check.success {
                        self.spawn_reconnect(&token);
                    }
                }
            }
        }
    }

    /// 상위 토큰 취소로 루프가 끝난 경우 라이프사이클을 `Stopped`로 마감
    ///
    /// `stop()`으로 이미 중지된 경우에는 아무것도 하지 않는다.
    fn finish_cancelled(&self) {
        let mut state = self.state.write();
        let Lifecycle::Running(current) = &state.lifecycle else {
            return;
        };
        if !current.is_cancelled() {
            return;
        }

        state.lifecycle = Lifecycle::Stopped;
        state.info.status = ConnectionStatus::Disconnected;
        state.emit(ConnectionEvent::new(
            ConnectionEventType::Disconnected,
            "상위 취소로 연결 모니터 종료",
        ));
        info!("상위 취소로 연결 모니터 종료");
    }

    /// 자동 재연결 루프 시작 (이미 실행 중이면 생략)
    fn spawn_reconnect(self: &Arc<Self>, token: &CancellationToken) {
        if self.reconnecting.swap(true, Ordering::SeqCst) {
            debug!("자동 재연결 진행 중, 추가 실행 생략");
            return;
        }

        let inner = Arc::clone(self);
        let token = token.clone();
        tokio::spawn(async move {
            inner.reconnect_loop(&token).await;
            inner.reconnecting.store(false, Ordering::SeqCst);
        });
    }

    /// 자동 재연결: `retry_delay * attempt` 간격으로 최대 `retry_attempts`회
    async fn reconnect_loop(&self, token: &CancellationToken) {
        let max_attempts = self.config.retry_attempts;
        if !self.transition(ConnectionStatus::Reconnecting, || {
            ConnectionEvent::new(ConnectionEventType::Reconnecting, "자동 재연결 시작")
                .with_detail("max_attempts", max_attempts)
        }) {
            return;
        }

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            info!("재연결 시도 {attempt}/{max_attempts}");

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!("재연결 취소됨");
                    return;
                }
                result = self.connect_once(Some(attempt)) => result,
            };

            let e = match result {
                Ok(()) => {
                    info!("재연결 성공 (시도 {attempt}회)");
                    return;
                }
                Err(e) => e,
            };
            last_error = e.to_string();

            if attempt < max_attempts {
                let delay = self.config.retry_delay() * attempt;
                warn!("재연결 실패 (시도 {attempt}/{max_attempts}): {e}, {delay:?} 후 재시도");
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("재연결 대기 중 취소됨");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }

                if self.current_status() == ConnectionStatus::Connected {
                    info!("헬스체크로 이미 복구됨, 재연결 중단");
                    return;
                }
            }
        }

        error!("재연결 {max_attempts}회 모두 실패");
        self.transition(ConnectionStatus::Error, || {
            ConnectionEvent::new(
                ConnectionEventType::Error,
                format!("재연결 {max_attempts}회 시도 모두 실패"),
            )
            .with_error(&last_error)
            .with_detail("attempts", max_attempts)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use kubedeck_core::models::resource::{ResourceKind, ResourceSummary};
    use std::sync::atomic::AtomicU32;

    struct StaticAuth {
        valid: bool,
    }

    #[async_trait]
    impl AuthProvider for StaticAuth {
        async fn is_valid(&self) -> Result<(), CoreError> {
            if self.valid {
                Ok(())
            } else {
                Err(CoreError::Auth("토큰 없음".to_string()))
            }
        }

        fn context(&self) -> String {
            "test-context".to_string()
        }

        fn namespace(&self) -> String {
            "test-ns".to_string()
        }
    }

    /// `fail_calls`에 해당하는 test_connection 호출(1부터)만 실패하는 클라이언트
    struct ScriptedClient {
        calls: AtomicU32,
        fail_calls: Vec<u32>,
        hang: bool,
    }

    impl ScriptedClient {
        fn new(fail_calls: Vec<u32>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_calls,
                hang: false,
            }
        }

        /// test_connection이 끝나지 않는 클라이언트
        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::new(vec![])
            }
        }
    }

    #[async_trait]
    impl ResourceClient for ScriptedClient {
        async fn test_connection(&self) -> Result<(), CoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail_calls.contains(&n) {
                Err(CoreError::Network("connection refused".to_string()))
            } else {
                Ok(())
            }
        }

        async fn server_info(&self) -> Result<ServerInfo, CoreError> {
            Ok(ServerInfo {
                git_version: "v1.29.3".to_string(),
                host: "https://api.test:6443".to_string(),
                cluster_name: "test-cluster".to_string(),
                is_openshift: true,
                ..ServerInfo::default()
            })
        }

        async fn list_namespaces(&self) -> Result<Vec<ResourceSummary>, CoreError> {
            Ok(vec![])
        }

        async fn list_resources(
            &self,
            _kind: ResourceKind,
            _namespace: &str,
        ) -> Result<Vec<ResourceSummary>, CoreError> {
            Ok(vec![])
        }

        async fn get_resource(
            &self,
            kind: ResourceKind,
            _namespace: &str,
            name: &str,
        ) -> Result<ResourceSummary, CoreError> {
            Err(CoreError::NotFound {
                resource_type: kind.to_string(),
                id: name.to_string(),
            })
        }

        fn current_namespace(&self) -> String {
            "test-ns".to_string()
        }

        fn set_current_namespace(&self, _namespace: &str) {}
    }

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            health_check_interval_ms: 10_000,
            request_timeout_ms: 1_000,
            max_events: 50,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
        }
    }

    fn monitor(valid_auth: bool, fail_calls: Vec<u32>) -> ConnectionMonitor {
        ConnectionMonitor::new(
            Arc::new(StaticAuth { valid: valid_auth }),
            Arc::new(ScriptedClient::new(fail_calls)),
            test_config(),
        )
    }

    #[test]
    fn fresh_monitor_is_unknown_with_no_events() {
        let mon = monitor(true, vec![]);
        assert_eq!(mon.status().status, ConnectionStatus::Unknown);
        assert!(mon.events(1000).is_empty());
        assert!(mon.events(0).is_empty());
        assert!(!mon.is_healthy());
        assert_eq!(mon.metrics().uptime, Duration::ZERO);
    }

    #[test]
    fn stop_before_start_is_noop() {
        let mon = monitor(true, vec![]);
        mon.stop();
        assert_eq!(mon.status().status, ConnectionStatus::Unknown);
        assert!(mon.events(0).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn start_connects_and_records_server_info() {
        let mon = monitor(true, vec![]);
        let root = CancellationToken::new();
        mon.start(&root).unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;

        let info = mon.status();
        assert_eq!(info.status, ConnectionStatus::Connected);
        assert_eq!(info.server_version, "v1.29.3");
        assert_eq!(info.cluster_name, "test-cluster");
        assert_eq!(info.context_name, "test-context");
        assert_eq!(info.namespace, "test-ns");
        assert!(info.is_openshift);
        assert!(info.error.is_empty());
        assert!(info.connected_at.is_some());
        assert!(mon.is_healthy());
        assert_eq!(mon.metrics().total_connections, 1);

        let events = mon.events(0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "연결 모니터 시작");
        assert_eq!(events[1].event_type, ConnectionEventType::Connected);

        mon.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_fails_without_resetting_state() {
        let mon = monitor(true, vec![]);
        let root = CancellationToken::new();
        mon.start(&root).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let before_events = mon.events(0);
        let before_metrics = mon.metrics();

        assert_matches!(mon.start(&root), Err(CoreError::AlreadyStarted));
        assert_eq!(mon.status().status, ConnectionStatus::Connected);
        assert_eq!(mon.events(0), before_events);
        assert_eq!(
            mon.metrics().total_connections,
            before_metrics.total_connections
        );

        mon.stop();
        assert_matches!(mon.start(&root), Err(CoreError::MonitorStopped));
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_auth_sets_error_status() {
        let mon = monitor(false, vec![]);
        mon.start(&CancellationToken::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let info = mon.status();
        assert_eq!(info.status, ConnectionStatus::Error);
        assert!(info.error.contains("자격증명 검증"));
        assert_eq!(mon.metrics().error_count, 1);

        let last = mon.events(1).pop().unwrap();
        assert_eq!(last.event_type, ConnectionEventType::Error);
        mon.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_sets_disconnected_and_ends_loop() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let mon = ConnectionMonitor::new(
            Arc::new(StaticAuth { valid: true }),
            client.clone(),
            test_config(),
        );
        mon.start(&CancellationToken::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        mon.stop();
        assert_eq!(mon.status().status, ConnectionStatus::Disconnected);
        assert_eq!(
            mon.events(1)[0].event_type,
            ConnectionEventType::Disconnected
        );

        let calls_at_stop = client.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), calls_at_stop);
        assert_eq!(mon.metrics().uptime, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_health_checks() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let mon = ConnectionMonitor::new(
            Arc::new(StaticAuth { valid: true }),
            client.clone(),
            test_config(),
        );
        let root = CancellationToken::new();
        mon.start(&root).unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;
        // 최초 연결 1회 + 헬스체크 2회
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);

        root.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);

        assert_eq!(mon.status().status, ConnectionStatus::Disconnected);
        assert_eq!(mon.metrics().uptime, Duration::ZERO);
        assert_matches!(mon.start(&root), Err(CoreError::MonitorStopped));
        let last = mon.events(1).pop().unwrap();
        assert_eq!(last.event_type, ConnectionEventType::Disconnected);

        // 이후 stop은 추가 이벤트 없음
        mon.stop();
        let disconnects = mon
            .events(0)
            .iter()
            .filter(|e| e.event_type == ConnectionEventType::Disconnected)
            .count();
        assert_eq!(disconnects, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_requests_are_bounded_by_request_timeout() {
        let mon = ConnectionMonitor::new(
            Arc::new(StaticAuth { valid: true }),
            Arc::new(ScriptedClient::hanging()),
            test_config(),
        );
        mon.start(&CancellationToken::new()).unwrap();

        // 최초 연결은 1초 타임아웃 후 실패
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let info = mon.status();
        assert_eq!(info.status, ConnectionStatus::Error);
        assert!(info.error.contains("1000ms"));

        let started = Instant::now();
        let check = mon.force_health_check().await;
        assert!(!check.success);
        assert!(check.error.contains("타임아웃"));
        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(check.duration >= Duration::from_secs(1));
        assert_eq!(mon.status().status, ConnectionStatus::Error);

        // 멈춘 요청이 루프를 막지 않음: t=10, 20, 30 헬스체크가 모두 실행됨
        tokio::time::sleep(Duration::from_secs(33)).await;
        let health_failures = mon
            .events(0)
            .iter()
            .filter(|e| e.message == "헬스체크 실패")
            .count();
        assert_eq!(health_failures, 4);
        mon.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_health_check_updates_metrics() {
        let mon = monitor(true, vec![]);
        mon.start(&CancellationToken::new()).unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;

        let metrics = mon.metrics();
        assert_eq!(metrics.request_count, 2);
        assert_eq!(metrics.error_count, 0);
        assert!(metrics.last_request_time.is_some());
        assert!(metrics.uptime >= Duration::from_secs(25));

        let last = mon.events(1).pop().unwrap();
        assert_eq!(last.event_type, ConnectionEventType::HealthCheck);
        mon.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn force_health_check_records_failure_without_reconnecting() {
        // 호출 2(강제 헬스체크)만 실패
        let client = Arc::new(ScriptedClient::new(vec![2]));
        let mon = ConnectionMonitor::new(
            Arc::new(StaticAuth { valid: true }),
            client.clone(),
            test_config(),
        );
        mon.start(&CancellationToken::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let check = mon.force_health_check().await;
        assert!(!check.success);
        assert!(check.error.contains("connection refused"));
        assert!(check.details.contains_key("latency_ms"));
        assert_eq!(mon.status().status, ConnectionStatus::Error);
        assert_eq!(mon.metrics().error_count, 1);

        // 재연결이 시작되지 않았으므로 추가 호출 없음
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        mon.stop();
    }

    #[tokio::test]
    async fn force_health_check_before_start_leaves_state_untouched() {
        let mon = monitor(true, vec![]);
        let check = mon.force_health_check().await;
        assert!(check.success);
        assert_eq!(mon.status().status, ConnectionStatus::Unknown);
        assert!(mon.events(0).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_reconnect_runs_single_attempt() {
        let mon = monitor(true, vec![]);
        assert_matches!(mon.reconnect().await, Err(CoreError::NotRunning));

        mon.start(&CancellationToken::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        mon.reconnect().await.unwrap();
        let events = mon.events(2);
        assert_eq!(events[0].event_type, ConnectionEventType::Reconnecting);
        assert_eq!(events[1].event_type, ConnectionEventType::Connected);
        assert_eq!(mon.metrics().total_connections, 2);
        mon.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn reconnection_exhaustion_sets_error_and_keeps_running() {
        // 최초 연결 후 모든 호출 실패: 헬스체크(2), 재연결(3,4,5)
        let client = Arc::new(ScriptedClient::new((2..=5).collect()));
        let mon = ConnectionMonitor::new(
            Arc::new(StaticAuth { valid: true }),
            client.clone(),
            test_config(),
        );
        mon.start(&CancellationToken::new()).unwrap();

        // t=10 헬스체크 실패, 재연결 t=10, 11, 13 → 모두 실패
        tokio::time::sleep(Duration::from_secs(15)).await;

        let info = mon.status();
        assert_eq!(info.status, ConnectionStatus::Error);
        let last = mon.events(1).pop().unwrap();
        assert_eq!(last.event_type, ConnectionEventType::Error);
        assert_eq!(last.details["attempts"], serde_json::json!(3));

        // 다음 헬스체크(t=20)에서 스스로 복구
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(mon.is_healthy());
        mon.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn listeners_receive_every_event() {
        let mon = monitor(true, vec![]);
        let (tx, rx) = std::sync::mpsc::channel();
        mon.add_event_listener(move |event| {
            let _ = tx.send(event.event_type);
        });

        mon.start(&CancellationToken::new()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        mon.stop();

        let received: Vec<ConnectionEventType> = (0..3)
            .map(|_| rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(
            received,
            vec![
                ConnectionEventType::Connected,
                ConnectionEventType::Connected,
                ConnectionEventType::Disconnected,
            ]
        );
    }

    #[test]
    fn event_ring_is_bounded_by_max_events() {
        let config = MonitorConfig {
            max_events: 5,
            ..test_config()
        };
        let mon = ConnectionMonitor::new(
            Arc::new(StaticAuth { valid: true }),
            Arc::new(ScriptedClient::new(vec![])),
            config,
        );

        {
            let mut state = mon.inner.state.write();
            for n in 0..10 {
                state.emit(ConnectionEvent::new(
                    ConnectionEventType::HealthCheck,
                    format!("event-{n}"),
                ));
            }
        }

        let messages: Vec<String> = mon.events(0).into_iter().map(|e| e.message).collect();
        assert_eq!(
            messages,
            (5..10).map(|n| format!("event-{n}")).collect::<Vec<_>>()
        );
    }
}
