//! 연결 상태 모델.
//!
//! 연결 모니터가 관리하는 상태, 메트릭, 헬스체크 결과, 이벤트를 정의한다.
//! 모든 값은 모니터 내부 락 밖으로 복제본으로만 전달된다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// 자유 형식 상세 정보 (이벤트, 헬스체크)
pub type Details = BTreeMap<String, serde_json::Value>;

/// 클러스터 연결 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    /// 모니터 생성 직후
    #[default]
    Unknown,
    /// 최초 연결 시도 중
    Connecting,
    /// 연결됨
    Connected,
    /// 모니터 중지로 연결 해제됨
    Disconnected,
    /// 재연결 시도 중
    Reconnecting,
    /// 연결 실패
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Unknown => write!(f, "Unknown"),
            ConnectionStatus::Connecting => write!(f, "Connecting"),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
            ConnectionStatus::Reconnecting => write!(f, "Reconnecting"),
            ConnectionStatus::Error => write!(f, "Error"),
        }
    }
}

/// 현재 연결 정보
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub status: ConnectionStatus,
    pub cluster_name: String,
    pub server_version: String,
    pub context_name: String,
    pub namespace: String,
    pub host: String,
    pub is_openshift: bool,
    /// 마지막으로 연결에 성공한 시각
    pub connected_at: Option<DateTime<Utc>>,
    /// 마지막 헬스체크/연결 시도 시각
    pub last_checked: Option<DateTime<Utc>>,
    /// 정상 상태에서는 빈 문자열
    pub error: String,
}

/// 연결 메트릭
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// 성공한 헬스체크 요청 수
    pub request_count: u64,
    /// 실패한 헬스체크 + 연결 시도 수
    pub error_count: u64,
    /// 평활 평균 지연 시간 (`(avg + sample) / 2`)
    pub average_latency: Duration,
    pub last_request_time: Option<DateTime<Utc>>,
    /// 성공한 연결 수립 횟수
    pub total_connections: u64,
    /// 모니터 실행 시간 (실행 중일 때만 계산)
    pub uptime: Duration,
    #[serde(skip)]
    latency_samples: u64,
}

impl Metrics {
    /// 지연 시간 샘플 반영
    ///
    /// 첫 샘플은 그대로 평균이 되고, 이후에는 최신 샘플에 1/2 가중치를 준다.
    pub fn record_latency(&mut self, sample: Duration) {
        self.average_latency = if self.latency_samples == 0 {
            sample
        } else {
            (self.average_latency + sample) / 2
        };
        self.latency_samples += 1;
    }
}

/// 헬스체크 1회 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub timestamp: DateTime<Utc>,
    pub duration: Duration,
    pub success: bool,
    pub error: String,
    pub details: Details,
}

/// 연결 이벤트 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionEventType {
    Connected,
    Disconnected,
    Reconnecting,
    Error,
    HealthCheck,
}

/// 연결 이벤트 (이벤트 로그에 append-only로 기록)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEvent {
    pub event_type: ConnectionEventType,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub error: String,
    pub details: Details,
}

impl ConnectionEvent {
    /// 현재 시각으로 이벤트 생성
    pub fn new(event_type: ConnectionEventType, message: impl Into<String>) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            message: message.into(),
            error: String::new(),
            details: Details::new(),
        }
    }

    /// 에러 문자열 설정
    pub fn with_error(mut self, error: impl std::fmt::Display) -> Self {
        self.error = error.to_string();
        self
    }

    /// 상세 정보 항목 추가
    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}
