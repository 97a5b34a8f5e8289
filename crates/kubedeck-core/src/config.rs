//! 애플리케이션 설정 구조체.
//!
//! 클러스터 접속 정보, 연결 모니터 주기, 재시도 정책을 정의한다.
//! `ConfigManager`를 통해 JSON 파일에서 로드하고 CLI 인자로 덮어쓴다.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 클러스터 접속 설정
    pub cluster: ClusterConfig,
    /// 연결 모니터 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// 원격 호출 재시도 설정
    #[serde(default)]
    pub retry: RetryConfig,
}

/// 클러스터 접속 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// API 서버 URL (예: "https://api.cluster.example.com:6443")
    pub server_url: String,
    /// 컨텍스트 이름
    #[serde(default = "default_context_name")]
    pub context_name: String,
    /// 기본 네임스페이스
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// 화면 표시용 클러스터 이름
    #[serde(default)]
    pub cluster_name: String,
    /// Bearer 토큰 (None이면 `KUBEDECK_TOKEN` 환경 변수 사용)
    #[serde(default)]
    pub token: Option<String>,
    /// TLS 인증서 검증 생략 (개발 클러스터 전용)
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

/// 연결 모니터 설정: 모니터 생성 후 변경 불가
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// 헬스체크 주기 (밀리초)
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,
    /// 헬스체크/연결 시도 1회 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// 보관할 최대 이벤트 수
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    /// 자동 재연결 시도 횟수
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// 재연결 기본 대기 시간 (밀리초, 시도 번호만큼 곱해짐)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            health_check_interval_ms: default_health_check_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_events: default_max_events(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl MonitorConfig {
    /// 헬스체크 주기를 Duration으로 반환
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }

    /// 요청 타임아웃을 Duration으로 반환
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// 재연결 기본 대기 시간을 Duration으로 반환
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.health_check_interval_ms == 0 {
            return Err(CoreError::Config(
                "health_check_interval_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(CoreError::Config(
                "request_timeout_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.max_events == 0 {
            return Err(CoreError::Config(
                "max_events는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

/// `RetryingClient` 재시도 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 최초 호출 이후 추가 재시도 횟수
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self {
            cluster: ClusterConfig {
                server_url: "https://127.0.0.1:6443".to_string(),
                context_name: default_context_name(),
                namespace: default_namespace(),
                cluster_name: String::new(),
                token: None,
                insecure_skip_tls_verify: false,
            },
            monitor: MonitorConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_context_name() -> String {
    "default".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_health_check_interval_ms() -> u64 {
    30_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_events() -> usize {
    100
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2_000
}

fn default_max_retries() -> u32 {
    3
}
