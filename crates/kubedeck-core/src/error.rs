//! kubedeck 핵심 에러 타입.
//!
//! 모든 포트와 어댑터는 `Result<T, CoreError>`를 반환한다.
//! 재시도 가능 여부 판별은 `kubedeck-network::retry`가 담당한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 네트워크, API 상태 코드, 인증, 설정 등 공통 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 네트워크 에러 (연결 거부, DNS 실패, I/O 실패)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// API 서버가 반환한 상태 코드 에러
    #[error("API 에러 ({status}): {message}")]
    Api {
        /// HTTP 상태 코드
        status: u16,
        /// 서버 응답 본문 또는 사유
        message: String,
    },

    /// 요청 기한 초과
    #[error("요청 타임아웃: {timeout_ms}ms 초과")]
    Timeout {
        /// 초과된 타임아웃 시간 (밀리초)
        timeout_ms: u64,
    },

    /// 호출자 또는 모니터 라이프사이클에 의해 취소됨
    #[error("작업 취소됨")]
    Cancelled,

    /// 인증 실패 (토큰 없음, 만료, 자격증명 오류)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 리소스를 찾을 수 없음
    #[error("{resource_type} 미발견: {id}")]
    NotFound {
        /// 리소스 종류 (예: "Pod", "ConfigMap")
        resource_type: String,
        /// 리소스 식별자
        id: String,
    },

    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 에러 (예상치 못한 응답 형식 등)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// 재시도 소진: 마지막 에러를 래핑한다
    #[error("{attempts}회 시도 후 실패 (after {attempts} attempts): {source}")]
    RetryExhausted {
        /// 실제 수행한 총 시도 횟수
        attempts: u32,
        /// 마지막 시도의 에러
        #[source]
        source: Box<CoreError>,
    },

    /// 연결 수립 단계 실패: 어느 단계에서 실패했는지 기록한다
    #[error("{stage} 실패: {source}")]
    Connection {
        /// 실패한 단계 (예: "자격증명 검증")
        stage: String,
        #[source]
        source: Box<CoreError>,
    },

    /// 이미 시작된 모니터를 다시 시작하려 함
    #[error("연결 모니터가 이미 시작됨")]
    AlreadyStarted,

    /// 중지된 모니터는 재시작할 수 없음
    #[error("연결 모니터가 이미 중지됨 (재시작 불가)")]
    MonitorStopped,

    /// 실행 중이 아닌 모니터에 대한 요청
    #[error("연결 모니터가 실행 중이 아님")]
    NotRunning,
}

impl CoreError {
    /// 단계 이름을 붙여 `Connection` 에러로 감싼다
    pub fn at_stage(self, stage: impl Into<String>) -> Self {
        CoreError::Connection {
            stage: stage.into(),
            source: Box::new(self),
        }
    }

    /// API 상태 코드 에러면 코드를 반환
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CoreError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 429 Too Many Requests 여부
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }
}
