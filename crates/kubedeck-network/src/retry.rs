//! 원격 호출 재시도 엔진.
//!
//! 에러 분류(재시도 가능 여부, 대기 시간)와 재시도 실행기를 제공한다.
//! - 429: 2^attempt 초 (exponential)
//! - 그 외 일시적 에러: attempt 초, 최대 30초 (linear)

use kubedeck_core::error::CoreError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 재시도 대상 HTTP 상태 코드
const RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// linear 대기 상한
const MAX_LINEAR_DELAY: Duration = Duration::from_secs(30);

/// 재시도 가능한(일시적) 에러인지 판별
///
/// 네트워크 계층 실패, 타임아웃, 408/429/5xx 일부만 재시도한다.
/// 인증/설정/형식 오류와 취소는 재시도하지 않는다.
pub fn is_retryable(error: &CoreError) -> bool {
    match error {
        CoreError::Network(_) | CoreError::Timeout { .. } => true,
        CoreError::Api { status, .. } => RETRYABLE_STATUS_CODES.contains(status),
        _ => false,
    }
}

/// 재시도 전 대기 시간
///
/// `attempt`는 1부터 시작하는 재시도 번호 (N번째 재시도).
pub fn retry_delay(error: &CoreError, attempt: u32) -> Duration {
    if error.is_rate_limited() {
        return Duration::from_secs(2u64.saturating_pow(attempt));
    }
    Duration::from_secs(u64::from(attempt)).min(MAX_LINEAR_DELAY)
}

/// 실패 1건의 분류 결과: 원인 에러, 재시도 가능 여부, 권장 대기 시간
#[derive(Debug)]
pub struct RetryableError {
    /// 원인 에러
    pub source: CoreError,
    /// 일시적 에러 여부
    pub retryable: bool,
    /// 다음 시도 전 권장 대기 시간 (재시도 불가면 0)
    pub delay: Duration,
}

impl RetryableError {
    /// `attempt`번째 시도의 실패를 분류한다
    pub fn classify(source: CoreError, attempt: u32) -> Self {
        let retryable = is_retryable(&source);
        let delay = if retryable {
            retry_delay(&source, attempt)
        } else {
            Duration::ZERO
        };
        Self {
            source,
            retryable,
            delay,
        }
    }

    /// 재시도를 포기하고 `RetryExhausted`로 감싼다
    pub fn exhausted(self, attempts: u32) -> CoreError {
        CoreError::RetryExhausted {
            attempts,
            source: Box::new(self.source),
        }
    }
}

/// 재시도가 포함된 작업 실행
///
/// 최대 `max_retries + 1`회 실행한다. 재시도 불가 에러는 즉시 중단하고,
/// 대기 중 `cancel`이 취소되면 `CoreError::Cancelled`를 반환한다.
/// 최종 실패 시 총 시도 횟수와 마지막 에러를 `RetryExhausted`로 감싼다.
pub async fn retry_operation<T, F, Fut>(
    cancel: &CancellationToken,
    max_retries: u32,
    mut operation: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CoreError>>,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let failure = match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!("요청 성공 (시도 {attempts}회)");
                }
                return Ok(value);
            }
            Err(e) => RetryableError::classify(e, attempts),
        };

        if attempts > max_retries || !failure.retryable {
            return Err(failure.exhausted(attempts));
        }

        let delay = failure.delay;
        warn!(
            "요청 실패 (시도 {}/{}): {}, {delay:?} 후 재시도",
            attempts,
            max_retries + 1,
            failure.source
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("재시도 대기 중 취소됨");
                return Err(CoreError::Cancelled);
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn api(status: u16) -> CoreError {
        CoreError::Api {
            status,
            message: "test".to_string(),
        }
    }

    #[test]
    fn transient_status_codes_are_retryable() {
        for status in [429, 500, 502, 503, 504, 408] {
            assert!(is_retryable(&api(status)), "{status}는 재시도 대상");
        }
    }

    #[test]
    fn client_errors_are_not_retryable() {
        for status in [400, 401, 403, 404, 409, 501] {
            assert!(!is_retryable(&api(status)), "{status}는 재시도 대상 아님");
        }
    }

    #[test]
    fn network_and_timeout_are_retryable() {
        assert!(is_retryable(&CoreError::Network(
            "connection refused".to_string()
        )));
        assert!(is_retryable(&CoreError::Timeout { timeout_ms: 100 }));
        assert!(!is_retryable(&CoreError::Auth("expired".to_string())));
        assert!(!is_retryable(&CoreError::Internal("bad body".to_string())));
        assert!(!is_retryable(&CoreError::Cancelled));
    }

    #[test]
    fn rate_limit_delay_is_exponential() {
        assert_eq!(retry_delay(&api(429), 1), Duration::from_secs(2));
        assert_eq!(retry_delay(&api(429), 3), Duration::from_secs(8));
    }

    #[test]
    fn other_delay_is_linear_and_capped() {
        let err = CoreError::Network("reset".to_string());
        assert_eq!(retry_delay(&err, 5), Duration::from_secs(5));
        assert_eq!(retry_delay(&api(503), 30), Duration::from_secs(30));
        assert_eq!(retry_delay(&err, 40), Duration::from_secs(30));
    }

    #[test]
    fn classify_carries_flag_and_delay() {
        let limited = RetryableError::classify(api(429), 2);
        assert!(limited.retryable);
        assert_eq!(limited.delay, Duration::from_secs(4));

        let unavailable = RetryableError::classify(api(503), 3);
        assert!(unavailable.retryable);
        assert_eq!(unavailable.delay, Duration::from_secs(3));

        let denied = RetryableError::classify(CoreError::Auth("expired".to_string()), 1);
        assert!(!denied.retryable);
        assert_eq!(denied.delay, Duration::ZERO);
        assert_matches!(
            denied.exhausted(1),
            CoreError::RetryExhausted { attempts: 1, source } => {
                assert_matches!(*source, CoreError::Auth(_));
            }
        );
    }

    #[tokio::test]
    async fn succeeds_first_try_without_waiting() {
        let token = CancellationToken::new();
        let result = retry_operation(&token, 2, || async { Ok::<_, CoreError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_after_one_attempt() {
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: Result<(), CoreError> = retry_operation(&token, 2, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(api(404)) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("1회 시도 후 실패"));
        assert_matches!(err, CoreError::RetryExhausted { attempts: 1, .. });
    }

    #[tokio::test(start_paused = true)]
    async fn retryable_error_uses_full_budget_with_waits() {
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), CoreError> = retry_operation(&token, 2, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CoreError::Network("connection refused".to_string())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1초 + 2초 대기
        assert!(started.elapsed() >= Duration::from_secs(3));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("3회 시도 후 실패"));
        assert_matches!(err, CoreError::RetryExhausted { attempts: 3, source } => {
            assert_matches!(*source, CoreError::Network(_));
        });
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let token = CancellationToken::new();
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_operation(&token, 3, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= 2 {
                    Err(api(503))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_wait_returns_cancelled() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });

        let calls = AtomicU32::new(0);
        let result: Result<(), CoreError> = retry_operation(&token, 5, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(api(429)) }
        })
        .await;

        assert_matches!(result, Err(CoreError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
