//! 라이프사이클 관리.
//!
//! 루트 취소 토큰, 시그널 핸들링, 종료 전파.
//! 모니터와 백그라운드 태스크는 루트 토큰의 자식 토큰으로 실행된다.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// 라이프사이클 관리자
pub struct LifecycleManager {
    root: CancellationToken,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
        }
    }

    /// 루트 토큰 (취소 시 모든 자식 작업 종료)
    pub fn token(&self) -> &CancellationToken {
        &self.root
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        if !self.root.is_cancelled() {
            info!("종료 신호 발송");
            self.root.cancel();
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.root.is_cancelled()
    }

    /// OS 시그널(SIGINT, SIGTERM) 또는 내부 종료 요청 대기
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::select! {
                _ = sigint.recv() => info!("SIGINT 수신"),
                _ = sigterm.recv() => info!("SIGTERM 수신"),
                _ = self.root.cancelled() => return Ok(()),
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Ctrl+C 수신");
                }
                _ = self.root.cancelled() => return Ok(()),
            }
        }

        self.shutdown();
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
