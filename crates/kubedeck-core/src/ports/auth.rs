//! 인증 제공자 포트.
//!
//! 구현: `kubedeck-network::auth::TokenAuthProvider`

use async_trait::async_trait;

use crate::error::CoreError;

/// 클러스터 자격증명 제공자
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// 현재 자격증명이 유효한지 검증
    async fn is_valid(&self) -> Result<(), CoreError>;

    /// kubeconfig 컨텍스트 이름
    fn context(&self) -> String;

    /// 기본 네임스페이스
    fn namespace(&self) -> String;
}
