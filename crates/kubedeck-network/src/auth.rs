//! Bearer 토큰 인증.
//!
//! `AuthProvider` 포트 구현. 설정 파일 또는 `KUBEDECK_TOKEN` 환경 변수의 토큰을 보관하고
//! 만료 시각이 있으면 검증 시 함께 확인한다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kubedeck_core::config::ClusterConfig;
use kubedeck_core::error::CoreError;
use kubedeck_core::ports::auth::AuthProvider;
use parking_lot::RwLock;
use tracing::debug;

/// 토큰 환경 변수 이름
pub const TOKEN_ENV_VAR: &str = "KUBEDECK_TOKEN";

/// 내부 토큰 상태
#[derive(Debug, Clone)]
struct TokenState {
    token: String,
    expires_at: Option<DateTime<Utc>>,
}

/// Bearer 토큰 인증 제공자
pub struct TokenAuthProvider {
    state: RwLock<TokenState>,
    context: String,
    namespace: String,
}

impl TokenAuthProvider {
    /// 새 인증 제공자 생성 (만료 없음)
    pub fn new(
        token: impl Into<String>,
        context: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            state: RwLock::new(TokenState {
                token: token.into(),
                expires_at: None,
            }),
            context: context.into(),
            namespace: namespace.into(),
        }
    }

    /// 클러스터 설정에서 생성
    ///
    /// 설정에 토큰이 없으면 `KUBEDECK_TOKEN` 환경 변수를 사용한다.
    /// 둘 다 없으면 빈 토큰으로 생성되며 `is_valid()`가 실패한다.
    pub fn from_config(cluster: &ClusterConfig) -> Self {
        let token = cluster
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV_VAR).ok())
            .unwrap_or_default();

        if token.is_empty() {
            debug!("클러스터 토큰 미설정 ({TOKEN_ENV_VAR} 환경 변수도 없음)");
        }

        Self::new(token, &cluster.context_name, &cluster.namespace)
    }

    /// 토큰 만료 시각 지정
    pub fn with_expiry(self, expires_at: DateTime<Utc>) -> Self {
        self.state.write().expires_at = Some(expires_at);
        self
    }

    /// 토큰 교체 (만료 시각 포함)
    pub fn set_token(&self, token: impl Into<String>, expires_at: Option<DateTime<Utc>>) {
        let mut state = self.state.write();
        state.token = token.into();
        state.expires_at = expires_at;
        debug!("클러스터 토큰 교체");
    }

    /// 요청에 사용할 유효한 토큰 반환
    pub fn token(&self) -> Result<String, CoreError> {
        let state = self.state.read();
        Self::check(&state)?;
        Ok(state.token.clone())
    }

    fn check(state: &TokenState) -> Result<(), CoreError> {
        if state.token.trim().is_empty() {
            return Err(CoreError::Auth("토큰 없음".to_string()));
        }
        if let Some(expires_at) = state.expires_at {
            if Utc::now() >= expires_at {
                return Err(CoreError::Auth(format!("토큰 만료: {expires_at}")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AuthProvider for TokenAuthProvider {
    async fn is_valid(&self) -> Result<(), CoreError> {
        Self::check(&self.state.read())
    }

    fn context(&self) -> String {
        self.context.clone()
    }

    fn namespace(&self) -> String {
        self.namespace.clone()
    }
}
