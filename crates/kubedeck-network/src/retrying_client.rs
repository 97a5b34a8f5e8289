//! 재시도 데코레이터.
//!
//! 임의의 `ResourceClient`를 감싸 모든 원격 호출에 `retry_operation` 정책을 적용한다.
//! 네임스페이스 접근자는 네트워크 호출이 아니므로 그대로 위임한다.

use async_trait::async_trait;
use kubedeck_core::error::CoreError;
use kubedeck_core::models::resource::{ResourceKind, ResourceSummary, ServerInfo};
use kubedeck_core::ports::resource_client::ResourceClient;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::retry::retry_operation;

/// 재시도 정책이 적용된 리소스 클라이언트
pub struct RetryingClient {
    inner: Arc<dyn ResourceClient>,
    max_retries: u32,
    cancel: CancellationToken,
}

impl RetryingClient {
    /// 새 재시도 클라이언트 (호출당 최대 `max_retries + 1`회 시도)
    pub fn new(inner: Arc<dyn ResourceClient>, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            cancel: CancellationToken::new(),
        }
    }

    /// 재시도 대기를 중단시킬 취소 토큰 지정
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

#[async_trait]
impl ResourceClient for RetryingClient {
    async fn test_connection(&self) -> Result<(), CoreError> {
        retry_operation(&self.cancel, self.max_retries, || self.inner.test_connection()).await
    }

    async fn server_info(&self) -> Result<ServerInfo, CoreError> {
        retry_operation(&self.cancel, self.max_retries, || self.inner.server_info()).await
    }

    async fn list_namespaces(&self) -> Result<Vec<ResourceSummary>, CoreError> {
        retry_operation(&self.cancel, self.max_retries, || self.inner.list_namespaces()).await
    }

    async fn list_resources(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> Result<Vec<ResourceSummary>, CoreError> {
        retry_operation(&self.cancel, self.max_retries, || {
            self.inner.list_resources(kind, namespace)
        })
        .await
    }

    async fn get_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceSummary, CoreError> {
        retry_operation(&self.cancel, self.max_retries, || {
            self.inner.get_resource(kind, namespace, name)
        })
        .await
    }

    fn current_namespace(&self) -> String {
        self.inner.current_namespace()
    }

    fn set_current_namespace(&self, namespace: &str) {
        self.inner.set_current_namespace(namespace);
    }
}
