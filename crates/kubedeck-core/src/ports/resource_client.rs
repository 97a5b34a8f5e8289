//! 리소스 클라이언트 포트.
//!
//! 구현: `kubedeck-network::http_client::KubeHttpClient` (reqwest),
//! 재시도 데코레이터: `kubedeck-network::retrying_client::RetryingClient`

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::resource::{ResourceKind, ResourceSummary, ServerInfo};

/// 원격 클러스터 리소스 클라이언트
///
/// 종류별 조회 메서드는 `list_resources` / `get_resource`를 경유하는 기본 구현을 가진다.
/// 데코레이터는 필수 메서드만 감싸면 모든 조회에 같은 정책이 적용된다.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// API 서버 도달 가능 여부 확인
    async fn test_connection(&self) -> Result<(), CoreError>;

    /// API 서버 버전/플랫폼 정보
    async fn server_info(&self) -> Result<ServerInfo, CoreError>;

    /// 네임스페이스 목록
    async fn list_namespaces(&self) -> Result<Vec<ResourceSummary>, CoreError>;

    /// 리소스 목록 (`namespace`가 비어 있으면 전체 네임스페이스)
    async fn list_resources(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> Result<Vec<ResourceSummary>, CoreError>;

    /// 단일 리소스 조회
    async fn get_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceSummary, CoreError>;

    /// 현재 네임스페이스 (네트워크 호출 없음)
    fn current_namespace(&self) -> String;

    /// 현재 네임스페이스 변경 (네트워크 호출 없음)
    fn set_current_namespace(&self, namespace: &str);

    async fn list_pods(&self, namespace: &str) -> Result<Vec<ResourceSummary>, CoreError> {
        self.list_resources(ResourceKind::Pod, namespace).await
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<ResourceSummary, CoreError> {
        self.get_resource(ResourceKind::Pod, namespace, name).await
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<ResourceSummary>, CoreError> {
        self.list_resources(ResourceKind::Service, namespace).await
    }

    async fn get_service(&self, namespace: &str, name: &str) -> Result<ResourceSummary, CoreError> {
        self.get_resource(ResourceKind::Service, namespace, name).await
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<ResourceSummary>, CoreError> {
        self.list_resources(ResourceKind::Deployment, namespace).await
    }

    async fn get_deployment(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceSummary, CoreError> {
        self.get_resource(ResourceKind::Deployment, namespace, name).await
    }

    async fn list_config_maps(&self, namespace: &str) -> Result<Vec<ResourceSummary>, CoreError> {
        self.list_resources(ResourceKind::ConfigMap, namespace).await
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceSummary, CoreError> {
        self.get_resource(ResourceKind::ConfigMap, namespace, name).await
    }

    /// 시크릿 목록 (값은 UI에서 마스킹)
    async fn list_secrets(&self, namespace: &str) -> Result<Vec<ResourceSummary>, CoreError> {
        self.list_resources(ResourceKind::Secret, namespace).await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<ResourceSummary, CoreError> {
        self.get_resource(ResourceKind::Secret, namespace, name).await
    }
}
