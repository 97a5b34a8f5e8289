//! Kubernetes REST API 클라이언트.
//!
//! `ResourceClient` 포트 구현. Bearer 토큰 헤더 자동 주입 + 상태 코드별 에러 매핑.
//! 재시도는 하지 않으며 `RetryingClient`로 감싸서 사용한다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kubedeck_core::config::ClusterConfig;
use kubedeck_core::error::CoreError;
use kubedeck_core::models::resource::{ResourceKind, ResourceSummary, ServerInfo};
use kubedeck_core::ports::resource_client::ResourceClient;
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::TokenAuthProvider;

/// OpenShift 판별용 API 그룹 경로
const OPENSHIFT_ROUTE_GROUP_PATH: &str = "/apis/route.openshift.io";

/// `GET /version` 응답
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionResponse {
    git_version: String,
    #[serde(default)]
    platform: String,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// 목록 응답 (`items`만 사용)
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    items: Vec<Value>,
}

/// 객체 메타데이터 중 사용하는 필드
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    uid: String,
    creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

/// REST 클라이언트: `ResourceClient` 포트 구현
pub struct KubeHttpClient {
    client: reqwest::Client,
    base_url: String,
    cluster_name: String,
    auth: Arc<TokenAuthProvider>,
    namespace: RwLock<String>,
    timeout: Duration,
}

impl KubeHttpClient {
    /// 새 클라이언트 생성
    pub fn new(
        cluster: &ClusterConfig,
        auth: Arc<TokenAuthProvider>,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if cluster.insecure_skip_tls_verify {
            warn!("TLS 인증서 검증 비활성화: {}", cluster.server_url);
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            base_url: cluster.server_url.trim_end_matches('/').to_string(),
            cluster_name: cluster.cluster_name.clone(),
            auth,
            namespace: RwLock::new(cluster.namespace.clone()),
            timeout,
        })
    }

    /// Authorization 헤더가 포함된 GET 요청 실행
    async fn get(&self, path: &str) -> Result<reqwest::Response, CoreError> {
        let token = self.auth.token()?;
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");

        self.client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))
    }

    /// 전송 실패 매핑: 연결/전송 계층 실패만 `Network`로 분류한다
    fn map_send_error(&self, e: reqwest::Error) -> CoreError {
        if e.is_timeout() {
            CoreError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if e.is_builder() {
            CoreError::Config(format!("잘못된 요청 ({}): {e}", self.base_url))
        } else if e.is_redirect() || e.is_decode() {
            CoreError::Internal(e.to_string())
        } else {
            CoreError::Network(e.to_string())
        }
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, CoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });

        match status.as_u16() {
            401 => Err(CoreError::Auth(format!("인증 실패: {text}"))),
            code => Err(CoreError::Api {
                status: code,
                message: text,
            }),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, CoreError> {
        let resp = Self::check_response(self.get(path).await?).await?;
        resp.json()
            .await
            .map_err(|e| CoreError::Internal(format!("응답 파싱 실패 ({path}): {e}")))
    }

    /// OpenShift 클러스터인지 확인 (route.openshift.io 그룹 존재 여부)
    async fn detect_openshift(&self) -> bool {
        match self.get(OPENSHIFT_ROUTE_GROUP_PATH).await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("OpenShift 판별 실패, Kubernetes로 간주: {e}");
                false
            }
        }
    }

    fn to_summary(kind: ResourceKind, raw: Value) -> Result<ResourceSummary, CoreError> {
        let meta: ObjectMeta = match raw.get("metadata") {
            Some(metadata) => serde_json::from_value(metadata.clone())?,
            None => ObjectMeta::default(),
        };
        if meta.name.is_empty() {
            return Err(CoreError::Internal(format!("{kind} 객체에 metadata.name 없음")));
        }

        Ok(ResourceSummary {
            kind,
            name: meta.name,
            namespace: meta.namespace,
            uid: meta.uid,
            created_at: meta.creation_timestamp,
            labels: meta.labels,
            raw,
        })
    }
}

#[async_trait]
impl ResourceClient for KubeHttpClient {
    async fn test_connection(&self) -> Result<(), CoreError> {
        Self::check_response(self.get("/api").await?).await?;
        Ok(())
    }

    async fn server_info(&self) -> Result<ServerInfo, CoreError> {
        let version: VersionResponse = self.get_json("/version").await?;
        let is_openshift = self.detect_openshift().await;
        let cluster_name = if self.cluster_name.is_empty() {
            self.base_url.clone()
        } else {
            self.cluster_name.clone()
        };

        Ok(ServerInfo {
            git_version: version.git_version,
            platform: version.platform,
            host: self.base_url.clone(),
            cluster_name,
            is_openshift,
            extra: version.extra,
        })
    }

    async fn list_namespaces(&self) -> Result<Vec<ResourceSummary>, CoreError> {
        self.list_resources(ResourceKind::Namespace, "").await
    }

    async fn list_resources(
        &self,
        kind: ResourceKind,
        namespace: &str,
    ) -> Result<Vec<ResourceSummary>, CoreError> {
        let list: ListResponse = self.get_json(&kind.collection_path(namespace)).await?;
        list.items
            .into_iter()
            .map(|item| Self::to_summary(kind, item))
            .collect()
    }

    async fn get_resource(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<ResourceSummary, CoreError> {
        let path = format!("{}/{name}", kind.collection_path(namespace));
        match self.get_json::<Value>(&path).await {
            Ok(raw) => Self::to_summary(kind, raw),
            Err(CoreError::Api { status: 404, .. }) => Err(CoreError::NotFound {
                resource_type: kind.to_string(),
                id: name.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    fn current_namespace(&self) -> String {
        self.namespace.read().clone()
    }

    fn set_current_namespace(&self, namespace: &str) {
        *self.namespace.write() = namespace.to_string();
    }
}
