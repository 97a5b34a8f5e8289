//! 클러스터 리소스 모델.
//!
//! 화면용 뷰 모델 변환은 UI 레이어 책임이며, 여기서는 메타데이터와 원본 JSON만 보관한다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 조회 가능한 리소스 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Pod,
    Service,
    Deployment,
    ConfigMap,
    Secret,
    Namespace,
}

impl ResourceKind {
    /// 네임스페이스 범위 리소스 여부
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, ResourceKind::Namespace)
    }

    /// REST 컬렉션 경로
    ///
    /// `namespace`가 비어 있으면 전체 네임스페이스 경로를 반환한다.
    pub fn collection_path(&self, namespace: &str) -> String {
        let (group_prefix, plural) = match self {
            ResourceKind::Pod => ("/api/v1", "pods"),
            ResourceKind::Service => ("/api/v1", "services"),
            ResourceKind::ConfigMap => ("/api/v1", "configmaps"),
            ResourceKind::Secret => ("/api/v1", "secrets"),
            ResourceKind::Namespace => ("/api/v1", "namespaces"),
            ResourceKind::Deployment => ("/apis/apps/v1", "deployments"),
        };

        if self.is_namespaced() && !namespace.is_empty() {
            format!("{group_prefix}/namespaces/{namespace}/{plural}")
        } else {
            format!("{group_prefix}/{plural}")
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Service => "Service",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::Secret => "Secret",
            ResourceKind::Namespace => "Namespace",
        };
        f.write_str(name)
    }
}

/// 리소스 요약 (metadata + 원본 객체)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub kind: ResourceKind,
    pub name: String,
    /// 클러스터 범위 리소스는 빈 문자열
    pub namespace: String,
    pub uid: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// API 서버가 반환한 원본 객체
    pub raw: serde_json::Value,
}

/// API 서버 정보
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// 예: "v1.29.3"
    pub git_version: String,
    /// 예: "linux/amd64"
    pub platform: String,
    pub host: String,
    pub cluster_name: String,
    pub is_openshift: bool,
    /// 나머지 `/version` 필드
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
