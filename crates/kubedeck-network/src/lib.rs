//! # kubedeck-network
//!
//! 클러스터 연결 회복 계층.
//! Kubernetes/OpenShift REST 어댑터, 재시도 엔진, 재시도 데코레이터,
//! 헬스체크 기반 연결 모니터를 제공한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use kubedeck_network::auth::TokenAuthProvider;
//! use kubedeck_network::connectivity::ConnectionMonitor;
//! use kubedeck_network::http_client::KubeHttpClient;
//! use kubedeck_network::retrying_client::RetryingClient;
//!
//! let auth = Arc::new(TokenAuthProvider::from_config(&config.cluster));
//! let http = Arc::new(KubeHttpClient::new(&config.cluster, auth.clone(), timeout)?);
//! let client = Arc::new(RetryingClient::new(http, config.retry.max_retries));
//! let monitor = ConnectionMonitor::new(auth, client, config.monitor.clone());
//! monitor.start(&shutdown_token)?;
//! ```

pub mod auth;
pub mod connectivity;
pub mod event_log;
pub mod http_client;
pub mod retry;
pub mod retrying_client;
