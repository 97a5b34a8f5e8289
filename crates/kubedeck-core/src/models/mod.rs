//! kubedeck 도메인 모델.
//!
//! 연결 모니터 상태와 클러스터 리소스 요약 구조체를 정의한다.
//! 모든 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod connection;
pub mod resource;
