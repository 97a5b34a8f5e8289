//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! `kubedeck-network` 어댑터가 이 trait들을 구현하며,
//! `kubedeck-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! 모든 async trait은 `async_trait` 매크로를 사용하여 object safety를 보장한다.
//! 타임아웃과 취소는 호출 측에서 `tokio::time::timeout` / `CancellationToken`으로 건다.

pub mod auth;
pub mod resource_client;
