//! 연결 이벤트 로그와 리스너 디스패치.
//!
//! - `EventLog`: 용량이 고정된 append-only 링. 넘치면 가장 오래된 이벤트부터 버린다.
//! - `ListenerSet`: 리스너마다 bounded 큐(crossbeam) + 전용 워커 스레드.
//!   리스너별 전달 순서는 보장되고, 큐가 가득 차면 해당 리스너에 대해서만 이벤트를 버린다.

use crossbeam::channel::{self, Sender, TrySendError};
use kubedeck_core::models::connection::ConnectionEvent;
use std::collections::VecDeque;
use tracing::{debug, error, warn};

/// 리스너별 큐 용량
pub const LISTENER_QUEUE_CAPACITY: usize = 256;

/// 고정 용량 이벤트 링
#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    events: VecDeque<ConnectionEvent>,
}

impl EventLog {
    /// 새 이벤트 로그 생성 (용량 최소 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    /// 이벤트 추가: 용량 초과분은 앞에서부터 제거
    pub fn push(&mut self, event: ConnectionEvent) {
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// 최근 `limit`개 이벤트 (시간순 복제본)
    ///
    /// `limit`이 0이거나 보관 개수보다 크면 전체를 반환한다.
    pub fn recent(&self, limit: usize) -> Vec<ConnectionEvent> {
        let len = self.events.len();
        let take = if limit == 0 || limit > len { len } else { limit };
        self.events.iter().skip(len - take).cloned().collect()
    }
}

/// 등록된 리스너 큐 목록
#[derive(Default)]
pub struct ListenerSet {
    senders: Vec<Sender<ConnectionEvent>>,
    next_id: usize,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 리스너 등록: 전용 워커 스레드가 큐를 순서대로 비운다
    ///
    /// 워커는 `ListenerSet`이 drop되어 송신측이 사라지면 종료된다.
    pub fn register<F>(&mut self, listener: F)
    where
        F: Fn(ConnectionEvent) + Send + 'static,
    {
        let (tx, rx) = channel::bounded::<ConnectionEvent>(LISTENER_QUEUE_CAPACITY);
        let id = self.next_id;
        self.next_id += 1;

        let spawned = std::thread::Builder::new()
            .name(format!("kubedeck-listener-{id}"))
            .spawn(move || {
                for event in rx.iter() {
                    listener(event);
                }
                debug!("리스너 {id} 워커 종료");
            });

        match spawned {
            Ok(_) => {
                self.senders.push(tx);
                debug!("이벤트 리스너 {id} 등록 (총 {}개)", self.len());
            }
            Err(e) => error!("리스너 워커 스레드 생성 실패: {e}"),
        }
    }

    /// 모든 리스너 큐에 이벤트 전달 (non-blocking)
    ///
    /// 워커가 종료된 리스너(콜백 panic 등)는 목록에서 제거한다.
    pub fn dispatch(&mut self, event: &ConnectionEvent) {
        self.senders
            .retain(|tx| match tx.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!("리스너 큐 가득 참, 이벤트 버림: {}", event.message);
                    true
                }
                Err(TrySendError::Disconnected(_)) => {
                    warn!("리스너 워커가 종료되어 등록 해제");
                    false
                }
            });
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
