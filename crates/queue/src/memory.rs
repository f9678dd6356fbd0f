//! 인메모리 [`QueueStore`] 구현
//!
//! 단일 뮤텍스 아래에서 source pop과 dest push를 함께 수행하므로
//! `move_blocking`의 원자성이 Redis와 동일하게 보장됩니다.
//! 테스트와 Redis 없는 로컬 실행에서 사용합니다.

use std::collections::{HashMap, VecDeque};

use tokio::sync::{Mutex, Notify};

use crate::error::QueueError;
use crate::store::QueueStore;

/// 프로세스 내 리스트 저장소
///
/// 각 리스트는 `VecDeque`이며 front가 head, back이 tail입니다.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
    /// push 발생 시 대기 중인 blocking 호출을 깨움
    pushed: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 큐 내용을 head부터 tail 순서로 반환합니다 (`LRANGE 0 -1`).
    pub async fn range(&self, queue: &str) -> Vec<String> {
        let lists = self.lists.lock().await;
        lists
            .get(queue)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// tail 하나를 꺼내 `dest`의 head로 옮깁니다. 항목이 없으면 대기합니다.
    async fn take_tail(&self, source: &str, dest: &str) -> String {
        loop {
            // 검사 전에 알림을 등록해야 검사와 대기 사이의 push를 놓치지 않음
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut lists = self.lists.lock().await;
                if let Some(item) = lists.get_mut(source).and_then(VecDeque::pop_back) {
                    lists
                        .entry(dest.to_owned())
                        .or_default()
                        .push_front(item.clone());
                    lists.retain(|_, list| !list.is_empty());
                    // dest 대기자도 깨움
                    self.pushed.notify_waiters();
                    return item;
                }
            }

            notified.await;
        }
    }
}

impl QueueStore for MemoryQueue {
    async fn move_blocking(&self, source: &str, dest: &str) -> Result<String, QueueError> {
        Ok(self.take_tail(source, dest).await)
    }

    async fn push(&self, queue: &str, item: &str) -> Result<(), QueueError> {
        {
            let mut lists = self.lists.lock().await;
            lists
                .entry(queue.to_owned())
                .or_default()
                .push_front(item.to_owned());
        }
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn remove(&self, queue: &str, item: &str, count: usize) -> Result<usize, QueueError> {
        let mut lists = self.lists.lock().await;
        let Some(list) = lists.get_mut(queue) else {
            return Ok(0);
        };

        // LREM과 같이 0은 전부 제거
        let limit = if count == 0 { usize::MAX } else { count };
        let mut removed = 0;
        let mut index = 0;
        while index < list.len() && removed < limit {
            if list[index] == item {
                list.remove(index);
                removed += 1;
            } else {
                index += 1;
            }
        }
        if list.is_empty() {
            lists.remove(queue);
        }
        Ok(removed)
    }

    async fn delete(&self, queue: &str) -> Result<(), QueueError> {
        self.lists.lock().await.remove(queue);
        Ok(())
    }

    async fn len(&self, queue: &str) -> Result<usize, QueueError> {
        Ok(self
            .lists
            .lock()
            .await
            .get(queue)
            .map_or(0, VecDeque::len))
    }
}
