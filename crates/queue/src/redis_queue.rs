//! Redis-backed [`QueueStore`].
//!
//! Each operation maps to a single Redis list command, so the atomicity of
//! `move_blocking` is the atomicity of `BRPOPLPUSH` itself:
//!
//! | Operation       | Command       |
//! |-----------------|---------------|
//! | `move_blocking` | `BRPOPLPUSH`  |
//! | `push`          | `LPUSH`       |
//! | `remove`        | `LREM`        |
//! | `delete`        | `DEL`         |
//! | `len`           | `LLEN`        |
//!
//! Both handles are [`ConnectionManager`]s. A command that fails because the
//! socket went away returns its error and schedules a reconnect, so the next
//! attempt (after the engine's retry pause) runs on a fresh connection.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use tracing::{debug, info, warn};

use scanrelay_core::config::QueueConfig;

use crate::error::QueueError;
use crate::store::QueueStore;

/// `BRPOPLPUSH` timeout meaning "wait forever".
const BLOCK_FOREVER: f64 = 0.0;

/// Production [`QueueStore`] over a Redis server.
///
/// Blocking commands run on their own connection so that a worker parked on
/// `BRPOPLPUSH` never delays the short commands issued by the same process.
#[derive(Clone)]
pub struct RedisQueue {
    url: String,
    blocking: ConnectionManager,
    commands: ConnectionManager,
}

impl RedisQueue {
    /// Connects using the `[queue]` section of the configuration.
    pub async fn from_config(config: &QueueConfig) -> Result<Self, QueueError> {
        Self::connect(
            &config.url(),
            config.max_tries,
            Duration::from_secs(config.retry_interval_secs),
        )
        .await
    }

    /// Connects to `url`, pinging the server up to `max_tries` times.
    ///
    /// Waits `retry_interval` between failed attempts and fails with
    /// [`QueueError::Connect`] once the attempts are exhausted.
    pub async fn connect(
        url: &str,
        max_tries: u32,
        retry_interval: Duration,
    ) -> Result<Self, QueueError> {
        let client = redis::Client::open(url).map_err(|e| QueueError::Connect {
            url: url.to_owned(),
            attempts: 0,
            reason: e.to_string(),
        })?;

        let mut last_error = String::from("no connection attempt made");
        for attempt in 1..=max_tries {
            match Self::open_pair(&client).await {
                Ok((blocking, commands)) => {
                    info!(url, attempt, "connected to queue store");
                    return Ok(Self {
                        url: url.to_owned(),
                        blocking,
                        commands,
                    });
                }
                Err(e) => {
                    warn!(
                        url,
                        attempt,
                        max_tries,
                        error = %e,
                        "queue store not reachable"
                    );
                    last_error = e.to_string();
                    if attempt < max_tries {
                        tokio::time::sleep(retry_interval).await;
                    }
                }
            }
        }

        Err(QueueError::Connect {
            url: url.to_owned(),
            attempts: max_tries,
            reason: last_error,
        })
    }

    /// Connection URL this store was opened with.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn open_pair(
        client: &redis::Client,
    ) -> redis::RedisResult<(ConnectionManager, ConnectionManager)> {
        let mut blocking =
            ConnectionManager::new_with_config(client.clone(), manager_config()).await?;
        let _pong: String = redis::cmd("PING").query_async(&mut blocking).await?;
        let commands = ConnectionManager::new_with_config(client.clone(), manager_config()).await?;
        Ok((blocking, commands))
    }
}

/// One connection attempt per open or reconnect.
///
/// Initial attempts are paced by [`RedisQueue::connect`]; reconnects are paced
/// by the caller retrying the failed command.
fn manager_config() -> ConnectionManagerConfig {
    ConnectionManagerConfig::new().set_number_of_retries(0)
}

impl std::fmt::Debug for RedisQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisQueue").field("url", &self.url).finish()
    }
}

impl QueueStore for RedisQueue {
    async fn move_blocking(&self, source: &str, dest: &str) -> Result<String, QueueError> {
        let mut conn = self.blocking.clone();
        loop {
            let item: Option<String> = conn
                .brpoplpush(source, dest, BLOCK_FOREVER)
                .await
                .map_err(|e| QueueError::command("BRPOPLPUSH", source, e))?;
            match item {
                Some(item) => return Ok(item),
                None => debug!(source, "BRPOPLPUSH returned nil, waiting again"),
            }
        }
    }

    async fn push(&self, queue: &str, item: &str) -> Result<(), QueueError> {
        let mut conn = self.commands.clone();
        let _len: i64 = conn
            .lpush(queue, item)
            .await
            .map_err(|e| QueueError::command("LPUSH", queue, e))?;
        Ok(())
    }

    async fn remove(&self, queue: &str, item: &str, count: usize) -> Result<usize, QueueError> {
        let mut conn = self.commands.clone();
        // LREM: 0 removes every occurrence, positive counts scan from the head
        let count = isize::try_from(count).unwrap_or(isize::MAX);
        conn.lrem(queue, count, item)
            .await
            .map_err(|e| QueueError::command("LREM", queue, e))
    }

    async fn delete(&self, queue: &str) -> Result<(), QueueError> {
        let mut conn = self.commands.clone();
        let _deleted: i64 = conn
            .del(queue)
            .await
            .map_err(|e| QueueError::command("DEL", queue, e))?;
        Ok(())
    }

    async fn len(&self, queue: &str) -> Result<usize, QueueError> {
        let mut conn = self.commands.clone();
        conn.llen(queue)
            .await
            .map_err(|e| QueueError::command("LLEN", queue, e))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    /// RESP 배열 명령 하나를 읽습니다. 연결이 닫히면 `None`.
    async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Vec<String>> {
        let mut line = String::new();
        if reader.read_line(&mut line).await.ok()? == 0 {
            return None;
        }
        let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            line.clear();
            reader.read_line(&mut line).await.ok()?;
            let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
            let mut buf = vec![0u8; len + 2];
            reader.read_exact(&mut buf).await.ok()?;
            buf.truncate(len);
            args.push(String::from_utf8_lossy(&buf).into_owned());
        }
        Some(args)
    }

    /// 연결마다 `LLEN` 하나에 연결 번호로 응답한 뒤 소켓을 닫는 서버
    async fn serve_connection(stream: TcpStream, id: usize) {
        let (read, mut write) = stream.into_split();
        let mut reader = BufReader::new(read);
        while let Some(args) = read_command(&mut reader).await {
            let name = args.first().map(|a| a.to_ascii_uppercase()).unwrap_or_default();
            let reply = match name.as_str() {
                "PING" => "+PONG\r\n".to_owned(),
                "LLEN" => format!(":{id}\r\n"),
                _ => "+OK\r\n".to_owned(),
            };
            if write.write_all(reply.as_bytes()).await.is_err() {
                return;
            }
            if name == "LLEN" {
                return;
            }
        }
    }

    async fn spawn_dropping_server() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("redis://{}/", listener.local_addr().unwrap());
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let id = counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve_connection(stream, id));
            }
        });
        (url, accepted)
    }

    #[tokio::test]
    async fn connect_rejects_invalid_url_without_retrying() {
        let err = RedisQueue::connect("not a url", 3, Duration::from_millis(1))
            .await
            .unwrap_err();
        match err {
            QueueError::Connect { attempts, .. } => assert_eq!(attempts, 0),
            other => panic!("expected Connect error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connect_gives_up_after_max_tries() {
        // 포트 1에는 Redis가 없으므로 매번 실패해야 함
        let err = RedisQueue::connect("redis://127.0.0.1:1/", 2, Duration::from_millis(1))
            .await
            .unwrap_err();
        match err {
            QueueError::Connect { attempts, url, .. } => {
                assert_eq!(attempts, 2);
                assert_eq!(url, "redis://127.0.0.1:1/");
            }
            other => panic!("expected Connect error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn commands_recover_after_connection_loss() {
        let (url, accepted) = spawn_dropping_server().await;
        let store = RedisQueue::connect(&url, 1, Duration::from_millis(1))
            .await
            .unwrap();

        // 연결 0: blocking, 연결 1: commands
        assert_eq!(store.len("toscan").await.unwrap(), 1);

        // 서버가 연결 1을 닫았으므로 적어도 한 번은 실패한 뒤 새 연결로 복구되어야 함
        let mut recovered = None;
        for _ in 0..50 {
            match tokio::time::timeout(Duration::from_secs(2), store.len("toscan")).await {
                Ok(Ok(length)) => {
                    recovered = Some(length);
                    break;
                }
                _ => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }

        let length = recovered.expect("store should reconnect");
        assert!(length >= 2, "answered by connection {length}");
        assert!(accepted.load(Ordering::SeqCst) >= 3);
    }
}
