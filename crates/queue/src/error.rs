//! 큐 전송 계층 에러 타입
//!
//! [`QueueError`]는 큐 저장소와의 통신에서 발생하는 모든 에러를 표현합니다.
//! 워커 엔진은 이를 전송 에러로 분류해 현재 시도만 중단하고 루프를 계속합니다.

/// 큐 전송 계층 에러
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    /// 초기 연결 실패 (재시도 소진)
    #[error("failed to connect to queue store at {url} after {attempts} attempts: {reason}")]
    Connect {
        /// 접속 URL
        url: String,
        /// 시도 횟수
        attempts: u32,
        /// 마지막 실패 사유
        reason: String,
    },

    /// 큐 명령 실패
    #[error("queue command {command} on '{queue}' failed: {reason}")]
    Command {
        /// 실행한 명령 (BRPOPLPUSH, LPUSH 등)
        command: &'static str,
        /// 대상 큐 이름
        queue: String,
        /// 실패 사유
        reason: String,
    },
}

impl QueueError {
    pub(crate) fn command(
        command: &'static str,
        queue: &str,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Command {
            command,
            queue: queue.to_owned(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_names_queue_and_command() {
        let err = QueueError::command("LPUSH", "toscan", "connection reset");
        let msg = err.to_string();
        assert!(msg.contains("LPUSH"));
        assert!(msg.contains("toscan"));
        assert!(msg.contains("connection reset"));
    }

    #[test]
    fn connect_error_reports_attempts() {
        let err = QueueError::Connect {
            url: "redis://localhost:6379/".to_owned(),
            attempts: 5,
            reason: "refused".to_owned(),
        };
        assert!(err.to_string().contains("after 5 attempts"));
    }
}
