//! 워커 에러 타입
//!
//! [`WorkerError`]는 한 작업 단위에서 발생할 수 있는 모든 실패를 분류합니다.
//! 어떤 변형이든 중앙 [`ErrorHandler`](crate::handler::ErrorHandler)로 한 번 보고되고
//! 항목은 재시도 없이 버려집니다.

use scanrelay_core::error::CodecError;
use scanrelay_queue::QueueError;

/// 외부 도구 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// 프로세스 시작 실패 (바이너리 없음, 권한 등)
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// 실행하려던 바이너리
        program: String,
        /// 원인
        source: std::io::Error,
    },

    /// 0이 아닌 종료 코드
    #[error("{program} output: {output}, error: {status}")]
    Failed {
        /// 실행한 바이너리
        program: String,
        /// 종료 상태 (예: `exit status: 1`)
        status: String,
        /// stdout 뒤에 stderr를 붙인 출력
        output: String,
    },
}

/// 워커 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// 큐 저장소 통신 실패
    #[error("transport error: {0}")]
    Transport(#[from] QueueError),

    /// 큐 항목 디코딩 실패
    #[error("decode error: {0}")]
    Decode(CodecError),

    /// 전달할 메시지 인코딩 실패
    #[error("encode error: {0}")]
    Encode(CodecError),

    /// 외부 도구 실패
    #[error("external tool error: {0}")]
    Tool(#[from] ToolError),

    /// 파일시스템 작업 실패
    #[error("filesystem error: {context}: {source}")]
    Filesystem {
        /// 실패한 작업과 경로
        context: String,
        /// 원인
        source: std::io::Error,
    },

    /// 매니페스트 JSON 파싱 실패
    #[error("invalid manifest for {image}: {reason}")]
    InvalidManifest {
        /// 대상 이미지
        image: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 지원하지 않는 매니페스트 media type
    #[error("unsupported media type: {media_type}")]
    UnsupportedManifest {
        /// 매니페스트의 mediaType 값
        media_type: String,
    },

    /// 매니페스트에 사용할 수 있는 아키텍처가 없음
    #[error("no supported architectures found for {image}")]
    NoArchitectures {
        /// 대상 이미지
        image: String,
    },

    /// 스캔/SBOM 리포트 해석 실패
    #[error("invalid report {path}: {reason}")]
    Report {
        /// 리포트 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 웹훅 전달 실패
    #[error("webhook error: {0}")]
    Webhook(String),
}

impl WorkerError {
    pub(crate) fn fs(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Filesystem {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_failure_message_contains_output_and_status() {
        let err = WorkerError::from(ToolError::Failed {
            program: "skopeo".to_owned(),
            status: "exit status: 1".to_owned(),
            output: "boom".to_owned(),
        });
        let msg = err.to_string();
        assert!(msg.contains("boom"));
        assert!(msg.contains("exit status: 1"));
        assert!(msg.contains("skopeo"));
    }

    #[test]
    fn filesystem_error_keeps_context() {
        let err = WorkerError::fs(
            "stat /tmp/x.tar",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/tmp/x.tar"));
    }

    #[test]
    fn unsupported_manifest_names_media_type() {
        let err = WorkerError::UnsupportedManifest {
            media_type: "text/plain".to_owned(),
        };
        assert_eq!(err.to_string(), "unsupported media type: text/plain");
    }
}
