//! 에러 타입 — 도메인별 에러 정의
//!
//! 큐/워커 크레이트는 각자 자기 에러를 정의하고, 여기서는 여러 크레이트가
//! 공유하는 설정 에러와 메시지 코덱 에러만 둡니다.

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파일 읽기 실패
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 큐 메시지 인코딩/디코딩 에러
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// JSON 형식 오류
    #[error("malformed message: {reason}: {raw}")]
    Malformed { reason: String, raw: String },

    /// 필수 필드가 비어 있음
    #[error("message field '{field}' must not be empty: {raw}")]
    EmptyField { field: &'static str, raw: String },

    /// 직렬화 실패
    #[error("failed to encode message: {0}")]
    Encode(String),
}
