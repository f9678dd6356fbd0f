//! 큐 메시지 코덱 — 스테이지 간 JSON 계약
//!
//! 모든 스테이지 간 상태는 큐를 통해서만 전달되며, 이 모듈의 타입이 그
//! 직렬화 형식을 정의합니다. 큐 이름과 필드 이름은 외부 생산자/소비자와의
//! 와이어 계약이므로 바꾸면 안 됩니다.
//!
//! ```text
//! topull  {image, next_action}             --> pull   --> toscan | tosbom
//! toscan  {image, next_action, tar_path}   --> scan   --> topush
//! tosbom  {image, next_action, tar_path}   --> sbom   --> topush
//! getsize {image, next_action}             --> size   --> topush
//! topush  {operation, image, ...}          --> push   --> webhook
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

// ─── 큐 이름 ────────────────────────────────────────────────────────

/// pull 스테이지 입력 큐
pub const PULL_QUEUE: &str = "topull";
/// scan 스테이지 입력 큐
pub const SCAN_QUEUE: &str = "toscan";
/// sbom 스테이지 입력 큐
pub const SBOM_QUEUE: &str = "tosbom";
/// 멀티 아키텍처 크기 조회 입력 큐
pub const SIZE_QUEUE: &str = "getsize";
/// push 스테이지 입력 큐
pub const PUSH_QUEUE: &str = "topush";

/// 파이프라인이 사용하는 모든 입력 큐
pub const PIPELINE_QUEUES: [&str; 5] = [PULL_QUEUE, SCAN_QUEUE, SBOM_QUEUE, SIZE_QUEUE, PUSH_QUEUE];

// ─── 메시지 타입 ────────────────────────────────────────────────────

/// pull 이후 수행할 작업
///
/// 파이프라인 끝까지 보존되어 다운스트림 큐를 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextAction {
    /// 취약점 스캔
    Scan,
    /// SBOM 생성
    Sbom,
}

impl NextAction {
    /// 와이어 표현
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Sbom => "sbom",
        }
    }

    /// pull 성공 후 아티팩트 메시지를 보낼 큐
    pub fn downstream_queue(self) -> &'static str {
        match self {
            Self::Scan => SCAN_QUEUE,
            Self::Sbom => SBOM_QUEUE,
        }
    }
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NextAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan" => Ok(Self::Scan),
            "sbom" => Ok(Self::Sbom),
            other => Err(format!("unknown next action '{other}', expected 'scan' or 'sbom'")),
        }
    }
}

/// 큐에서 꺼낸 메시지가 만족해야 하는 계약
///
/// 디코딩 후 [`Envelope::check`]로 필수 필드를 검증합니다.
pub trait Envelope: DeserializeOwned {
    /// 메시지가 가리키는 이미지
    fn image(&self) -> &str;

    /// 필수 필드 검증. 기본 구현은 `image`만 확인합니다.
    fn check(&self, raw: &str) -> Result<(), CodecError> {
        require_non_empty("image", self.image(), raw)
    }
}

/// `topull` / `getsize` 입력 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeMessage {
    /// 이미지 참조 (예: `registry.example.com/app:latest`)
    pub image: String,
    /// 후속 작업
    pub next_action: NextAction,
}

impl IntakeMessage {
    pub fn new(image: impl Into<String>, next_action: NextAction) -> Self {
        Self {
            image: image.into(),
            next_action,
        }
    }
}

impl Envelope for IntakeMessage {
    fn image(&self) -> &str {
        &self.image
    }
}

/// `toscan` / `tosbom` 메시지: pull 결과 아티팩트 경로를 포함
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMessage {
    pub image: String,
    pub next_action: NextAction,
    /// docker-archive tarball 경로
    pub tar_path: String,
}

impl ArtifactMessage {
    /// 입력 메시지의 `image`/`next_action`을 그대로 이어받습니다.
    pub fn from_intake(intake: &IntakeMessage, tar_path: impl Into<String>) -> Self {
        Self {
            image: intake.image.clone(),
            next_action: intake.next_action,
            tar_path: tar_path.into(),
        }
    }
}

impl Envelope for ArtifactMessage {
    fn image(&self) -> &str {
        &self.image
    }

    fn check(&self, raw: &str) -> Result<(), CodecError> {
        require_non_empty("image", &self.image, raw)?;
        require_non_empty("tar_path", &self.tar_path, raw)
    }
}

/// push 스테이지가 수행할 작업 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "scan")]
    Scan,
    #[serde(rename = "sbom")]
    Sbom,
    #[serde(rename = "get-uncompressed-size")]
    UncompressedSize,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Sbom => "sbom",
            Self::UncompressedSize => "get-uncompressed-size",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `topush` 메시지 (DTO)
///
/// `operation` 필드로 태그된 합 타입이므로 `result_file_path`와 `sizes`가
/// 동시에 존재할 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation")]
pub enum PushRequest {
    /// 스캔 리포트 전달
    #[serde(rename = "scan")]
    Scan {
        image: String,
        result_file_path: String,
    },
    /// SBOM 리포트 전달
    #[serde(rename = "sbom")]
    Sbom {
        image: String,
        result_file_path: String,
    },
    /// 아키텍처별 비압축 크기 전달
    #[serde(rename = "get-uncompressed-size")]
    UncompressedSize {
        image: String,
        sizes: BTreeMap<String, i64>,
    },
}

impl PushRequest {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Scan { .. } => Operation::Scan,
            Self::Sbom { .. } => Operation::Sbom,
            Self::UncompressedSize { .. } => Operation::UncompressedSize,
        }
    }

    /// 스캔/SBOM 리포트 경로. 크기 조회에는 없습니다.
    pub fn result_file_path(&self) -> Option<&str> {
        match self {
            Self::Scan {
                result_file_path, ..
            }
            | Self::Sbom {
                result_file_path, ..
            } => Some(result_file_path),
            Self::UncompressedSize { .. } => None,
        }
    }
}

impl Envelope for PushRequest {
    fn image(&self) -> &str {
        match self {
            Self::Scan { image, .. } | Self::Sbom { image, .. } => image,
            Self::UncompressedSize { image, .. } => image,
        }
    }

    fn check(&self, raw: &str) -> Result<(), CodecError> {
        require_non_empty("image", self.image(), raw)?;
        match self.result_file_path() {
            Some(path) => require_non_empty("result_file_path", path, raw),
            None => Ok(()),
        }
    }
}

/// 아키텍처 하나의 fan-out 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureSize {
    pub architecture: String,
    /// tarball 크기 (바이트)
    pub size: i64,
}

/// 웹훅으로 전송되는 최종 페이로드
///
/// 작업 종류에 해당하는 필드만 직렬화됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub image: String,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ran_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbom_ran_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sbom_results: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncompressed_sizes: Option<BTreeMap<String, i64>>,
}

impl WebhookPayload {
    fn empty(image: &str, operation: Operation) -> Self {
        Self {
            image: image.to_owned(),
            operation,
            ran_at: None,
            results: None,
            sbom_ran_at: None,
            sbom_results: None,
            uncompressed_sizes: None,
        }
    }

    pub fn scan(image: &str, results: serde_json::Value, ran_at: DateTime<Utc>) -> Self {
        Self {
            ran_at: Some(ran_at.to_rfc3339()),
            results: Some(results),
            ..Self::empty(image, Operation::Scan)
        }
    }

    pub fn sbom(image: &str, components: serde_json::Value, ran_at: DateTime<Utc>) -> Self {
        Self {
            sbom_ran_at: Some(ran_at.to_rfc3339()),
            sbom_results: Some(components),
            ..Self::empty(image, Operation::Sbom)
        }
    }

    pub fn sizes(image: &str, sizes: BTreeMap<String, i64>) -> Self {
        Self {
            uncompressed_sizes: Some(sizes),
            ..Self::empty(image, Operation::UncompressedSize)
        }
    }
}

// ─── 코덱 함수 ─────────────────────────────────────────────────────

/// 큐 항목을 디코딩하고 필수 필드를 검증합니다.
pub fn decode<T: Envelope>(raw: &str) -> Result<T, CodecError> {
    let message: T = serde_json::from_str(raw).map_err(|e| CodecError::Malformed {
        reason: e.to_string(),
        raw: raw.to_owned(),
    })?;
    message.check(raw)?;
    Ok(message)
}

/// 메시지를 큐에 넣을 JSON 문자열로 인코딩합니다.
pub fn encode<T: Serialize>(message: &T) -> Result<String, CodecError> {
    serde_json::to_string(message).map_err(|e| CodecError::Encode(e.to_string()))
}

/// 이미지 이름의 `/`와 `:`를 `_`로 바꿔 파일 이름으로 쓸 수 있게 합니다.
pub fn sanitize_image_name(image: &str) -> String {
    image.replace(['/', ':'], "_")
}

/// 이미지의 리포트 파일 경로 (`<reports_dir>/<sanitized>.json`)
pub fn report_path(image: &str, reports_dir: &Path) -> PathBuf {
    reports_dir.join(format!("{}.json", sanitize_image_name(image)))
}

fn require_non_empty(field: &'static str, value: &str, raw: &str) -> Result<(), CodecError> {
    if value.trim().is_empty() {
        return Err(CodecError::EmptyField {
            field,
            raw: raw.to_owned(),
        });
    }
    Ok(())
}
