//! 아키텍처 탐색 — `inspect --raw` 매니페스트 해석
//!
//! 두 가지 매니페스트 형태를 인식합니다.
//!
//! - 매니페스트 리스트 / 이미지 인덱스: 플랫폼별 항목의 아키텍처를 순서대로 수집.
//!   빈 값과 `unknown`(메타데이터 전용 항목)은 제외하고, 같은 아키텍처가 여러
//!   번 나오면(`arm` v6/v7, linux/windows `amd64` 등) 처음 위치 하나만 남깁니다.
//! - 단일 이미지 매니페스트: 아키텍처 필드가 없으므로 `amd64` 하나로 취급합니다.
//!
//! 그 외 media type은 [`WorkerError::UnsupportedManifest`]입니다.

use std::collections::HashSet;

use serde::Deserialize;

use scanrelay_core::config::RegistryCredentials;

use crate::copy_tool::{COPY_TOOL, inspect_args};
use crate::error::WorkerError;
use crate::tool::ToolRunner;

/// 기본 아키텍처
pub const DEFAULT_ARCHITECTURE: &str = "amd64";

const MANIFEST_LIST_TYPES: &[&str] = &[
    "application/vnd.docker.distribution.manifest.list.v2+json",
    "application/vnd.oci.image.index.v1+json",
];

const IMAGE_MANIFEST_TYPES: &[&str] = &[
    "application/vnd.docker.distribution.manifest.v2+json",
    "application/vnd.oci.image.manifest.v1+json",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default)]
    media_type: String,
    #[serde(default)]
    manifests: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(default)]
    platform: Platform,
}

#[derive(Debug, Default, Deserialize)]
struct Platform {
    #[serde(default)]
    architecture: String,
}

/// 매니페스트 리스트 media type 여부
pub fn is_manifest_list(media_type: &str) -> bool {
    MANIFEST_LIST_TYPES.contains(&media_type)
}

/// 단일 이미지 매니페스트 media type 여부
pub fn is_image_manifest(media_type: &str) -> bool {
    IMAGE_MANIFEST_TYPES.contains(&media_type)
}

/// 실행 가능한 바이너리를 가리키지 않는 아키텍처 값
pub fn is_unknown_architecture(architecture: &str) -> bool {
    matches!(architecture, "" | "unknown")
}

/// 매니페스트 JSON에서 지원 아키텍처 목록을 추출합니다.
pub fn parse_architectures(image: &str, raw: &str) -> Result<Vec<String>, WorkerError> {
    let manifest: RawManifest =
        serde_json::from_str(raw).map_err(|e| WorkerError::InvalidManifest {
            image: image.to_owned(),
            reason: e.to_string(),
        })?;

    if is_manifest_list(&manifest.media_type) {
        let mut seen = HashSet::new();
        return Ok(manifest
            .manifests
            .into_iter()
            .map(|entry| entry.platform.architecture)
            .filter(|arch| !is_unknown_architecture(arch))
            .filter(|arch| seen.insert(arch.clone()))
            .collect());
    }

    if is_image_manifest(&manifest.media_type) {
        return Ok(vec![DEFAULT_ARCHITECTURE.to_owned()]);
    }

    Err(WorkerError::UnsupportedManifest {
        media_type: manifest.media_type,
    })
}

/// 단일 아키텍처 pull에 사용할 아키텍처를 고릅니다.
///
/// `amd64`가 있으면 `amd64`, 없으면 매니페스트 순서상 첫 번째입니다.
pub fn select_pull_architecture(image: &str, architectures: &[String]) -> Result<String, WorkerError> {
    if architectures.iter().any(|a| a == DEFAULT_ARCHITECTURE) {
        return Ok(DEFAULT_ARCHITECTURE.to_owned());
    }
    architectures
        .first()
        .cloned()
        .ok_or_else(|| WorkerError::NoArchitectures {
            image: image.to_owned(),
        })
}

/// 복사 도구로 매니페스트를 조회해 지원 아키텍처를 반환합니다.
///
/// stderr의 경고 메시지가 JSON을 깨뜨리지 않도록 stdout만 해석합니다.
pub async fn discover_architectures<R: ToolRunner>(
    runner: &R,
    image: &str,
    credentials: Option<&RegistryCredentials>,
) -> Result<Vec<String>, WorkerError> {
    let output = runner.run(COPY_TOOL, &inspect_args(image, credentials)).await?;
    parse_architectures(image, &output.stdout)
}
