//! 처리 중 클레임 — 호스트별 in-flight 항목 관리
//!
//! 항목은 `queued → claimed(host) → released` 순서로 전이합니다.
//! `queued → claimed` 전이는 [`QueueStore::move_blocking`]으로 원자적으로 일어나며,
//! 클레임 리스트 이름은 `processing_<stage>_<host>`로 호스트마다 분리됩니다.
//!
//! # 해제 정책
//!
//! - [`ClaimRelease::DeleteList`]: 작업 단위가 끝나면 호스트 클레임 리스트 전체 삭제.
//!   같은 내용의 항목이 동시에 들어와도 엉뚱한 클레임을 지우지 않습니다.
//!   호스트/스테이지당 in-flight 항목이 하나라고 가정합니다.
//! - [`ClaimRelease::RemoveValue`]: 값이 같은 항목 하나만 제거 (기존 동작).

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use scanrelay_core::config::{CLAIM_RELEASE_DELETE_LIST, CLAIM_RELEASE_REMOVE_VALUE};

use crate::error::QueueError;
use crate::store::QueueStore;

/// 클레임 리스트 이름 접두어
pub const CLAIM_PREFIX: &str = "processing";

/// 호스트별 클레임 리스트 이름
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimList(String);

impl ClaimList {
    /// `processing_<stage_queue>_<host>` 이름을 만듭니다.
    pub fn for_host(stage_queue: &str, host: &str) -> Self {
        Self(format!("{CLAIM_PREFIX}_{stage_queue}_{host}"))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClaimList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 클레임 해제 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClaimRelease {
    /// 클레임 리스트 전체 삭제
    #[default]
    DeleteList,
    /// 값이 일치하는 항목 하나 제거
    RemoveValue,
}

impl ClaimRelease {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeleteList => CLAIM_RELEASE_DELETE_LIST,
            Self::RemoveValue => CLAIM_RELEASE_REMOVE_VALUE,
        }
    }
}

impl fmt::Display for ClaimRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimRelease {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CLAIM_RELEASE_DELETE_LIST => Ok(Self::DeleteList),
            CLAIM_RELEASE_REMOVE_VALUE => Ok(Self::RemoveValue),
            other => Err(format!(
                "unknown claim release policy '{other}' (expected {CLAIM_RELEASE_DELETE_LIST} or {CLAIM_RELEASE_REMOVE_VALUE})"
            )),
        }
    }
}

/// 클레임된 항목 하나
///
/// 원본 큐 항목 문자열과 그 항목이 들어 있는 클레임 리스트를 함께 보관합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    item: String,
    list: ClaimList,
}

impl Claim {
    /// `intake`에서 항목 하나를 클레임 리스트로 옮깁니다. 항목이 올 때까지 대기합니다.
    pub async fn acquire<Q: QueueStore>(
        store: &Q,
        intake: &str,
        list: &ClaimList,
    ) -> Result<Self, QueueError> {
        let item = store.move_blocking(intake, list.name()).await?;
        debug!(intake, claim_list = %list, "item claimed");
        Ok(Self {
            item,
            list: list.clone(),
        })
    }

    /// 클레임된 원본 항목
    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn list(&self) -> &ClaimList {
        &self.list
    }

    /// 정책에 따라 클레임을 해제합니다.
    pub async fn release<Q: QueueStore>(
        self,
        store: &Q,
        policy: ClaimRelease,
    ) -> Result<(), QueueError> {
        match policy {
            ClaimRelease::DeleteList => store.delete(self.list.name()).await,
            ClaimRelease::RemoveValue => {
                let removed = store.remove(self.list.name(), &self.item, 1).await?;
                if removed == 0 {
                    warn!(claim_list = %self.list, "claimed item was already gone on release");
                }
                Ok(())
            }
        }
    }
}
