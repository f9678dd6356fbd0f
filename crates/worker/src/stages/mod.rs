//! 파이프라인 스테이지
//!
//! | 스테이지 | intake | 결과 |
//! |---------|--------|------|
//! | [`PullStage`] | `topull` | `toscan` / `tosbom` |
//! | [`ScanStage`] (scan) | `toscan` | `topush` (카탈로그 전송 시) |
//! | [`ScanStage`] (sbom) | `tosbom` | `topush` (카탈로그 전송 시) |
//! | [`SizeStage`] | `getsize` | `topush` |
//! | [`PushStage`] | `topush` | 웹훅 |

pub mod pull;
pub mod push;
pub mod scan;
pub mod size;

pub use pull::{IMAGE_ARCHIVE_NAME, PullStage};
pub use push::{PushStage, build_payload, extract_results};
pub use scan::{ScanMode, ScanStage};
pub use size::{SizeStage, measure_architectures};
