#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 워커 에러 (`WorkerError`, `ToolError`)
//! - [`tool`]: 외부 프로세스 실행 (`ToolRunner`, `ProcessRunner`)
//! - [`copy_tool`], [`scanner`]: 외부 도구 인자
//! - [`manifest`]: 아키텍처 탐색
//! - [`context`]: 스테이지 공용 의존성 (`WorkerContext`)
//! - [`handler`]: 중앙 에러 처리 (`ErrorHandler`)
//! - [`engine`]: 워커 루프 (`Engine`, `Stage`, `Forward`)
//! - [`stages`]: pull / scan / sbom / size / push
//! - [`sink`]: 결과 전달 (`ResultSink`, `WebhookSink`)

pub mod context;
pub mod copy_tool;
pub mod engine;
pub mod error;
pub mod handler;
pub mod manifest;
pub mod scanner;
pub mod sink;
pub mod stages;
pub mod tool;

// --- Public API Re-exports ---

// Engine
pub use engine::{Engine, Forward, Outcome, Stage};

// Error handling
pub use error::{ToolError, WorkerError};
pub use handler::ErrorHandler;

// Dependencies
pub use context::WorkerContext;
pub use sink::{ResultSink, WebhookSink};
pub use tool::{ProcessRunner, ToolOutput, ToolRunner};

// Stages
pub use stages::{PullStage, PushStage, ScanMode, ScanStage, SizeStage};
