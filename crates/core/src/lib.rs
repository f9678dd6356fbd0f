#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod message;
pub mod metrics;
pub mod notifier;

// --- 주요 타입 re-export ---

// 에러
pub use error::{CodecError, ConfigError};

// 설정
pub use config::{RegistryCredentials, ScanRelayConfig};

// 메시지
pub use message::{
    ArchitectureSize, ArtifactMessage, Envelope, IntakeMessage, NextAction, Operation,
    PushRequest, WebhookPayload,
};

// 에러 리포팅
pub use notifier::{ErrorNotifier, NoopNotifier};
