//! 스테이지 공용 의존성 묶음
//!
//! 도구 실행기와 설정을 프로세스 시작 시 한 번 만들고 모든 스테이지에 명시적으로
//! 넘깁니다. 전역 상태는 두지 않습니다.

use std::sync::Arc;

use scanrelay_core::config::{RegistryCredentials, ScanRelayConfig};

use crate::tool::ToolRunner;

/// 외부 도구를 실행하는 스테이지가 공유하는 컨텍스트
pub struct WorkerContext<R> {
    runner: Arc<R>,
    config: Arc<ScanRelayConfig>,
}

impl<R: ToolRunner> WorkerContext<R> {
    pub fn new(runner: Arc<R>, config: Arc<ScanRelayConfig>) -> Self {
        Self { runner, config }
    }

    pub fn runner(&self) -> &Arc<R> {
        &self.runner
    }

    pub fn config(&self) -> &ScanRelayConfig {
        &self.config
    }

    /// 사용자명과 비밀번호가 모두 있을 때만 레지스트리 인증 정보를 반환합니다.
    pub fn credentials(&self) -> Option<RegistryCredentials> {
        self.config.registry.credentials()
    }
}

impl<R> Clone for WorkerContext<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            config: Arc::clone(&self.config),
        }
    }
}
