//! Scan / SBOM 스테이지 — tarball을 스캐너로 분석
//!
//! 두 모드는 스캐너 인자와 intake 큐만 다릅니다. 리포트는
//! `report_path(image, reports_dir)`에 쓰이고, 카탈로그 전송이 켜져 있으면
//! 리포트 경로를 담은 [`PushRequest`]를 `topush`로 넘깁니다.
//! tarball 디렉토리는 결과와 관계없이 항상 지웁니다.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use scanrelay_core::message::{
    ArtifactMessage, PUSH_QUEUE, PushRequest, SBOM_QUEUE, SCAN_QUEUE, report_path,
};

use crate::context::WorkerContext;
use crate::engine::{Forward, Stage};
use crate::error::WorkerError;
use crate::handler::ErrorHandler;
use crate::scanner::{SCANNER, sbom_args, scan_args};
use crate::tool::ToolRunner;

/// 스캐너 실행 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// 취약점 스캔 (JSON 리포트)
    Vulnerabilities,
    /// SBOM 생성 (CycloneDX)
    Sbom,
}

/// scan/sbom 스테이지
pub struct ScanStage<R> {
    ctx: WorkerContext<R>,
    mode: ScanMode,
}

impl<R: ToolRunner> ScanStage<R> {
    pub fn new(ctx: WorkerContext<R>, mode: ScanMode) -> Self {
        Self { ctx, mode }
    }

    pub fn vulnerabilities(ctx: WorkerContext<R>) -> Self {
        Self::new(ctx, ScanMode::Vulnerabilities)
    }

    pub fn sbom(ctx: WorkerContext<R>) -> Self {
        Self::new(ctx, ScanMode::Sbom)
    }

    async fn scan(&self, message: &ArtifactMessage) -> Result<PathBuf, WorkerError> {
        let report = report_path(&message.image, &self.ctx.config().paths.reports_dir);
        let args = match self.mode {
            ScanMode::Vulnerabilities => {
                scan_args(&message.tar_path, &report, &self.ctx.config().scanner)
            }
            ScanMode::Sbom => sbom_args(&message.tar_path, &report),
        };

        info!(
            image = %message.image,
            report = %report.display(),
            target = %message.tar_path,
            next_action = %message.next_action,
            "running scanner"
        );
        self.ctx.runner().run(SCANNER, &args).await?;
        Ok(report)
    }

    /// pull 스테이지가 만든 tarball 디렉토리를 지웁니다.
    ///
    /// tarball이 `images_dir` 바로 아래 디렉토리에 있을 때만 그 디렉토리를 지우고,
    /// 그 밖의 경로는 파일만 지웁니다.
    async fn remove_artifact(&self, tar_path: &str) {
        let tar_path = Path::new(tar_path);
        let images_dir = &self.ctx.config().paths.images_dir;
        let owned_dir = tar_path
            .parent()
            .filter(|dir| dir.parent() == Some(images_dir.as_path()));

        let result = match owned_dir {
            Some(dir) => tokio::fs::remove_dir_all(dir).await,
            None => tokio::fs::remove_file(tar_path).await,
        };
        if let Err(e) = result {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(target = %tar_path.display(), error = %e, "failed to remove artifact");
            }
        }
    }
}

impl<R: ToolRunner> Stage for ScanStage<R> {
    type Message = ArtifactMessage;

    fn name(&self) -> &'static str {
        match self.mode {
            ScanMode::Vulnerabilities => "scan",
            ScanMode::Sbom => "sbom",
        }
    }

    fn intake(&self) -> &'static str {
        match self.mode {
            ScanMode::Vulnerabilities => SCAN_QUEUE,
            ScanMode::Sbom => SBOM_QUEUE,
        }
    }

    async fn process(
        &self,
        message: ArtifactMessage,
        _handler: &ErrorHandler,
    ) -> Result<Option<Forward>, WorkerError> {
        let scanned = self.scan(&message).await;
        self.remove_artifact(&message.tar_path).await;
        let report = scanned?;

        if !self.ctx.config().push.to_catalog {
            return Ok(None);
        }

        let result_file_path = report.display().to_string();
        let request = match self.mode {
            ScanMode::Vulnerabilities => PushRequest::Scan {
                image: message.image,
                result_file_path,
            },
            ScanMode::Sbom => PushRequest::Sbom {
                image: message.image,
                result_file_path,
            },
        };
        Forward::encode(PUSH_QUEUE, &request).map(Some)
    }
}
