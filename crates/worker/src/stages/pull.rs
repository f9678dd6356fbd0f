//! Pull 스테이지 — 이미지를 tarball로 내려받아 scan/sbom 큐로 전달
//!
//! 1. 매니페스트로 지원 아키텍처를 조회하고 하나를 고름 (`amd64` 우선)
//! 2. `images_dir` 아래에 항목별 임시 디렉토리 생성
//! 3. `<tmp>/image.tar`로 복사
//! 4. `next_action`에 따라 `toscan` 또는 `tosbom`으로 [`ArtifactMessage`] 전달
//!
//! 임시 디렉토리는 downstream 큐 전달까지 성공했을 때만 남고, 이후 scan/sbom
//! 스테이지가 지웁니다. 복사나 전달이 실패하면 엔진이 요청을 버리면서 함께 삭제됩니다.

use tracing::info;

use scanrelay_core::message::{ArtifactMessage, IntakeMessage, PULL_QUEUE};

use crate::context::WorkerContext;
use crate::copy_tool::{COPY_TOOL, copy_args};
use crate::engine::{Forward, Stage};
use crate::error::WorkerError;
use crate::handler::ErrorHandler;
use crate::manifest::{discover_architectures, select_pull_architecture};
use crate::tool::ToolRunner;

/// 임시 디렉토리 안의 tarball 파일 이름
pub const IMAGE_ARCHIVE_NAME: &str = "image.tar";

const WORKDIR_PREFIX: &str = "trivy-scan-";

/// 단일 아키텍처 pull 스테이지
pub struct PullStage<R> {
    ctx: WorkerContext<R>,
}

impl<R: ToolRunner> PullStage<R> {
    pub fn new(ctx: WorkerContext<R>) -> Self {
        Self { ctx }
    }
}

impl<R: ToolRunner> Stage for PullStage<R> {
    type Message = IntakeMessage;

    fn name(&self) -> &'static str {
        "pull"
    }

    fn intake(&self) -> &'static str {
        PULL_QUEUE
    }

    async fn process(
        &self,
        message: IntakeMessage,
        _handler: &ErrorHandler,
    ) -> Result<Option<Forward>, WorkerError> {
        let credentials = self.ctx.credentials();
        let runner = self.ctx.runner().as_ref();

        let architectures =
            discover_architectures(runner, &message.image, credentials.as_ref()).await?;
        let architecture = select_pull_architecture(&message.image, &architectures)?;

        let images_dir = &self.ctx.config().paths.images_dir;
        let workdir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(images_dir)
            .map_err(|e| {
                WorkerError::fs(format!("create temp dir in {}", images_dir.display()), e)
            })?;
        let tarball = workdir.path().join(IMAGE_ARCHIVE_NAME);

        info!(
            image = %message.image,
            architecture = %architecture,
            tarball = %tarball.display(),
            next_action = %message.next_action,
            "pulling image"
        );

        let args = copy_args(
            &message.image,
            &tarball,
            Some(&architecture),
            credentials.as_ref(),
        );
        runner.run(COPY_TOOL, &args).await?;

        let artifact = ArtifactMessage::from_intake(&message, tarball.display().to_string());
        let forward = Forward::encode(message.next_action.downstream_queue(), &artifact)?
            .with_workdir(workdir);
        info!(image = %message.image, tarball = %tarball.display(), "image pulled");

        Ok(Some(forward))
    }
}
