//! Size 스테이지 — 아키텍처별 fan-out/fan-in
//!
//! 한 항목 안에서 아키텍처마다 태스크 하나를 띄워 tarball을 내려받고 크기를 잽니다.
//!
//! ```text
//!                 ┌─ task(amd64) ─┐
//! discover ──────▶├─ task(arm64) ─┤──mpsc(N)──▶ BTreeMap<arch, size> ──▶ topush
//!   (N archs)     └─ task(ppc64) ─┘
//!                  Semaphore(max_concurrent)
//! ```
//!
//! - 동시에 실행되는 복사 도구 수는 `fanout.max_concurrent`로 제한됩니다.
//! - 결과 채널 용량은 아키텍처 수와 같아서 송신이 막히지 않습니다.
//! - 모든 태스크가 끝난 뒤(`JoinSet`)에 채널을 비워 맵으로 모읍니다. 완료 순서와 무관합니다.
//! - 실패한 아키텍처는 에러 처리기로 보고되고 맵에서 빠집니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use scanrelay_core::config::RegistryCredentials;
use scanrelay_core::message::{
    ArchitectureSize, IntakeMessage, PUSH_QUEUE, PushRequest, SIZE_QUEUE, sanitize_image_name,
};
use scanrelay_core::metrics::{FANOUT_ARCHITECTURES_TOTAL, LABEL_STAGE};

use crate::context::WorkerContext;
use crate::copy_tool::{COPY_TOOL, copy_args};
use crate::engine::{Forward, Stage};
use crate::error::WorkerError;
use crate::handler::ErrorHandler;
use crate::manifest::discover_architectures;
use crate::tool::ToolRunner;

const WORKDIR_PREFIX: &str = "trivy-size-";

/// 멀티 아키텍처 크기 조회 스테이지
pub struct SizeStage<R> {
    ctx: WorkerContext<R>,
}

impl<R: ToolRunner> SizeStage<R> {
    pub fn new(ctx: WorkerContext<R>) -> Self {
        Self { ctx }
    }
}

impl<R: ToolRunner> Stage for SizeStage<R> {
    type Message = IntakeMessage;

    fn name(&self) -> &'static str {
        "size"
    }

    fn intake(&self) -> &'static str {
        SIZE_QUEUE
    }

    async fn process(
        &self,
        message: IntakeMessage,
        handler: &ErrorHandler,
    ) -> Result<Option<Forward>, WorkerError> {
        let credentials = self.ctx.credentials();
        let runner = self.ctx.runner();

        let architectures =
            discover_architectures(runner.as_ref(), &message.image, credentials.as_ref()).await?;
        if architectures.is_empty() {
            return Err(WorkerError::NoArchitectures {
                image: message.image,
            });
        }
        counter!(FANOUT_ARCHITECTURES_TOTAL, LABEL_STAGE => self.name())
            .increment(architectures.len() as u64);

        let images_dir = &self.ctx.config().paths.images_dir;
        let workdir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(images_dir)
            .map_err(|e| {
                WorkerError::fs(format!("create temp dir in {}", images_dir.display()), e)
            })?;

        info!(
            image = %message.image,
            architectures = ?architectures,
            workdir = %workdir.path().display(),
            "measuring uncompressed sizes"
        );

        let sizes = measure_architectures(
            Arc::clone(runner),
            credentials,
            &message.image,
            &architectures,
            workdir.path(),
            self.ctx.config().fanout.max_concurrent,
            handler,
        )
        .await;

        info!(
            image = %message.image,
            measured = sizes.len(),
            discovered = architectures.len(),
            "sizes measured"
        );

        let request = PushRequest::UncompressedSize {
            image: message.image,
            sizes,
        };
        Forward::encode(PUSH_QUEUE, &request).map(Some)
    }
}

/// 아키텍처별로 tarball을 내려받아 크기 맵을 만듭니다.
///
/// 최대 `max_concurrent`개의 복사가 동시에 실행됩니다. 개별 아키텍처 실패는
/// `handler`로 보고되고 결과에서 빠질 뿐, 나머지 아키텍처에는 영향을 주지 않습니다.
pub async fn measure_architectures<R: ToolRunner>(
    runner: Arc<R>,
    credentials: Option<RegistryCredentials>,
    image: &str,
    architectures: &[String],
    workdir: &Path,
    max_concurrent: usize,
    handler: &ErrorHandler,
) -> BTreeMap<String, i64> {
    let mut sizes = BTreeMap::new();
    if architectures.is_empty() {
        return sizes;
    }

    let permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let (tx, mut rx) = mpsc::channel::<ArchitectureSize>(architectures.len());
    let credentials = Arc::new(credentials);
    let mut tasks = JoinSet::new();

    for architecture in architectures {
        let task = Download {
            image: image.to_owned(),
            architecture: architecture.clone(),
            tarball: tarball_path(workdir, image, architecture),
        };
        let runner = Arc::clone(&runner);
        let credentials = Arc::clone(&credentials);
        let permits = Arc::clone(&permits);
        let handler = handler.clone();
        let tx = tx.clone();

        tasks.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            match task.run(runner.as_ref(), (*credentials).as_ref()).await {
                Ok(size) => {
                    let _ = tx
                        .send(ArchitectureSize {
                            architecture: task.architecture,
                            size,
                        })
                        .await;
                }
                Err(e) => handler.handle(&e, Some(&task.image)),
            }
        });
    }
    drop(tx);

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(image, error = %e, "architecture task aborted");
        }
    }

    while let Some(result) = rx.recv().await {
        sizes.insert(result.architecture, result.size);
    }
    sizes
}

/// `<workdir>/<sanitized image>_<arch>.tar`
fn tarball_path(workdir: &Path, image: &str, architecture: &str) -> PathBuf {
    workdir.join(format!("{}_{architecture}.tar", sanitize_image_name(image)))
}

/// 아키텍처 하나의 다운로드 작업
struct Download {
    image: String,
    architecture: String,
    tarball: PathBuf,
}

impl Download {
    async fn run<R: ToolRunner>(
        &self,
        runner: &R,
        credentials: Option<&RegistryCredentials>,
    ) -> Result<i64, WorkerError> {
        debug!(
            image = %self.image,
            architecture = %self.architecture,
            tarball = %self.tarball.display(),
            "downloading architecture"
        );

        let args = copy_args(
            &self.image,
            &self.tarball,
            Some(&self.architecture),
            credentials,
        );
        runner.run(COPY_TOOL, &args).await?;

        let metadata = tokio::fs::metadata(&self.tarball)
            .await
            .map_err(|e| WorkerError::fs(format!("stat {}", self.tarball.display()), e))?;

        // 크기만 필요하므로 다른 아키텍처가 끝나기 전에 디스크를 비움
        if let Err(e) = tokio::fs::remove_file(&self.tarball).await {
            debug!(tarball = %self.tarball.display(), error = %e, "failed to remove tarball");
        }

        Ok(i64::try_from(metadata.len()).unwrap_or(i64::MAX))
    }
}
