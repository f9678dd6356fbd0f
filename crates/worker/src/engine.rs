//! 워커 엔진 — 큐 기반 처리 루프
//!
//! [`Engine`]은 스테이지 하나를 반복 실행합니다. 한 작업 단위는 다음 순서를 따릅니다.
//!
//! ```text
//! intake ──move_blocking──▶ claim list
//!                               │
//!                          decode (Stage::Message)
//!                               │
//!                          Stage::process ──Err──▶ ErrorHandler
//!                               │
//!                          Forward ──push──▶ downstream queue
//!                               │
//!                          release claim (성공/실패 모두)
//! ```
//!
//! 항목은 한 번에 하나씩 끝까지 처리되며, 실패한 항목은 재시도하지 않습니다.
//! 종료 신호는 유휴 대기(blocking pop) 중에만 반영됩니다.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use scanrelay_core::message::{Envelope, decode, encode};
use scanrelay_core::metrics::{
    LABEL_IMAGE, LABEL_STAGE, TOOL_EXECUTION_DURATION_SECONDS, WORKER_OPS_PROCESSED_TOTAL,
};
use scanrelay_queue::{Claim, ClaimList, ClaimRelease, QueueStore};

use crate::error::WorkerError;
use crate::handler::ErrorHandler;

/// 전송 에러 후 기본 대기 시간
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// 스테이지 처리 결과를 다음 큐로 넘기는 요청
#[derive(Debug)]
pub struct Forward {
    /// 대상 큐 이름
    pub queue: &'static str,
    /// 인코딩된 메시지
    pub payload: String,
    /// 메시지가 가리키는 산출물 디렉토리. 전달에 실패하면 지워짐
    workdir: Option<TempDir>,
}

impl Forward {
    /// 메시지를 인코딩해 전달 요청을 만듭니다.
    pub fn encode<T: Serialize>(queue: &'static str, message: &T) -> Result<Self, WorkerError> {
        let payload = encode(message).map_err(WorkerError::Encode)?;
        Ok(Self {
            queue,
            payload,
            workdir: None,
        })
    }

    /// 다음 스테이지가 넘겨받을 작업 디렉토리를 붙입니다.
    ///
    /// 엔진은 downstream push가 성공한 뒤에만 디렉토리를 남기고, 그 전에
    /// 요청이 버려지면 디렉토리도 함께 삭제됩니다.
    pub fn with_workdir(mut self, workdir: TempDir) -> Self {
        self.workdir = Some(workdir);
        self
    }

    /// 전달이 끝난 요청의 작업 디렉토리를 소유권 없이 남깁니다.
    fn commit(self) -> Option<PathBuf> {
        self.workdir.map(TempDir::keep)
    }
}

/// 한 작업 단위의 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 처리 및 전달 완료
    Completed,
    /// 에러 처리기로 보고됨
    Failed,
}

/// 파이프라인 스테이지
///
/// 스테이지마다 다른 것은 입력 메시지 타입, 실행하는 외부 도구, 결과를 보낼 큐뿐입니다.
pub trait Stage: Send + Sync + 'static {
    /// intake 큐 항목의 메시지 타입
    type Message: Envelope + Send + 'static;

    /// 로그/메트릭에 쓰이는 스테이지 이름
    fn name(&self) -> &'static str;

    /// 블로킹 대기할 intake 큐
    fn intake(&self) -> &'static str;

    /// 메시지 하나를 처리합니다.
    ///
    /// `Ok(None)`은 전달할 결과가 없다는 뜻입니다. `handler`는 fan-out처럼 한 항목
    /// 안에서 부분 실패를 따로 보고해야 할 때 사용합니다.
    fn process(
        &self,
        message: Self::Message,
        handler: &ErrorHandler,
    ) -> impl Future<Output = Result<Option<Forward>, WorkerError>> + Send;
}

/// 스테이지 하나를 실행하는 워커 엔진
pub struct Engine<Q, S> {
    store: Arc<Q>,
    stage: S,
    claim_list: ClaimList,
    release: ClaimRelease,
    handler: ErrorHandler,
    retry_interval: Duration,
}

impl<Q: QueueStore, S: Stage> Engine<Q, S> {
    /// 호스트 식별자로 클레임 리스트를 정해 엔진을 만듭니다.
    pub fn new(store: Arc<Q>, stage: S, host: &str, handler: ErrorHandler) -> Self {
        let claim_list = ClaimList::for_host(stage.intake(), host);
        Self {
            store,
            stage,
            claim_list,
            release: ClaimRelease::default(),
            handler,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }

    /// 클레임 해제 정책을 지정합니다.
    pub fn with_claim_release(mut self, release: ClaimRelease) -> Self {
        self.release = release;
        self
    }

    /// 전송 에러 후 다음 시도까지의 대기 시간을 지정합니다.
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    pub fn handler(&self) -> &ErrorHandler {
        &self.handler
    }

    pub fn claim_list(&self) -> &ClaimList {
        &self.claim_list
    }

    /// 종료 신호가 올 때까지 항목을 하나씩 처리합니다.
    pub async fn run(&self, shutdown: CancellationToken) {
        let stage = self.stage.name();
        info!(
            stage,
            intake = self.stage.intake(),
            claim_list = %self.claim_list,
            release = %self.release,
            "worker started"
        );

        loop {
            let acquired = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                claim = Claim::acquire(self.store.as_ref(), self.stage.intake(), &self.claim_list) => claim,
            };

            match acquired {
                Ok(claim) => {
                    self.handle_claim(claim).await;
                }
                Err(e) => {
                    self.handler.handle(&WorkerError::Transport(e), None);
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_interval) => {}
                    }
                }
            }
        }

        info!(stage, "worker stopped");
    }

    /// 항목 하나를 클레임해 끝까지 처리합니다. 항목이 올 때까지 대기합니다.
    pub async fn run_once(&self) -> Outcome {
        match Claim::acquire(self.store.as_ref(), self.stage.intake(), &self.claim_list).await {
            Ok(claim) => self.handle_claim(claim).await,
            Err(e) => {
                self.handler.handle(&WorkerError::Transport(e), None);
                Outcome::Failed
            }
        }
    }

    async fn handle_claim(&self, claim: Claim) -> Outcome {
        let stage = self.stage.name();
        let span = info_span!("work_item", stage, attempt = %Uuid::new_v4());

        async move {
            let (image, result) = self.process_claim(&claim).await;
            let outcome = match result {
                Ok(()) => {
                    counter!(WORKER_OPS_PROCESSED_TOTAL, LABEL_STAGE => stage).increment(1);
                    Outcome::Completed
                }
                Err(e) => {
                    self.handler.handle(&e, image.as_deref());
                    Outcome::Failed
                }
            };

            if let Err(e) = claim.release(self.store.as_ref(), self.release).await {
                self.handler
                    .handle(&WorkerError::Transport(e), image.as_deref());
            }
            outcome
        }
        .instrument(span)
        .await
    }

    /// 디코딩부터 전달까지 수행합니다. 디코딩에 성공했다면 이미지 이름도 돌려줍니다.
    async fn process_claim(&self, claim: &Claim) -> (Option<String>, Result<(), WorkerError>) {
        let message: S::Message = match decode(claim.item()) {
            Ok(message) => message,
            Err(e) => return (None, Err(WorkerError::Decode(e))),
        };
        let image = message.image().to_owned();
        self.handler.tag_image(&image);
        info!(image = %image, claim_list = %self.claim_list, "processing item");

        let started = Instant::now();
        let forward = match self.stage.process(message, &self.handler).await {
            Ok(forward) => forward,
            Err(e) => return (Some(image), Err(e)),
        };
        let elapsed = started.elapsed();

        if let Some(forward) = forward {
            if let Err(e) = self.store.push(forward.queue, &forward.payload).await {
                return (Some(image), Err(WorkerError::Transport(e)));
            }
            debug!(queue = forward.queue, payload = %forward.payload, "result forwarded");
            if let Some(kept) = forward.commit() {
                debug!(workdir = %kept.display(), "work directory handed downstream");
            }
        }

        histogram!(
            TOOL_EXECUTION_DURATION_SECONDS,
            LABEL_STAGE => self.stage.name(),
            LABEL_IMAGE => image.clone()
        )
        .record(elapsed.as_secs_f64());
        info!(image = %image, elapsed_ms = elapsed.as_millis() as u64, "item completed");

        (Some(image), Ok(()))
    }
}
