//! 스테이지별 중앙 에러 처리
//!
//! 작업 단위에서 발생한 모든 에러는 [`ErrorHandler::handle`]을 정확히 한 번
//! 거칩니다. 로그 기록, 에러 카운터 증가, 외부 에러 리포팅 순서로 처리합니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use metrics::counter;
use tracing::error;

use scanrelay_core::metrics::{LABEL_STAGE, WORKER_ERRORS_TOTAL};
use scanrelay_core::notifier::ErrorNotifier;

use crate::error::WorkerError;

/// 에러 리포팅 태그: 처리 중인 이미지
pub const TAG_IMAGE: &str = "image.name";

/// 스테이지 하나의 중앙 에러 처리기
///
/// 복제본은 카운터와 notifier를 공유하므로 fan-out 태스크에 넘겨도 됩니다.
#[derive(Clone)]
pub struct ErrorHandler {
    stage: &'static str,
    notifier: Arc<dyn ErrorNotifier>,
    reported: Arc<AtomicU64>,
}

impl ErrorHandler {
    pub fn new(stage: &'static str, notifier: Arc<dyn ErrorNotifier>) -> Self {
        Self {
            stage,
            notifier,
            reported: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// 에러를 기록하고 카운트한 뒤 외부 리포팅으로 전달합니다.
    pub fn handle(&self, err: &WorkerError, image: Option<&str>) {
        error!(
            stage = self.stage,
            image = image.unwrap_or("-"),
            error = %err,
            "work item failed"
        );
        counter!(WORKER_ERRORS_TOTAL, LABEL_STAGE => self.stage).increment(1);
        self.reported.fetch_add(1, Ordering::Relaxed);
        self.notifier.notify_error(err);
    }

    /// 이후 리포팅에 처리 중인 이미지를 태그로 남깁니다.
    pub fn tag_image(&self, image: &str) {
        self.notifier.add_tag(TAG_IMAGE, image);
    }

    /// 지금까지 처리한 에러 수
    pub fn reported(&self) -> u64 {
        self.reported.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("stage", &self.stage)
            .field("reported", &self.reported())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::sync::Mutex;

    use super::*;
    use crate::error::ToolError;

    #[derive(Default)]
    struct Recording {
        errors: Mutex<Vec<String>>,
        tags: Mutex<Vec<(String, String)>>,
    }

    impl ErrorNotifier for Recording {
        fn notify_error(&self, error: &(dyn Error + 'static)) {
            self.errors.lock().unwrap().push(error.to_string());
        }

        fn add_tag(&self, key: &str, value: &str) {
            self.tags
                .lock()
                .unwrap()
                .push((key.to_owned(), value.to_owned()));
        }
    }

    #[test]
    fn handle_counts_and_notifies_once() {
        let notifier = Arc::new(Recording::default());
        let handler = ErrorHandler::new("pull", notifier.clone());

        let err = WorkerError::from(ToolError::Failed {
            program: "skopeo".to_owned(),
            status: "exit status: 1".to_owned(),
            output: "boom".to_owned(),
        });
        handler.handle(&err, Some("alpine"));

        assert_eq!(handler.reported(), 1);
        let errors = notifier.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("boom"));
    }

    #[test]
    fn clones_share_the_counter() {
        let handler = ErrorHandler::new("size", Arc::new(scanrelay_core::NoopNotifier));
        let clone = handler.clone();
        clone.handle(&WorkerError::Webhook("status 500".to_owned()), None);
        assert_eq!(handler.reported(), 1);
    }

    #[test]
    fn tag_image_uses_image_tag_key() {
        let notifier = Arc::new(Recording::default());
        let handler = ErrorHandler::new("scan", notifier.clone());
        handler.tag_image("busybox:latest");
        assert_eq!(
            notifier.tags.lock().unwrap().as_slice(),
            &[("image.name".to_owned(), "busybox:latest".to_owned())]
        );
    }
}
