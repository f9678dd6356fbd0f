//! Push 스테이지 — 결과를 웹훅 페이로드로 만들어 전달
//!
//! scan/sbom 요청은 리포트 파일을 읽어 필요한 부분만 잘라내고
//! (`Results` / `components`), 크기 조회 요청은 맵을 그대로 싣습니다.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use scanrelay_core::message::{Operation, PUSH_QUEUE, PushRequest, WebhookPayload};

use crate::engine::{Forward, Stage};
use crate::error::WorkerError;
use crate::handler::ErrorHandler;
use crate::sink::ResultSink;

/// 결과 전달 스테이지
pub struct PushStage<K> {
    sink: K,
}

impl<K: ResultSink> PushStage<K> {
    pub fn new(sink: K) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

impl<K: ResultSink> Stage for PushStage<K> {
    type Message = PushRequest;

    fn name(&self) -> &'static str {
        "push"
    }

    fn intake(&self) -> &'static str {
        PUSH_QUEUE
    }

    async fn process(
        &self,
        message: PushRequest,
        _handler: &ErrorHandler,
    ) -> Result<Option<Forward>, WorkerError> {
        let payload = build_payload(&message, Utc::now()).await?;
        self.sink.deliver(&payload).await?;

        info!(
            image = %payload.image,
            operation = %payload.operation,
            "result delivered"
        );
        Ok(None)
    }
}

/// 요청으로부터 웹훅 페이로드를 만듭니다. scan/sbom은 리포트 파일을 읽습니다.
pub async fn build_payload(
    request: &PushRequest,
    ran_at: DateTime<Utc>,
) -> Result<WebhookPayload, WorkerError> {
    match request {
        PushRequest::Scan {
            image,
            result_file_path,
        } => {
            let report = read_report(result_file_path).await?;
            let results = extract_results(Operation::Scan, result_file_path, &report)?;
            Ok(WebhookPayload::scan(image, results, ran_at))
        }
        PushRequest::Sbom {
            image,
            result_file_path,
        } => {
            let report = read_report(result_file_path).await?;
            let components = extract_results(Operation::Sbom, result_file_path, &report)?;
            Ok(WebhookPayload::sbom(image, components, ran_at))
        }
        PushRequest::UncompressedSize { image, sizes } => {
            Ok(WebhookPayload::sizes(image, sizes.clone()))
        }
    }
}

/// 리포트 JSON에서 전달할 부분을 꺼냅니다.
///
/// scan은 `Results`, sbom은 `components` 필드입니다. 필드가 없으면 `null`입니다.
pub fn extract_results(operation: Operation, path: &str, raw: &str) -> Result<Value, WorkerError> {
    let key = match operation {
        Operation::Scan => "Results",
        Operation::Sbom => "components",
        Operation::UncompressedSize => {
            return Err(WorkerError::Report {
                path: path.to_owned(),
                reason: format!("operation {operation} has no report"),
            });
        }
    };

    let mut report: Value = serde_json::from_str(raw).map_err(|e| WorkerError::Report {
        path: path.to_owned(),
        reason: e.to_string(),
    })?;

    Ok(report
        .get_mut(key)
        .map(Value::take)
        .unwrap_or(Value::Null))
}

async fn read_report(path: &str) -> Result<String, WorkerError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| WorkerError::fs(format!("read report {path}"), e))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use scanrelay_core::NoopNotifier;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<WebhookPayload>>,
    }

    impl ResultSink for RecordingSink {
        async fn deliver(&self, payload: &WebhookPayload) -> Result<(), WorkerError> {
            self.delivered.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    struct RejectingSink;

    impl ResultSink for RejectingSink {
        async fn deliver(&self, _payload: &WebhookPayload) -> Result<(), WorkerError> {
            Err(WorkerError::Webhook("HTTP error: 500".to_owned()))
        }
    }

    fn ran_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn handler() -> ErrorHandler {
        ErrorHandler::new("push", Arc::new(NoopNotifier))
    }

    #[test]
    fn extract_results_picks_operation_field() {
        let raw = r#"{"SchemaVersion":2,"Results":[{"Target":"x"}],"components":[1]}"#;
        assert_eq!(
            extract_results(Operation::Scan, "r.json", raw).unwrap(),
            json!([{"Target":"x"}])
        );
        assert_eq!(
            extract_results(Operation::Sbom, "r.json", raw).unwrap(),
            json!([1])
        );
    }

    #[test]
    fn extract_results_missing_field_is_null() {
        assert_eq!(
            extract_results(Operation::Scan, "r.json", r#"{"SchemaVersion":2}"#).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn extract_results_rejects_invalid_json() {
        let err = extract_results(Operation::Sbom, "r.json", "{not json").unwrap_err();
        assert!(matches!(err, WorkerError::Report { ref path, .. } if path == "r.json"));
    }

    #[tokio::test]
    async fn scan_payload_reads_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("alpine_3.json");
        std::fs::write(&report, r#"{"Results":[{"Target":"alpine"}]}"#).unwrap();

        let request = PushRequest::Scan {
            image: "alpine:3".to_owned(),
            result_file_path: report.display().to_string(),
        };
        let payload = build_payload(&request, ran_at()).await.unwrap();

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "image": "alpine:3",
                "operation": "scan",
                "ran_at": "2024-05-01T12:00:00+00:00",
                "results": [{"Target": "alpine"}],
            })
        );
    }

    #[tokio::test]
    async fn missing_report_is_a_filesystem_error() {
        let request = PushRequest::Sbom {
            image: "alpine:3".to_owned(),
            result_file_path: "/nonexistent/scanrelay/report.json".to_owned(),
        };
        let err = build_payload(&request, ran_at()).await.unwrap_err();
        assert!(matches!(err, WorkerError::Filesystem { .. }));
    }

    #[tokio::test]
    async fn stage_delivers_size_payload() {
        let stage = PushStage::new(RecordingSink::default());
        let request = PushRequest::UncompressedSize {
            image: "alpine:3".to_owned(),
            sizes: BTreeMap::from([("amd64".to_owned(), 7), ("arm64".to_owned(), 9)]),
        };

        let forward = stage.process(request, &handler()).await.unwrap();

        assert!(forward.is_none());
        let delivered = stage.sink().delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].operation, Operation::UncompressedSize);
        assert_eq!(
            delivered[0].uncompressed_sizes.as_ref().unwrap().get("arm64"),
            Some(&9)
        );
    }

    #[tokio::test]
    async fn sink_rejection_fails_the_item() {
        let stage = PushStage::new(RejectingSink);
        let request = PushRequest::UncompressedSize {
            image: "alpine:3".to_owned(),
            sizes: BTreeMap::new(),
        };
        let err = stage.process(request, &handler()).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
