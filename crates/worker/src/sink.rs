//! 결과 전달 대상
//!
//! push 스테이지는 [`ResultSink`]에만 의존합니다. 운영 환경에서는 JSON을 POST하는
//! [`WebhookSink`]를 사용합니다.

use std::future::Future;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use tracing::debug;

use scanrelay_core::message::WebhookPayload;

use crate::error::WorkerError;

/// 웹훅 페이로드를 외부로 전달하는 trait
pub trait ResultSink: Send + Sync + 'static {
    /// 페이로드 하나를 전달합니다.
    ///
    /// # Errors
    ///
    /// 전송 실패 또는 수신 측이 거절한 경우 `WorkerError::Webhook`
    fn deliver(&self, payload: &WebhookPayload) -> impl Future<Output = Result<(), WorkerError>> + Send;
}

/// HTTP 웹훅 sink
///
/// `200 OK` 외의 모든 응답은 실패로 취급합니다.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, WorkerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WorkerError::Webhook(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ResultSink for WebhookSink {
    async fn deliver(&self, payload: &WebhookPayload) -> Result<(), WorkerError> {
        debug!(url = %self.url, image = %payload.image, operation = %payload.operation, "posting result");

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| WorkerError::Webhook(format!("POST {} failed: {e}", self.url)))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(WorkerError::Webhook(format!(
                "HTTP error: {}",
                status.as_u16()
            )));
        }
        Ok(())
    }
}
