//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 스테이지는 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `scanrelay_`
//! - 접미어: `_total` (counter), `_seconds` (histogram), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(
//!     scanrelay_core::metrics::WORKER_OPS_PROCESSED_TOTAL,
//!     scanrelay_core::metrics::LABEL_STAGE => "pull"
//! )
//! .increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 스테이지 레이블 키 (pull, scan, sbom, size, push)
pub const LABEL_STAGE: &str = "stage";

/// 이미지 레이블 키
pub const LABEL_IMAGE: &str = "image";

/// 큐 이름 레이블 키
pub const LABEL_QUEUE: &str = "queue";

/// 호스트 레이블 키
pub const LABEL_HOST: &str = "host";

// ─── Worker 메트릭 ─────────────────────────────────────────────────

/// Worker: 성공적으로 처리된 항목 수 (counter, label: stage)
pub const WORKER_OPS_PROCESSED_TOTAL: &str = "scanrelay_worker_processed_ops_total";

/// Worker: 처리 중 발생한 에러 수 (counter, label: stage)
pub const WORKER_ERRORS_TOTAL: &str = "scanrelay_worker_processed_errors_total";

/// Worker: 외부 도구 실행 시간 (histogram, 초, labels: stage, image)
pub const TOOL_EXECUTION_DURATION_SECONDS: &str = "scanrelay_tool_execution_duration_seconds";

/// Worker: fan-out으로 조회한 아키텍처 수 (counter, label: stage)
pub const FANOUT_ARCHITECTURES_TOTAL: &str = "scanrelay_fanout_architectures_total";

// ─── Queue 메트릭 ──────────────────────────────────────────────────

/// Queue: 큐 길이 (gauge, labels: host, queue)
pub const QUEUE_LENGTH: &str = "scanrelay_queue_length";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 외부 도구 실행 시간 히스토그램 버킷 (초)
///
/// 0 ~ 95s, 5초 간격. 이미지 복사와 스캔은 수 초에서 수 분이 걸립니다.
pub const TOOL_DURATION_BUCKETS: [f64; 20] = [
    0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0,
    75.0, 80.0, 85.0, 90.0, 95.0,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        WORKER_OPS_PROCESSED_TOTAL,
        "Total number of queue items processed successfully per stage"
    );
    describe_counter!(
        WORKER_ERRORS_TOTAL,
        "Total number of errors reported by the central error handler per stage"
    );
    describe_histogram!(
        TOOL_EXECUTION_DURATION_SECONDS,
        "Duration of external tool execution per stage and image in seconds"
    );
    describe_counter!(
        FANOUT_ARCHITECTURES_TOTAL,
        "Total number of per-architecture downloads started by the size fan-out"
    );
    describe_gauge!(QUEUE_LENGTH, "Length of queue store lists");
}
