//! 설정 관리 — scanrelay.toml 파싱 및 런타임 설정
//!
//! [`ScanRelayConfig`]는 모든 스테이지의 설정을 담는 최상위 구조체입니다.
//! 각 스테이지 프로세스는 필요한 섹션만 읽어 사용합니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`REDIS_HOST=queue` 형식, 기존 배포 계약의 이름을 그대로 사용)
//! 3. 설정 파일 (`scanrelay.toml`, 선택)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), scanrelay_core::error::ConfigError> {
//! use std::path::Path;
//! use scanrelay_core::config::ScanRelayConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ScanRelayConfig::load(Some(Path::new("scanrelay.toml"))).await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ScanRelayConfig::parse("[queue]\nhost = \"redis\"")?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::message::PIPELINE_QUEUES;

/// 클레임 해제 방식: 호스트별 클레임 리스트 전체 삭제
pub const CLAIM_RELEASE_DELETE_LIST: &str = "delete-list";
/// 클레임 해제 방식: 값 일치 항목 하나 제거
pub const CLAIM_RELEASE_REMOVE_VALUE: &str = "remove-value";

/// scanrelay 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRelayConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 큐 저장소 설정
    #[serde(default)]
    pub queue: QueueConfig,
    /// 메트릭 엔드포인트 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// 레지스트리 인증 정보
    #[serde(default)]
    pub registry: RegistryConfig,
    /// 작업 디렉토리
    #[serde(default)]
    pub paths: PathsConfig,
    /// 스캐너 옵션
    #[serde(default)]
    pub scanner: ScannerConfig,
    /// 결과 전달 설정
    #[serde(default)]
    pub push: PushConfig,
    /// 멀티 아키텍처 fan-out 설정
    #[serde(default)]
    pub fanout: FanoutConfig,
}

impl ScanRelayConfig {
    /// 설정 파일(선택)을 로드하고 환경변수 오버라이드를 적용한 뒤 검증합니다.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                ConfigError::Read {
                    path: path.display().to_string(),
                    source: e,
                }
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseFailed {
            reason: e.to_string(),
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SCANRELAY_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SCANRELAY_LOG_FORMAT");
        override_opt_string(&mut self.general.host_id, "SCANRELAY_HOST_ID");

        // Queue
        override_string(&mut self.queue.host, "REDIS_HOST");
        override_u16(&mut self.queue.port, "REDIS_PORT");
        override_u32(&mut self.queue.max_tries, "REDIS_MAX_TRIES");
        override_u64(
            &mut self.queue.retry_interval_secs,
            "REDIS_CONNECTION_INTERVAL_RETRY",
        );
        override_words(&mut self.queue.exported_queues, "REDIS_QUEUES");
        override_string(&mut self.queue.claim_release, "SCANRELAY_CLAIM_RELEASE");

        // Metrics
        if let Ok(val) = std::env::var("SKIP_METRICS_SERVER") {
            if val == "true" {
                self.metrics.enabled = false;
            }
        }
        override_string(&mut self.metrics.listen_addr, "SCANRELAY_METRICS_ADDR");
        if let Ok(val) = std::env::var("PROMETHEUS_EXPORTER_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.metrics.port = Some(port),
                Err(_) => warn!(
                    env_key = "PROMETHEUS_EXPORTER_PORT",
                    value = val.as_str(),
                    "failed to parse u16 from env var, ignoring"
                ),
            }
        }

        // Registry
        override_opt_string(&mut self.registry.username, "REGISTRY_USERNAME");
        override_opt_string(&mut self.registry.password, "REGISTRY_PASSWORD");

        // Paths
        override_path(&mut self.paths.images_dir, "IMAGES_APP_DIR");
        override_path(&mut self.paths.reports_dir, "REPORTS_APP_DIR");

        // Scanner
        override_string(&mut self.scanner.timeout, "SCAN_TIMEOUT");
        override_u32(&mut self.scanner.parallelism, "SCAN_PARALLELISM");
        if let Ok(val) = std::env::var("SLOW_RUN") {
            self.scanner.slow = val == "1";
        }

        // Push
        if let Ok(val) = std::env::var("PUSH_TO_CATALOG") {
            self.push.to_catalog = !val.is_empty();
        }
        override_string(&mut self.push.webhook_url, "WEBHOOK_URL");
        override_u64(&mut self.push.timeout_secs, "WEBHOOK_TIMEOUT_SECS");

        // Fan-out
        override_usize(&mut self.fanout.max_concurrent, "FANOUT_MAX_CONCURRENT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if let Some(host_id) = &self.general.host_id {
            if host_id.trim().is_empty() {
                return Err(invalid("general.host_id", "must not be empty when set"));
            }
        }

        if self.queue.host.is_empty() {
            return Err(invalid("queue.host", "must not be empty"));
        }
        if self.queue.port == 0 {
            return Err(invalid("queue.port", "must not be 0"));
        }
        if self.queue.max_tries == 0 {
            return Err(invalid("queue.max_tries", "must be greater than 0"));
        }

        let valid_releases = [CLAIM_RELEASE_DELETE_LIST, CLAIM_RELEASE_REMOVE_VALUE];
        if !valid_releases.contains(&self.queue.claim_release.as_str()) {
            return Err(invalid(
                "queue.claim_release",
                format!("must be one of: {}", valid_releases.join(", ")),
            ));
        }

        if self.registry.username.is_some() != self.registry.password.is_some() {
            return Err(invalid(
                "registry",
                "username and password must be set together",
            ));
        }

        if !is_valid_duration(&self.scanner.timeout) {
            return Err(invalid(
                "scanner.timeout",
                "must be a number followed by s, m or h (e.g. 5m)",
            ));
        }

        if self.push.timeout_secs == 0 {
            return Err(invalid("push.timeout_secs", "must be greater than 0"));
        }

        if self.fanout.max_concurrent == 0 {
            return Err(invalid("fanout.max_concurrent", "must be greater than 0"));
        }

        Ok(())
    }

    /// push 스테이지 실행에 필요한 웹훅 URL 검증
    pub fn require_webhook(&self) -> Result<&str, ConfigError> {
        let url = self.push.webhook_url.trim();
        if url.is_empty() {
            return Err(invalid(
                "push.webhook_url",
                "must be set (WEBHOOK_URL) to run the push stage",
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid("push.webhook_url", "must be an http(s) URL"));
        }
        Ok(url)
    }

    /// 클레임 리스트 이름에 쓰일 호스트 식별자
    ///
    /// 설정값이 없으면 `HOSTNAME` 환경변수, `/etc/hostname`, `localhost` 순으로 찾습니다.
    pub fn host_identity(&self) -> String {
        if let Some(host_id) = &self.general.host_id {
            return host_id.clone();
        }
        detect_hostname()
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 호스트 식별자 (클레임 리스트 네임스페이스)
    pub host_id: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            host_id: None,
        }
    }
}

/// 큐 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Redis 호스트
    pub host: String,
    /// Redis 포트
    pub port: u16,
    /// 초기 연결 시도 횟수
    pub max_tries: u32,
    /// 연결 재시도 간격 (초)
    pub retry_interval_secs: u64,
    /// queue-exporter가 길이를 보고할 큐 목록
    pub exported_queues: Vec<String>,
    /// 클레임 해제 방식 (delete-list, remove-value)
    pub claim_release: String,
}

impl QueueConfig {
    /// Redis 연결 URL
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 6379,
            max_tries: 5,
            retry_interval_secs: 2,
            exported_queues: PIPELINE_QUEUES.iter().map(|q| (*q).to_owned()).collect(),
            claim_release: CLAIM_RELEASE_DELETE_LIST.to_owned(),
        }
    }
}

/// 메트릭 엔드포인트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// `/metrics` 엔드포인트 활성화
    pub enabled: bool,
    /// 수신 주소
    pub listen_addr: String,
    /// 수신 포트. 없으면 스테이지별 기본 포트를 사용
    pub port: Option<u16>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: "0.0.0.0".to_owned(),
            port: None,
        }
    }
}

/// 레지스트리 인증 정보
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl RegistryConfig {
    /// 사용자명과 비밀번호가 모두 설정된 경우에만 인증 정보를 반환합니다.
    pub fn credentials(&self) -> Option<RegistryCredentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(RegistryCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Debug for RegistryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// 레지스트리 인증 정보 (사용자명 + 비밀번호)
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// 작업 디렉토리 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// 이미지 tarball 임시 디렉토리의 상위 경로
    pub images_dir: PathBuf,
    /// 스캔/SBOM 리포트 저장 경로
    pub reports_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("/app/images"),
            reports_dir: PathBuf::from("/app/reports"),
        }
    }
}

/// 스캐너 옵션
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// 스캐너 자체 타임아웃 (`--timeout`)
    pub timeout: String,
    /// 스캐너 병렬도 (`--parallel`, 0이면 생략)
    pub parallelism: u32,
    /// 느리지만 메모리를 덜 쓰는 스캔 모드 (`--slow`)
    pub slow: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            timeout: "5m".to_owned(),
            parallelism: 0,
            slow: false,
        }
    }
}

/// 결과 전달 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// scan/sbom 결과를 `topush`로 넘길지 여부
    pub to_catalog: bool,
    /// 결과를 받을 웹훅 URL
    pub webhook_url: String,
    /// 웹훅 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            to_catalog: false,
            webhook_url: String::new(),
            timeout_secs: 30,
        }
    }
}

/// 멀티 아키텍처 fan-out 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FanoutConfig {
    /// 동시에 실행할 수 있는 아키텍처별 복사 작업 수
    pub max_concurrent: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = Some(val);
    }
}

fn override_path(target: &mut PathBuf, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        if !val.is_empty() {
            *target = PathBuf::from(val);
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

/// 공백으로 구분된 목록 (`REDIS_QUEUES="topull toscan"`)
fn override_words(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val.split_whitespace().map(str::to_owned).collect();
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
}

fn is_valid_duration(value: &str) -> bool {
    let Some(unit) = value.chars().last() else {
        return false;
    };
    if !matches!(unit, 's' | 'm' | 'h') {
        return false;
    }
    let digits = &value[..value.len() - 1];
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn detect_hostname() -> String {
    if let Ok(name) = std::env::var("HOSTNAME") {
        if !name.trim().is_empty() {
            return name.trim().to_owned();
        }
    }
    match std::fs::read_to_string("/etc/hostname") {
        Ok(name) if !name.trim().is_empty() => name.trim().to_owned(),
        _ => "localhost".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = ScanRelayConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.queue.url(), "redis://localhost:6379/");
        assert_eq!(config.queue.claim_release, CLAIM_RELEASE_DELETE_LIST);
        assert_eq!(config.queue.exported_queues.len(), 5);
        assert!(config.metrics.enabled);
        assert_eq!(config.scanner.timeout, "5m");
        assert!(!config.push.to_catalog);
        assert!(config.registry.credentials().is_none());
    }

    #[test]
    fn default_config_passes_validation() {
        ScanRelayConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_toml_merges_with_defaults() {
        let toml = r#"
[queue]
host = "redis.internal"

[fanout]
max_concurrent = 2
"#;
        let config = ScanRelayConfig::parse(toml).unwrap();
        assert_eq!(config.queue.host, "redis.internal");
        assert_eq!(config.queue.port, 6379);
        assert_eq!(config.fanout.max_concurrent, 2);
        assert_eq!(config.general.log_format, "json");
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let err = ScanRelayConfig::parse("queue = [[[").unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = ScanRelayConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_half_credentials() {
        let mut config = ScanRelayConfig::default();
        config.registry.username = Some("robot".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("registry"));
    }

    #[test]
    fn validate_rejects_zero_fanout() {
        let mut config = ScanRelayConfig::default();
        config.fanout.max_concurrent = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_claim_release() {
        let mut config = ScanRelayConfig::default();
        config.queue.claim_release = "forget".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("claim_release"));
    }

    #[test]
    fn validate_rejects_bad_scanner_timeout() {
        for bad in ["", "5", "m", "5min", "-1m"] {
            let mut config = ScanRelayConfig::default();
            config.scanner.timeout = bad.to_owned();
            assert!(config.validate().is_err(), "timeout '{bad}' should be rejected");
        }
    }

    #[test]
    fn require_webhook_rejects_empty_url() {
        let config = ScanRelayConfig::default();
        assert!(config.require_webhook().is_err());
    }

    #[test]
    fn require_webhook_accepts_https() {
        let mut config = ScanRelayConfig::default();
        config.push.webhook_url = "https://catalog.example.com/hook".to_owned();
        assert_eq!(
            config.require_webhook().unwrap(),
            "https://catalog.example.com/hook"
        );
    }

    #[test]
    fn registry_debug_redacts_password() {
        let registry = RegistryConfig {
            username: Some("robot".to_owned()),
            password: Some("hunter2".to_owned()),
        };
        let debug = format!("{registry:?}");
        assert!(!debug.contains("hunter2"));
        assert!(format!("{:?}", registry.credentials().unwrap()).contains("<redacted>"));
    }

    #[test]
    fn configured_host_id_wins() {
        let mut config = ScanRelayConfig::default();
        config.general.host_id = Some("worker-7".to_owned());
        assert_eq!(config.host_identity(), "worker-7");
    }

    #[test]
    #[serial]
    fn env_overrides_use_deployment_variable_names() {
        // SAFETY: serial 테스트에서만 환경변수를 조작합니다.
        unsafe {
            std::env::set_var("REDIS_HOST", "queue-store");
            std::env::set_var("REDIS_PORT", "6380");
            std::env::set_var("REGISTRY_USERNAME", "robot");
            std::env::set_var("REGISTRY_PASSWORD", "secret");
            std::env::set_var("PUSH_TO_CATALOG", "1");
            std::env::set_var("REDIS_QUEUES", "topull  toscan");
            std::env::set_var("SKIP_METRICS_SERVER", "true");
        }

        let mut config = ScanRelayConfig::default();
        config.apply_env_overrides();

        unsafe {
            std::env::remove_var("REDIS_HOST");
            std::env::remove_var("REDIS_PORT");
            std::env::remove_var("REGISTRY_USERNAME");
            std::env::remove_var("REGISTRY_PASSWORD");
            std::env::remove_var("PUSH_TO_CATALOG");
            std::env::remove_var("REDIS_QUEUES");
            std::env::remove_var("SKIP_METRICS_SERVER");
        }

        assert_eq!(config.queue.url(), "redis://queue-store:6380/");
        let creds = config.registry.credentials().unwrap();
        assert_eq!(creds.username, "robot");
        assert_eq!(creds.password, "secret");
        assert!(config.push.to_catalog);
        assert_eq!(config.queue.exported_queues, vec!["topull", "toscan"]);
        assert!(!config.metrics.enabled);
    }

    #[test]
    #[serial]
    fn env_override_invalid_number_keeps_original() {
        // SAFETY: serial 테스트에서만 환경변수를 조작합니다.
        unsafe { std::env::set_var("REDIS_MAX_TRIES", "lots") };
        let mut config = ScanRelayConfig::default();
        config.apply_env_overrides();
        unsafe { std::env::remove_var("REDIS_MAX_TRIES") };
        assert_eq!(config.queue.max_tries, 5);
    }

    #[test]
    #[serial]
    fn empty_push_to_catalog_disables_forwarding() {
        // SAFETY: serial 테스트에서만 환경변수를 조작합니다.
        unsafe { std::env::set_var("PUSH_TO_CATALOG", "") };
        let mut config = ScanRelayConfig::default();
        config.push.to_catalog = true;
        config.apply_env_overrides();
        unsafe { std::env::remove_var("PUSH_TO_CATALOG") };
        assert!(!config.push.to_catalog);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = ScanRelayConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = ScanRelayConfig::parse(&toml_str).unwrap();
        assert_eq!(config.queue.host, parsed.queue.host);
        assert_eq!(config.scanner.timeout, parsed.scanner.timeout);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = ScanRelayConfig::from_file("/nonexistent/path/scanrelay.toml")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
