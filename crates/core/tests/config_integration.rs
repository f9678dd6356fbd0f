//! scanrelay.toml 통합 설정 테스트
//!
//! - scanrelay.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 잘못된 형식 에러 테스트

use std::io::Write;

use scanrelay_core::config::ScanRelayConfig;
use scanrelay_core::error::ConfigError;

// =============================================================================
// scanrelay.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let content = include_str!("../../../scanrelay.toml.example");
    let config = ScanRelayConfig::parse(content).expect("example config should parse");
    config
        .validate()
        .expect("example config should pass validation");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.queue.port, 6379);
    assert_eq!(config.scanner.timeout, "5m");
    assert_eq!(config.fanout.max_concurrent, 4);
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../scanrelay.toml.example");
    let parsed = ScanRelayConfig::parse(content).expect("should parse");
    let defaults = ScanRelayConfig::default();

    assert_eq!(parsed.queue.host, defaults.queue.host);
    assert_eq!(parsed.queue.max_tries, defaults.queue.max_tries);
    assert_eq!(parsed.queue.exported_queues, defaults.queue.exported_queues);
    assert_eq!(parsed.queue.claim_release, defaults.queue.claim_release);
    assert_eq!(parsed.paths.images_dir, defaults.paths.images_dir);
    assert_eq!(parsed.paths.reports_dir, defaults.paths.reports_dir);
    assert_eq!(parsed.push.timeout_secs, defaults.push.timeout_secs);
    assert_eq!(parsed.metrics.port, defaults.metrics.port);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_registry_only() {
    let toml = r#"
[registry]
username = "robot"
password = "token"
"#;
    let config = ScanRelayConfig::parse(toml).expect("should parse");
    config.validate().expect("should validate");
    assert!(config.registry.credentials().is_some());
    assert_eq!(config.queue.host, "localhost");
}

#[test]
fn empty_string_parses_with_defaults() {
    let config = ScanRelayConfig::parse("").expect("empty string should parse");
    config.validate().expect("should validate");
    assert_eq!(config.general.log_format, "json");
}

#[test]
fn invalid_type_returns_parse_error() {
    let toml = r#"
[queue]
port = "not_a_port"
"#;
    let err = ScanRelayConfig::parse(toml).unwrap_err();
    assert!(matches!(err, ConfigError::ParseFailed { .. }));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[paths]
reports_dir = "/srv/reports"
"#;

    let original = std::env::var("REPORTS_APP_DIR").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("REPORTS_APP_DIR", "/tmp/reports");
    }

    let mut config = ScanRelayConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.paths.reports_dir.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("REPORTS_APP_DIR", val),
            None => std::env::remove_var("REPORTS_APP_DIR"),
        }
    }

    assert_eq!(result, std::path::PathBuf::from("/tmp/reports"));
}

#[test]
#[serial_test::serial]
fn env_override_scanner_section() {
    let original_timeout = std::env::var("SCAN_TIMEOUT").ok();
    let original_parallel = std::env::var("SCAN_PARALLELISM").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SCAN_TIMEOUT", "15m");
        std::env::set_var("SCAN_PARALLELISM", "3");
    }

    let mut config = ScanRelayConfig::parse("").expect("should parse");
    config.apply_env_overrides();

    // SAFETY: 테스트 정리
    unsafe {
        match original_timeout {
            Some(val) => std::env::set_var("SCAN_TIMEOUT", val),
            None => std::env::remove_var("SCAN_TIMEOUT"),
        }
        match original_parallel {
            Some(val) => std::env::set_var("SCAN_PARALLELISM", val),
            None => std::env::remove_var("SCAN_PARALLELISM"),
        }
    }

    assert_eq!(config.scanner.timeout, "15m");
    assert_eq!(config.scanner.parallelism, 3);
}

#[tokio::test]
#[serial_test::serial]
async fn load_reads_file_then_validates() {
    // SAFETY: 다른 테스트가 남긴 변수 제거
    unsafe {
        std::env::remove_var("REDIS_HOST");
        std::env::remove_var("FANOUT_MAX_CONCURRENT");
    }

    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(file, "[queue]\nhost = \"redis.svc\"\n\n[fanout]\nmax_concurrent = 0")
        .expect("write");

    let err = ScanRelayConfig::load(Some(file.path())).await.unwrap_err();
    assert!(err.to_string().contains("fanout.max_concurrent"));
}

#[tokio::test]
#[serial_test::serial]
async fn load_without_file_uses_defaults() {
    // SAFETY: 다른 테스트가 남긴 변수 제거
    unsafe {
        std::env::remove_var("REDIS_HOST");
    }
    let config = ScanRelayConfig::load(None).await.expect("defaults should load");
    assert_eq!(config.queue.host, "localhost");
}
