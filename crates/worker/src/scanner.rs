//! 취약점 스캐너 인자 생성

use std::path::Path;

use scanrelay_core::config::ScannerConfig;

/// 취약점 스캐너 바이너리
pub const SCANNER: &str = "trivy";

/// `image [--slow] [--parallel N] --format json --timeout T --output <report> --input <tar>`
///
/// `--parallel`은 병렬도가 0보다 클 때만 붙습니다.
pub fn scan_args(tar_path: &str, report: &Path, settings: &ScannerConfig) -> Vec<String> {
    let mut args = vec!["image".to_owned()];

    if settings.slow {
        args.push("--slow".to_owned());
    }
    if settings.parallelism > 0 {
        args.extend(["--parallel".to_owned(), settings.parallelism.to_string()]);
    }

    args.extend([
        "--format".to_owned(),
        "json".to_owned(),
        "--timeout".to_owned(),
        settings.timeout.clone(),
        "--output".to_owned(),
        report.display().to_string(),
        "--input".to_owned(),
        tar_path.to_owned(),
    ]);
    args
}

/// `image --format cyclonedx --output <report> --input <tar>`
pub fn sbom_args(tar_path: &str, report: &Path) -> Vec<String> {
    vec![
        "image".to_owned(),
        "--format".to_owned(),
        "cyclonedx".to_owned(),
        "--output".to_owned(),
        report.display().to_string(),
        "--input".to_owned(),
        tar_path.to_owned(),
    ]
}
