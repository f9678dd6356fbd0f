//! External tool invocation boundary.
//!
//! Stages never spawn processes directly. They hand a program name and an
//! argument vector to a [`ToolRunner`], which production code backs with
//! [`ProcessRunner`] and tests back with scripted fakes.

use std::future::Future;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::error::ToolError;

/// Flags whose following argument is a secret and must not be logged.
const SECRET_FLAGS: &[&str] = &["--src-password", "--password"];

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// stdout only. Structured output (`inspect --raw`) is read from here.
    pub stdout: String,
    /// stdout followed by stderr.
    pub combined: String,
}

impl ToolOutput {
    /// Output of a run that wrote nothing to stderr.
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        let stdout = stdout.into();
        Self {
            combined: stdout.clone(),
            stdout,
        }
    }
}

/// Trait abstracting "run a program and capture its output".
pub trait ToolRunner: Send + Sync + 'static {
    /// Runs `program` with `args` to completion.
    ///
    /// # Errors
    ///
    /// - `ToolError::Spawn`: the process could not be started
    /// - `ToolError::Failed`: non-zero exit; carries the combined output
    fn run(
        &self,
        program: &str,
        args: &[String],
    ) -> impl Future<Output = Result<ToolOutput, ToolError>> + Send;
}

/// Production [`ToolRunner`] backed by `tokio::process::Command`.
///
/// The child is killed if the returned future is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        debug!(program, args = %redact_args(args).join(" "), "running external tool");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ToolError::Spawn {
                program: program.to_owned(),
                source,
            })?;

        let combined = combine_output(&output.stdout, &output.stderr);
        if !output.status.success() {
            return Err(ToolError::Failed {
                program: program.to_owned(),
                status: output.status.to_string(),
                output: combined,
            });
        }

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            combined,
        })
    }
}

fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(stderr));
    combined
}

/// 테스트용 Mock 도구 실행기
///
/// 외부 바이너리 없이 스테이지를 실행할 수 있도록 호출을 기록하고,
/// `inspect`에는 설정된 매니페스트를, 복사/스캔에는 출력 파일을 만들어 응답합니다.
#[cfg(test)]
#[derive(Default)]
pub struct MockRunner {
    /// `inspect --raw` 응답
    pub manifest: String,
    /// 스캐너가 `--output` 경로에 쓸 리포트 내용
    pub report: String,
    /// 아키텍처별 tarball 크기 (없으면 `default_size`)
    pub sizes: std::collections::HashMap<String, u64>,
    /// 아키텍처가 지정되지 않았거나 `sizes`에 없을 때의 tarball 크기
    pub default_size: u64,
    /// 아키텍처별 복사 지연 (ms)
    pub delays_ms: std::collections::HashMap<String, u64>,
    /// 실패시킬 아키텍처
    pub failing_archs: std::collections::HashSet<String>,
    /// 설정되면 inspect 외 모든 호출이 이 출력으로 실패
    pub fail_with: Option<String>,
    /// 실행 기록 (program, args)
    pub calls: std::sync::Mutex<Vec<(String, Vec<String>)>>,
    /// 동시에 실행 중인 복사 수와 그 최댓값
    pub in_flight: std::sync::atomic::AtomicUsize,
    pub max_in_flight: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockRunner {
    /// 단일 이미지 매니페스트를 돌려주는 mock
    pub fn single_arch() -> Self {
        Self {
            manifest: r#"{"schemaVersion":2,"mediaType":"application/vnd.docker.distribution.manifest.v2+json"}"#
                .to_owned(),
            default_size: 16,
            ..Self::default()
        }
    }

    /// 주어진 아키텍처들의 매니페스트 리스트를 돌려주는 mock
    pub fn multi_arch(archs: &[&str]) -> Self {
        let manifests: Vec<serde_json::Value> = archs
            .iter()
            .map(|a| serde_json::json!({ "platform": { "architecture": a, "os": "linux" } }))
            .collect();
        Self {
            manifest: serde_json::json!({
                "schemaVersion": 2,
                "mediaType": "application/vnd.docker.distribution.manifest.list.v2+json",
                "manifests": manifests,
            })
            .to_string(),
            default_size: 16,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }
}

#[cfg(test)]
impl ToolRunner for MockRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, ToolError> {
        use std::sync::atomic::Ordering;

        self.calls
            .lock()
            .unwrap()
            .push((program.to_owned(), args.to_vec()));

        if args.first().map(String::as_str) == Some("inspect") {
            return Ok(ToolOutput::from_stdout(self.manifest.clone()));
        }

        let failed = |output: &str| ToolError::Failed {
            program: program.to_owned(),
            status: "exit status: 1".to_owned(),
            output: output.to_owned(),
        };
        if let Some(output) = &self.fail_with {
            return Err(failed(output));
        }

        let arch = Self::flag_value(args, "--override-arch").map(str::to_owned);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = arch.as_ref().and_then(|a| self.delays_ms.get(a)) {
            tokio::time::sleep(std::time::Duration::from_millis(*delay)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(arch) = &arch {
            if self.failing_archs.contains(arch) {
                return Err(failed(&format!("no image found for {arch}")));
            }
        }

        if let Some(dest) = args
            .last()
            .and_then(|a| a.strip_prefix("docker-archive://"))
        {
            let size = arch
                .as_ref()
                .and_then(|a| self.sizes.get(a))
                .copied()
                .unwrap_or(self.default_size);
            std::fs::write(dest, vec![0u8; size as usize]).unwrap();
        } else if let Some(report) = Self::flag_value(args, "--output") {
            std::fs::write(report, &self.report).unwrap();
        }

        Ok(ToolOutput::default())
    }
}

/// Returns a copy of `args` with secret values replaced, for logging.
pub fn redact_args(args: &[String]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for arg in args {
        if hide_next {
            redacted.push("<redacted>".to_owned());
            hide_next = false;
            continue;
        }
        hide_next = SECRET_FLAGS.contains(&arg.as_str());
        redacted.push(arg.clone());
    }
    redacted
}
