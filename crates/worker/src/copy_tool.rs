//! 이미지 복사 도구 인자 생성
//!
//! 레지스트리에서 이미지를 `docker-archive` tarball로 복사하는 `copy`와
//! 매니페스트를 그대로 받는 `inspect --raw` 호출의 인자를 만듭니다.
//! 플래그 순서는 외부 도구와의 계약이므로 바꾸지 않습니다.

use std::path::Path;

use scanrelay_core::config::RegistryCredentials;

/// 이미지 복사 도구 바이너리
pub const COPY_TOOL: &str = "skopeo";

/// `copy --remove-signatures [--src-username U --src-password P] [--override-arch A] docker://<image> docker-archive://<path>`
pub fn copy_args(
    image: &str,
    archive: &Path,
    architecture: Option<&str>,
    credentials: Option<&RegistryCredentials>,
) -> Vec<String> {
    let mut args = vec!["copy".to_owned(), "--remove-signatures".to_owned()];

    if let Some(creds) = credentials {
        args.extend([
            "--src-username".to_owned(),
            creds.username.clone(),
            "--src-password".to_owned(),
            creds.password.clone(),
        ]);
    }

    if let Some(arch) = architecture.filter(|a| !a.is_empty()) {
        args.extend(["--override-arch".to_owned(), arch.to_owned()]);
    }

    args.push(format!("docker://{image}"));
    args.push(format!("docker-archive://{}", archive.display()));
    args
}

/// `inspect --raw [--username U --password P] docker://<image>`
pub fn inspect_args(image: &str, credentials: Option<&RegistryCredentials>) -> Vec<String> {
    let mut args = vec!["inspect".to_owned(), "--raw".to_owned()];

    if let Some(creds) = credentials {
        args.extend([
            "--username".to_owned(),
            creds.username.clone(),
            "--password".to_owned(),
            creds.password.clone(),
        ]);
    }

    args.push(format!("docker://{image}"));
    args
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn creds() -> RegistryCredentials {
        RegistryCredentials {
            username: "robot".to_owned(),
            password: "secret".to_owned(),
        }
    }

    #[test]
    fn copy_args_without_credentials_or_arch() {
        let args = copy_args("alpine:3", &PathBuf::from("/tmp/x/image.tar"), None, None);
        assert_eq!(
            args,
            vec![
                "copy",
                "--remove-signatures",
                "docker://alpine:3",
                "docker-archive:///tmp/x/image.tar",
            ]
        );
    }

    #[test]
    fn copy_args_place_credentials_before_uris() {
        let args = copy_args(
            "registry.example.com/app:1",
            &PathBuf::from("/images/t/image.tar"),
            Some("arm64"),
            Some(&creds()),
        );
        assert_eq!(
            args,
            vec![
                "copy",
                "--remove-signatures",
                "--src-username",
                "robot",
                "--src-password",
                "secret",
                "--override-arch",
                "arm64",
                "docker://registry.example.com/app:1",
                "docker-archive:///images/t/image.tar",
            ]
        );
    }

    #[test]
    fn copy_args_skip_empty_architecture() {
        let args = copy_args("img", &PathBuf::from("/t.tar"), Some(""), None);
        assert!(!args.contains(&"--override-arch".to_owned()));
    }

    #[test]
    fn inspect_args_with_credentials() {
        assert_eq!(
            inspect_args("img:tag", Some(&creds())),
            vec![
                "inspect",
                "--raw",
                "--username",
                "robot",
                "--password",
                "secret",
                "docker://img:tag",
            ]
        );
        assert_eq!(
            inspect_args("img:tag", None),
            vec!["inspect", "--raw", "docker://img:tag"]
        );
    }
}
