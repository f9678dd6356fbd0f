//! 외부 에러 리포팅 연동 지점
//!
//! 워커는 구체적인 에러 수집 서비스를 알지 못하고 [`ErrorNotifier`]만
//! 호출합니다. 연동이 설정되지 않은 환경에서는 [`NoopNotifier`]를 주입합니다.

use std::error::Error;

/// 에러 리포팅 서비스 capability
///
/// 스테이지는 처리 중인 이미지를 태그로 남기고, 중앙 에러 핸들러는
/// 처리 실패를 한 번씩 전달합니다.
pub trait ErrorNotifier: Send + Sync {
    /// 처리 실패 전달
    fn notify_error(&self, error: &(dyn Error + 'static));

    /// 이후 전달되는 에러에 붙을 태그 설정
    fn add_tag(&self, key: &str, value: &str);
}

/// 아무 것도 하지 않는 notifier
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl ErrorNotifier for NoopNotifier {
    fn notify_error(&self, _error: &(dyn Error + 'static)) {}

    fn add_tag(&self, _key: &str, _value: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_notifier_is_object_safe() {
        let notifier: Box<dyn ErrorNotifier> = Box::new(NoopNotifier);
        let err = std::io::Error::other("boom");
        notifier.add_tag("image.name", "busybox");
        notifier.notify_error(&err);
    }
}
