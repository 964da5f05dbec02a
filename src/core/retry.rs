//! 重试策略：固定间隔、可选次数上限、永久错误立即返回
//!
//! 操作返回 RetryError::Transient 时等待 delay 后重试；返回 RetryError::Permanent 时立即向上抛出。
//! notify 钩子在每次将要重试的失败后调用，仅用于日志，不影响控制流。

use std::future::Future;
use std::time::Duration;

/// 单次尝试的失败分类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// 暂时性失败（网络、限流等），继续重试
    Transient(E),
    /// 永久性失败，不再重试
    Permanent(E),
}

/// 固定间隔重试策略；max_attempts 为 None 时不限次数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::constant(Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// 固定间隔、无次数上限
    pub fn constant(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts.max(1));
        self
    }

    /// 执行 op 直到成功、遇到永久错误或达到次数上限
    pub async fn retry_notify<T, E, F, Fut, N>(&self, mut op: F, mut notify: N) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RetryError<E>>>,
        N: FnMut(&E, Duration),
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(RetryError::Permanent(e)) => return Err(e),
                Err(RetryError::Transient(e)) => {
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        return Err(e);
                    }
                    notify(&e, self.delay);
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::constant(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let mut notified = 0;
        let result: Result<&str, String> = fast()
            .retry_notify(
                || async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(RetryError::Transient("flaky".to_string()))
                    } else {
                        Ok("done")
                    }
                },
                |_, _| notified += 1,
            )
            .await;
        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(notified, 2);
    }

    #[tokio::test]
    async fn test_permanent_stops_immediately() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let mut notified = 0;
        let result: Result<(), String> = fast()
            .retry_notify(
                || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(RetryError::Permanent("broken".to_string()))
                },
                |_, _| notified += 1,
            )
            .await;
        assert_eq!(result, Err("broken".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(notified, 0);
    }

    #[tokio::test]
    async fn test_max_attempts_surfaces_last_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), String> = fast()
            .with_max_attempts(3)
            .retry_notify(
                || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Err(RetryError::Transient(format!("attempt {n}")))
                },
                |_, _| {},
            )
            .await;
        assert_eq!(result, Err("attempt 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
