//! 优雅关闭
//!
//! SIGINT / SIGTERM 触发 CancellationToken，状态机在下一步开始前观察到取消并退出；
//! 循环结束后由 ShutdownCoordinator 释放外部资源（如浏览器会话），这部分不属于状态机生命周期。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// 关闭信号管理器
#[derive(Clone)]
pub struct ShutdownManager {
    shutdown_token: CancellationToken,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            shutdown_token: CancellationToken::new(),
        }
    }

    /// 状态机循环轮询的取消令牌
    pub fn token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// 安装系统信号处理器 (Ctrl+C, SIGTERM)
    pub fn install_signal_handlers(self: &Arc<Self>) {
        let token = self.token();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                tracing::info!("Received Ctrl+C, shutting down state loop");
                token.cancel();
            }
        });

        #[cfg(unix)]
        {
            let token = self.token();
            tokio::spawn(async move {
                use tokio::signal::unix::{signal, SignalKind};
                if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                    sigterm.recv().await;
                    tracing::info!("Received SIGTERM, shutting down state loop");
                    token.cancel();
                }
            });
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 循环结束后需要释放的外部资源
#[async_trait::async_trait]
pub trait ShutdownCleanup: Send + Sync {
    async fn cleanup(&self) -> anyhow::Result<()>;

    /// 用于日志
    fn name(&self) -> &'static str;
}

/// 依次执行清理任务，每个任务有独立超时
pub struct ShutdownCoordinator {
    cleanup_tasks: Vec<Arc<dyn ShutdownCleanup>>,
    timeout_secs: u64,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            cleanup_tasks: Vec::new(),
            timeout_secs: 5,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn register(&mut self, task: Arc<dyn ShutdownCleanup>) {
        self.cleanup_tasks.push(task);
    }

    pub async fn run_cleanup(&self) {
        tracing::info!("Running {} cleanup tasks...", self.cleanup_tasks.len());

        let timeout = tokio::time::Duration::from_secs(self.timeout_secs);

        for task in &self.cleanup_tasks {
            let name = task.name();
            match tokio::time::timeout(timeout, task.cleanup()).await {
                Ok(Ok(())) => {
                    tracing::info!("Cleanup task '{}' completed successfully", name);
                }
                Ok(Err(e)) => {
                    tracing::error!("Cleanup task '{}' failed: {}", name, e);
                }
                Err(_) => {
                    tracing::warn!("Cleanup task '{}' timed out after {}s", name, self.timeout_secs);
                }
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_token_clones_share_cancellation() {
        let manager = ShutdownManager::new();
        let token = manager.token();
        assert!(!token.is_cancelled());
        manager.token().cancel();
        assert!(token.is_cancelled());
    }

    struct FlagCleanup {
        called: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl ShutdownCleanup for FlagCleanup {
        async fn cleanup(&self) -> anyhow::Result<()> {
            self.called.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "FlagCleanup"
        }
    }

    struct FailingCleanup;

    #[async_trait::async_trait]
    impl ShutdownCleanup for FailingCleanup {
        async fn cleanup(&self) -> anyhow::Result<()> {
            anyhow::bail!("resource already gone")
        }

        fn name(&self) -> &'static str {
            "FailingCleanup"
        }
    }

    #[tokio::test]
    async fn test_coordinator_runs_every_task_even_after_failure() {
        let called = Arc::new(AtomicBool::new(false));
        let mut coordinator = ShutdownCoordinator::new().with_timeout(1);
        coordinator.register(Arc::new(FailingCleanup));
        coordinator.register(Arc::new(FlagCleanup { called: called.clone() }));

        coordinator.run_cleanup().await;
        assert!(called.load(Ordering::SeqCst));
    }
}
