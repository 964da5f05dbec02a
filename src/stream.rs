//! OutputStream：向观察者推送状态机产出的文本
//!
//! 容量为 1 的 mpsc 通道，单消费者、先进先出；创建时预先放入 `Problem: <problem>`。
//! push 在通道满时等待（背压）；消费端被丢弃后 push 返回 StreamClosed。

use tokio::sync::mpsc;

use crate::core::FlowError;

const STREAM_CAPACITY: usize = 1;

/// 生产端，由状态机持有
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: mpsc::Sender<String>,
}

impl OutputSink {
    pub async fn push(&self, text: impl Into<String>) -> Result<(), FlowError> {
        self.tx
            .send(text.into())
            .await
            .map_err(|_| FlowError::StreamClosed)
    }
}

/// 消费端（stdout 打印或 WebSocket 转发）
#[derive(Debug)]
pub struct OutputReceiver {
    rx: mpsc::Receiver<String>,
}

impl OutputReceiver {
    /// 生产端全部释放且通道取空后返回 None
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

pub struct OutputStream;

impl OutputStream {
    pub fn new(problem: &str) -> (OutputSink, OutputReceiver) {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        // 新建通道必有空位
        let _ = tx.try_send(format!("Problem: {}", problem));
        (OutputSink { tx }, OutputReceiver { rx })
    }
}
