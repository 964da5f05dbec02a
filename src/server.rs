//! WebSocket 输出流服务
//!
//! 同一时刻只服务一个客户端：连接建立后把 OutputStream 的消息逐条作为文本帧发送；
//! 客户端断开后，下一个连接从尚未发送的消息继续。流结束后服务退出。

use std::sync::Arc;

use futures_util::SinkExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::stream::OutputReceiver;

/// 服务直到输出流结束或收到取消
pub async fn serve(
    listener: TcpListener,
    output: OutputReceiver,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("Serving output stream on ws://{}", listener.local_addr()?);
    let output = Arc::new(Mutex::new(output));

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = cancel.cancelled() => return Ok(()),
        };
        tracing::info!(%peer, "stream client connected");
        match forward(stream, &output, &cancel).await {
            Ok(true) => {
                tracing::info!("output stream finished");
                return Ok(());
            }
            Ok(false) => tracing::info!(%peer, "stream client disconnected"),
            Err(e) => tracing::warn!(%peer, error = %e, "stream client failed"),
        }
    }
}

/// 返回 true 表示输出流已结束
async fn forward(
    stream: TcpStream,
    output: &Arc<Mutex<OutputReceiver>>,
    cancel: &CancellationToken,
) -> anyhow::Result<bool> {
    let mut ws = tokio_tungstenite::accept_async(stream).await?;
    let mut output = output.lock().await;
    loop {
        let next = tokio::select! {
            next = output.recv() => next,
            _ = cancel.cancelled() => {
                let _ = ws.close(None).await;
                return Ok(false);
            }
        };
        let Some(text) = next else {
            let _ = ws.close(None).await;
            return Ok(true);
        };
        if let Err(e) = ws.send(WsMessage::Text(text)).await {
            tracing::warn!(error = %e, "write to stream client failed");
            return Ok(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::OutputStream;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_client_receives_stream_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (sink, output) = OutputStream::new("p");
        let server = tokio::spawn(serve(listener, output, CancellationToken::new()));

        let producer = tokio::spawn(async move {
            sink.push("thought").await.unwrap();
        });

        let (mut client, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr))
            .await
            .unwrap();
        let mut texts = Vec::new();
        while let Some(Ok(msg)) = client.next().await {
            if let WsMessage::Text(t) = msg {
                texts.push(t);
            }
        }
        producer.await.unwrap();
        assert_eq!(texts, vec!["Problem: p".to_string(), "thought".to_string()]);
        server.await.unwrap().unwrap();
    }
}
