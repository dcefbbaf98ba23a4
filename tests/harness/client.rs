//! TestClient - WebSocket client for the presence protocol

use std::time::Duration;

use anyhow::{bail, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// One WebSocket connection to the server
pub struct TestClient {
    write: futures_util::stream::SplitSink<WsStream, Message>,
    read: futures_util::stream::SplitStream<WsStream>,
}

impl TestClient {
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws_stream, _) = connect_async(url).await?;
        let (write, read) = ws_stream.split();
        Ok(Self { write, read })
    }

    /// Send a raw text frame
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.write.send(Message::Text(text.to_string().into())).await?;
        Ok(())
    }

    async fn send_json(&mut self, msg: Value) -> Result<()> {
        self.send_text(&msg.to_string()).await
    }

    pub async fn join(&mut self, space_id: &str, token: &str) -> Result<()> {
        self.send_json(json!({
            "type": "join",
            "payload": { "spaceId": space_id, "token": token }
        }))
        .await
    }

    /// Join and wait for the `space-joined` reply
    pub async fn join_and_wait(&mut self, space_id: &str, token: &str) -> Result<Value> {
        self.join(space_id, token).await?;
        self.expect("space-joined").await
    }

    pub async fn move_to(&mut self, x: i64, y: i64) -> Result<()> {
        self.send_json(json!({
            "type": "movement",
            "payload": { "x": x, "y": y }
        }))
        .await
    }

    pub async fn leave(&mut self) -> Result<()> {
        self.send_json(json!({ "type": "leave", "payload": {} })).await
    }

    /// Receive the next message as JSON
    pub async fn recv_json(&mut self) -> Result<Value> {
        loop {
            match self.read.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(serde_json::from_str(&text)?);
                }
                Some(Ok(Message::Close(_))) | None => {
                    bail!("WebSocket closed");
                }
                Some(Err(e)) => bail!("WebSocket error: {}", e),
                _ => continue, // Skip binary/ping/pong frames
            }
        }
    }

    /// Receive with timeout
    pub async fn recv_json_timeout(&mut self, timeout: Duration) -> Result<Value> {
        match tokio::time::timeout(timeout, self.recv_json()).await {
            Ok(result) => result,
            Err(_) => bail!("Timeout waiting for WebSocket message"),
        }
    }

    /// Wait for the next message and require it to have type `msg_type`
    pub async fn expect(&mut self, msg_type: &str) -> Result<Value> {
        let msg = self.recv_json_timeout(Duration::from_secs(5)).await?;
        if msg["type"] != msg_type {
            bail!("expected '{}', got {}", msg_type, msg);
        }
        Ok(msg)
    }

    /// Assert nothing arrives within a short window
    pub async fn expect_silence(&mut self) -> Result<()> {
        match tokio::time::timeout(Duration::from_millis(200), self.recv_json()).await {
            Err(_) => Ok(()),
            Ok(Ok(msg)) => bail!("unexpected message: {}", msg),
            Ok(Err(e)) => Err(e),
        }
    }

    /// Wait for the server to close the socket and return its close code
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        let deadline = Duration::from_secs(5);
        loop {
            match tokio::time::timeout(deadline, self.read.next()).await {
                Err(_) => bail!("Timeout waiting for close"),
                Ok(Some(Ok(Message::Close(frame)))) => {
                    return Ok(frame.map(|f| u16::from(f.code)));
                }
                Ok(None) => return Ok(None),
                Ok(Some(Ok(Message::Text(text)))) => bail!("unexpected message: {}", text.as_str()),
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => bail!("WebSocket error: {}", e),
            }
        }
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        self.write.close().await?;
        Ok(())
    }
}
