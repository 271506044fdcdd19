//! LSP transport abstraction (framed Content-Length messages).
use async_trait::async_trait;

use crate::error::{FrameError, Result};
use crate::lsp::message_parser::classify;
use crate::lsp::types::{Message, SendMessage};

/// Minimal async trait for a framed LSP byte stream.
/// - `send` frames one JSON value (Content-Length) and writes it.
/// - `recv` returns the next decoded JSON value, or `None` on clean EOF.
#[async_trait]
pub trait LspTransport: Send {
    async fn send(&mut self, message: &serde_json::Value) -> Result<()>;

    async fn recv(&mut self) -> Result<Option<serde_json::Value>>;

    async fn send_message(&mut self, message: &SendMessage) -> Result<()> {
        let value = serde_json::to_value(message).map_err(FrameError::Serialization)?;
        self.send(&value).await
    }

    /// Receive the next message and classify it.
    async fn recv_message(&mut self) -> Result<Option<Message>> {
        match self.recv().await? {
            Some(value) => classify(&value).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsp::types::Notification;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct InMemoryTransport {
        sent: Vec<serde_json::Value>,
        incoming: VecDeque<serde_json::Value>,
    }

    #[async_trait]
    impl LspTransport for InMemoryTransport {
        async fn send(&mut self, message: &serde_json::Value) -> Result<()> {
            self.sent.push(message.clone());
            Ok(())
        }

        async fn recv(&mut self) -> Result<Option<serde_json::Value>> {
            Ok(self.incoming.pop_front())
        }
    }

    #[tokio::test]
    async fn test_send_message_serializes() {
        let mut transport = InMemoryTransport::default();
        let notification = Notification::new("initialized".into(), serde_json::json!({}));
        transport
            .send_message(&SendMessage::Notification(notification))
            .await
            .unwrap();
        assert_eq!(transport.sent[0]["method"], "initialized");
    }

    #[tokio::test]
    async fn test_recv_message_classifies() {
        let mut transport = InMemoryTransport::default();
        transport
            .incoming
            .push_back(serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
        transport.incoming.push_back(serde_json::json!("bare string"));

        let first = transport.recv_message().await.unwrap();
        assert!(matches!(first, Some(Message::Response(_))));

        let second = transport.recv_message().await;
        assert!(matches!(second, Err(FrameError::InvalidMessage(_))));

        assert!(transport.recv_message().await.unwrap().is_none());
    }
}
