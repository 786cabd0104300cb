use crate::{
    core::decoder,
    events::app_event::ChatEvent,
    models::{
        message::ChatMessage,
        payload::{RawChatPayload, flatten_component},
    },
    utils::text_processing::{collapse_double_spaces, strip_codes},
};
use chrono::Local;
use serde_json::Value;
use tokio::sync::mpsc;

/// Decodes inbound chat components and forwards them to the session.
#[derive(Clone)]
pub struct ChatListener {
    message_tx: mpsc::Sender<ChatEvent>,
}

impl ChatListener {
    pub fn new(message_tx: mpsc::Sender<ChatEvent>) -> Self {
        Self { message_tx }
    }

    pub fn decode_component(component: &Value) -> ChatMessage {
        let payload = match RawChatPayload::from_component(component) {
            RawChatPayload::Legacy(text) => RawChatPayload::Legacy(collapse_double_spaces(&text)),
            structured => structured,
        };
        let styled = decoder::decode(&payload);
        let plain = strip_codes(&collapse_double_spaces(&flatten_component(component)));

        ChatMessage {
            plain,
            styled,
            timestamp: Local::now(),
        }
    }

    pub async fn handle_component(&self, component: &Value) {
        tracing::debug!("{}", component);

        let message = Self::decode_component(component);
        if !message.plain.is_empty() {
            tracing::info!(target: "chat", "{}", message.plain);
        }

        let event = ChatEvent::NewChatMessage(message);
        if self.message_tx.send(event).await.is_err() {
            tracing::error!("Failed to deliver chat message: channel is closed.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{color::ChatColor, message::StyleAttributes};
    use serde_json::json;

    #[tokio::test]
    async fn forwards_decoded_legacy_chat() {
        let (tx, mut rx) = mpsc::channel(4);
        let listener = ChatListener::new(tx);

        listener
            .handle_component(&json!({"text": "§cHello  §lWorld"}))
            .await;

        let Some(ChatEvent::NewChatMessage(message)) = rx.recv().await else {
            panic!("expected a chat event");
        };
        assert_eq!(message.plain, "Hello World");
        assert_eq!(message.styled.len(), 2);
        assert_eq!(message.styled.runs()[0].text, "Hello ");
        assert_eq!(
            message.styled.runs()[1].style,
            StyleAttributes {
                bold: true,
                ..StyleAttributes::colored(ChatColor::Red)
            }
        );
    }

    #[tokio::test]
    async fn forwards_structured_chat() {
        let (tx, mut rx) = mpsc::channel(4);
        let listener = ChatListener::new(tx);

        listener
            .handle_component(&json!({
                "text": "",
                "extra": [{"color": "aqua", "text": "[Guide] "}, "welcome"]
            }))
            .await;

        let Some(ChatEvent::NewChatMessage(message)) = rx.recv().await else {
            panic!("expected a chat event");
        };
        assert_eq!(message.plain, "[Guide] welcome");
        assert_eq!(
            message.styled.runs()[0].style.color,
            Some(ChatColor::Aqua)
        );
        assert_eq!(message.styled.runs()[1].style, StyleAttributes::default());
    }

    #[tokio::test]
    async fn closed_channel_is_not_fatal() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let listener = ChatListener::new(tx);
        listener.handle_component(&json!("plain text")).await;
    }
}
