// src/delivery.rs
// Delivery channel: best-effort push of rendered text to a recipient

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::error::{HeraldError, Result};
use crate::recipient::RecipientId;

/// Where on the recipient's screen an announcement lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Regular chat line
    Chat,
    /// Transient status line above the hotbar
    #[default]
    ActionBar,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::ActionBar => "action_bar",
        }
    }

    /// Parse from a config/env value
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "chat" => Some(Self::Chat),
            "action_bar" | "actionbar" | "action-bar" => Some(Self::ActionBar),
            _ => None,
        }
    }
}

/// One message handed to the channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: RecipientId,
    pub text: String,
    pub mode: DisplayMode,
}

/// Fire-and-forget transport to connected recipients.
///
/// Errors are reported so they can be logged, but the scheduler never
/// retries: every entry is delivered at most once.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(&self, recipient: &RecipientId, text: &str, mode: DisplayMode) -> Result<()>;
}

/// Channel that writes every delivery to the log
#[derive(Debug, Default, Clone)]
pub struct TracingChannel;

#[async_trait]
impl DeliveryChannel for TracingChannel {
    async fn send(&self, recipient: &RecipientId, text: &str, mode: DisplayMode) -> Result<()> {
        info!(recipient = %recipient, mode = mode.as_str(), "{}", text);
        Ok(())
    }
}

/// Channel that forwards deliveries to an mpsc receiver owned by the host
/// transport layer
#[derive(Debug, Clone)]
pub struct ForwardingChannel {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl ForwardingChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl DeliveryChannel for ForwardingChannel {
    async fn send(&self, recipient: &RecipientId, text: &str, mode: DisplayMode) -> Result<()> {
        self.tx
            .send(Delivery {
                recipient: *recipient,
                text: text.to_string(),
                mode,
            })
            .map_err(|_| HeraldError::Delivery("transport receiver dropped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_mode_parse() {
        assert_eq!(DisplayMode::parse("chat"), Some(DisplayMode::Chat));
        assert_eq!(DisplayMode::parse(" CHAT "), Some(DisplayMode::Chat));
        assert_eq!(DisplayMode::parse("action_bar"), Some(DisplayMode::ActionBar));
        assert_eq!(DisplayMode::parse("actionbar"), Some(DisplayMode::ActionBar));
        assert_eq!(DisplayMode::parse("title"), None);
    }

    #[test]
    fn test_display_mode_default_is_action_bar() {
        assert_eq!(DisplayMode::default(), DisplayMode::ActionBar);
        assert_eq!(DisplayMode::default().as_str(), "action_bar");
    }

    #[tokio::test]
    async fn test_forwarding_channel_delivers() {
        let (channel, mut rx) = ForwardingChannel::new();
        let r = RecipientId::new();
        channel.send(&r, "hi", DisplayMode::Chat).await.unwrap();

        let got = rx.recv().await.unwrap();
        assert_eq!(got.recipient, r);
        assert_eq!(got.text, "hi");
        assert_eq!(got.mode, DisplayMode::Chat);
    }

    #[tokio::test]
    async fn test_forwarding_channel_reports_closed_receiver() {
        let (channel, rx) = ForwardingChannel::new();
        drop(rx);
        let err = channel
            .send(&RecipientId::new(), "hi", DisplayMode::Chat)
            .await
            .unwrap_err();
        assert!(matches!(err, HeraldError::Delivery(_)));
    }

    #[tokio::test]
    async fn test_tracing_channel_never_fails() {
        let channel = TracingChannel;
        assert!(channel.send(&RecipientId::new(), "hi", DisplayMode::ActionBar).await.is_ok());
    }
}
