pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use tracing::error;

/// A text message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Platform-specific chat ID as string
    pub chat_id: String,
    /// Sender's username, if they have one set
    pub user_name: Option<String>,
    /// Sender's client language (e.g. "en", "ru-RU")
    pub language_code: Option<String>,
    /// The full message text
    pub text: String,
}

/// A text message to send to a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: String,
    pub text: String,
}

impl OutgoingMessage {
    pub fn new(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
        }
    }
}

/// Sends text to a chat on the platform
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Send every message, logging failures against `user_name` instead of returning them.
pub async fn deliver(outbound: &dyn Outbound, messages: &[OutgoingMessage], user_name: &str) {
    for message in messages {
        if let Err(e) = outbound.send(&message.chat_id, &message.text).await {
            error!("Error sending message for user {}: {:#}", user_name, e);
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use anyhow::bail;
    use tokio::sync::Mutex;

    /// Records every send instead of talking to a platform
    #[derive(Default)]
    pub struct RecordingOutbound {
        pub sent: Mutex<Vec<OutgoingMessage>>,
    }

    impl RecordingOutbound {
        pub async fn messages(&self) -> Vec<OutgoingMessage> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl Outbound for RecordingOutbound {
        async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
            self.sent
                .lock()
                .await
                .push(OutgoingMessage::new(chat_id, text));
            Ok(())
        }
    }

    /// Fails every send after counting the attempt
    #[derive(Default)]
    pub struct FailingOutbound {
        pub attempts: Mutex<usize>,
    }

    #[async_trait]
    impl Outbound for FailingOutbound {
        async fn send(&self, _chat_id: &str, _text: &str) -> Result<()> {
            *self.attempts.lock().await += 1;
            bail!("chat not found")
        }
    }
}
