use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

use crate::integrations::telegram::{BotApi, SendMessage, TelegramError};

/// Keeps every outgoing message instead of calling Telegram.
#[derive(Default)]
pub struct RecordingBotApi {
    sent: Mutex<Vec<SendMessage>>,
    fail: bool,
    delivered: Notify,
}

impl RecordingBotApi {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SendMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub async fn wait_for_send(&self) -> bool {
        tokio::time::timeout(Duration::from_secs(2), self.delivered.notified())
            .await
            .is_ok()
    }
}

#[async_trait]
impl BotApi for RecordingBotApi {
    async fn send_message(&self, message: &SendMessage) -> Result<(), TelegramError> {
        if self.fail {
            return Err(TelegramError::Api {
                status: 403,
                description: "Forbidden: bot was blocked by the user".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        self.delivered.notify_one();
        Ok(())
    }
}
