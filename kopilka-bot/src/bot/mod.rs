//! Turns webhook updates into bot replies.

pub mod commands;

use std::sync::Arc;

use crate::integrations::telegram::{BotApi, TelegramError, Update};
use commands::{BotCommand, CommandMatcher};

/// Name used when Telegram omits the sender
const FALLBACK_NAME: &str = "друг";

#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Malformed update: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unreadable request body: {0}")]
    Payload(String),

    #[error("Failed to send reply: {0}")]
    Send(#[from] TelegramError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Handled {
    Replied(BotCommand),
    Ignored,
}

pub struct Dispatcher {
    api: Arc<dyn BotApi>,
    matcher: CommandMatcher,
    web_app_url: Option<String>,
}

impl Dispatcher {
    pub fn new(
        api: Arc<dyn BotApi>,
        web_app_url: Option<String>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            api,
            matcher: CommandMatcher::new()?,
            web_app_url,
        })
    }

    pub fn parse(body: &[u8]) -> Result<Update, ProcessingError> {
        Ok(serde_json::from_slice(body)?)
    }

    pub async fn dispatch(&self, update: Update) -> Result<Handled, ProcessingError> {
        let Some(message) = update.message else {
            tracing::debug!("Update {} carries no message, ignoring", update.update_id);
            return Ok(Handled::Ignored);
        };

        let command = message
            .text
            .as_deref()
            .and_then(|text| self.matcher.parse(text));

        match command {
            Some(BotCommand::Start) => {
                let (first_name, telegram_id) = match &message.from {
                    Some(user) if !user.first_name.is_empty() => (user.first_name.as_str(), user.id),
                    Some(user) => (FALLBACK_NAME, user.id),
                    None => (FALLBACK_NAME, message.chat.id),
                };
                tracing::info!("/start from {}", first_name);

                let reply = commands::start_reply(
                    message.chat.id,
                    first_name,
                    telegram_id,
                    self.web_app_url.as_deref(),
                );
                self.api.send_message(&reply).await?;
                Ok(Handled::Replied(BotCommand::Start))
            }
            None => Ok(Handled::Ignored),
        }
    }

    /// Dispatches `update`; any error is logged and dropped.
    pub async fn process(&self, update: Update) {
        if let Err(e) = self.dispatch(update).await {
            tracing::error!("Error processing update: {}", e);
        }
    }
}
