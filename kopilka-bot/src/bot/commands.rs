use regex::Regex;

use crate::integrations::telegram::{
    InlineKeyboardButton, InlineKeyboardMarkup, SendMessage, WebAppInfo,
};

pub const OPEN_APP_BUTTON: &str = "📱 Открыть приложение";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
}

/// Text matchers, checked in order
pub struct CommandMatcher {
    start: Regex,
}

impl CommandMatcher {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            start: Regex::new(r"/start")?,
        })
    }

    pub fn parse(&self, text: &str) -> Option<BotCommand> {
        self.start.is_match(text).then_some(BotCommand::Start)
    }
}

pub fn greeting(first_name: &str) -> String {
    format!("Привет, {}! 👋\nБот работает на Render! ✅", first_name)
}

/// Reply to `/start`, with a web-app button when the app URL is known.
pub fn start_reply(
    chat_id: i64,
    first_name: &str,
    telegram_id: i64,
    web_app_url: Option<&str>,
) -> SendMessage {
    let reply_markup = web_app_url.map(|url| InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton {
            text: OPEN_APP_BUTTON.to_string(),
            web_app: Some(WebAppInfo {
                url: format!("{}/?telegram_id={}", url.trim_end_matches('/'), telegram_id),
            }),
        }]],
    });

    SendMessage {
        chat_id,
        text: greeting(first_name),
        reply_markup,
    }
}
