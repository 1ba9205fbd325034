pub mod telegram;

pub use telegram::{BotApi, TelegramClient, TelegramError, Update};
