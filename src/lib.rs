pub mod config;
pub mod error;
pub mod media;
pub mod telegram;

pub use config::BotConfig;
pub use error::{BotError, Result};
pub use media::{CacheDir, MediaReference, MediaUploader};
pub use telegram::api::TelegramBot;
pub use telegram::types::{ApiResponse, ChatAction, ChatId, MessageOptions, Params};
pub use telegram::{Bot, parse_webhook_update};
