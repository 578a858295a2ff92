use crate::error::Result;
use serde_json::Value;
use types::{ApiResponse, ChatAction, ChatId, MessageOptions};

pub mod api;
pub mod types;

/// One method per Bot API endpoint. Every call returns the decoded response
/// body, whether or not the API reported success.
pub trait Bot {
    fn get_me(&self) -> Result<ApiResponse>;
    fn poll_updates(
        &self,
        offset: i64,
        timeout: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ApiResponse>;
    fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse>;
    fn forward_message(
        &self,
        chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: i64,
    ) -> Result<ApiResponse>;
    /// `photo` may be a local path, an http(s) URL or an existing `file_id`.
    fn send_photo(&self, chat_id: ChatId, photo: &str, options: &MessageOptions)
    -> Result<ApiResponse>;
    fn send_audio(&self, chat_id: ChatId, audio: &str, options: &MessageOptions)
    -> Result<ApiResponse>;
    fn send_document(
        &self,
        chat_id: ChatId,
        document: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse>;
    fn send_sticker(
        &self,
        chat_id: ChatId,
        sticker: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse>;
    fn send_video(&self, chat_id: ChatId, video: &str, options: &MessageOptions)
    -> Result<ApiResponse>;
    fn send_location(
        &self,
        chat_id: ChatId,
        latitude: f64,
        longitude: f64,
        options: &MessageOptions,
    ) -> Result<ApiResponse>;
    fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<ApiResponse>;
    fn get_user_profile_photos(
        &self,
        user_id: i64,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ApiResponse>;
    fn set_webhook(&self, url: &str) -> Result<ApiResponse>;
    fn remove_webhook(&self) -> Result<ApiResponse>;
    fn get_file(&self, file_id: &str) -> Result<ApiResponse>;
    fn get_file_url(&self, file_id: &str) -> Result<String>;
    fn delete_message(&self, chat_id: ChatId, message_id: i64) -> Result<bool>;
}

/// Decodes the JSON body of an incoming webhook request.
pub fn parse_webhook_update<R: std::io::Read>(body: R) -> Result<Value> {
    serde_json::from_reader(body).map_err(|source| crate::error::BotError::MalformedResponse {
        method: "webhook".to_string(),
        source,
    })
}
