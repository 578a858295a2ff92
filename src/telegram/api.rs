use super::Bot;
use super::types::{ApiResponse, ChatAction, ChatId, MessageOptions, Params, form_pairs};
use crate::config::BotConfig;
use crate::error::{BotError, Result};
use crate::media::{CacheDir, MediaReference, MediaUploader};
use log::{debug, error, info};
use reqwest::blocking::Client;
use serde_json::{Value, json};

pub struct TelegramBot {
    config: BotConfig,
    base_url: String,
    client: Client,
    uploader: MediaUploader,
}

impl TelegramBot {
    pub fn new(config: BotConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BotError::Config(format!("failed to build HTTP client: {}", e)))?;
        let base_url = config.base_url();
        let cache = CacheDir::new(&config.cache_dir)?;
        let uploader = MediaUploader::new(client.clone(), &base_url, cache);
        Ok(TelegramBot {
            config,
            base_url,
            client,
            uploader,
        })
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// `GET {base}/{method}` with `params` as the query string.
    fn send_request(&self, method: &str, params: &Params) -> Result<ApiResponse> {
        let url = format!("{}/{}", self.base_url, method);
        debug!("Requesting {}", method);

        let request_err = |source: reqwest::Error| BotError::Request {
            method: method.to_string(),
            source: source.without_url(),
        };
        let response = self
            .client
            .get(&url)
            .query(&form_pairs(params))
            .send()
            .map_err(request_err)?;
        let status = response.status();
        let body = response.text().map_err(request_err)?;

        let parsed: ApiResponse =
            serde_json::from_str(&body).map_err(|source| BotError::MalformedResponse {
                method: method.to_string(),
                source,
            })?;
        if !parsed.ok {
            error!("{} failed: {} - {}", method, status, body);
        }
        Ok(parsed)
    }

    /// Uploads local files and URLs; anything else is taken to be a `file_id`
    /// already known to Telegram and goes out as a plain parameter.
    fn send_media(&self, method: &str, media_field: &str, params: Params) -> Result<ApiResponse> {
        let media = params
            .get(media_field)
            .and_then(Value::as_str)
            .unwrap_or_default();
        match MediaReference::classify(media) {
            reference @ (MediaReference::Local(_) | MediaReference::Remote(_)) => self
                .uploader
                .upload_reference(method, media_field, reference, &params),
            MediaReference::Invalid(value) if is_file_id(&value) => {
                debug!("Sending {} by file_id", media_field);
                self.send_request(method, &params)
            }
            MediaReference::Invalid(value) => Err(BotError::InvalidMediaReference(value)),
        }
    }
}

/// Telegram file ids are URL-safe base64: no whitespace, no path separators.
fn is_file_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn media_params(chat_id: ChatId, field: &str, media: &str, options: &MessageOptions) -> Params {
    let mut params = Params::new();
    params.insert("chat_id".into(), chat_id.into());
    params.insert(field.into(), json!(media));
    params.insert("reply_to_message_id".into(), json!(options.reply_to_message_id));
    params.insert("reply_markup".into(), json!(options.reply_markup));
    params
}

impl Bot for TelegramBot {
    fn get_me(&self) -> Result<ApiResponse> {
        self.send_request("getMe", &Params::new())
    }

    fn poll_updates(
        &self,
        offset: i64,
        timeout: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ApiResponse> {
        let mut params = Params::new();
        params.insert("offset".into(), json!(offset));
        params.insert("limit".into(), json!(limit));
        params.insert("timeout".into(), json!(timeout));
        self.send_request("getUpdates", &params)
    }

    fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse> {
        let mut params = Params::new();
        params.insert("chat_id".into(), chat_id.into());
        params.insert("text".into(), json!(text));
        params.insert(
            "disable_web_page_preview".into(),
            json!(options.disable_web_page_preview),
        );
        params.insert("reply_to_message_id".into(), json!(options.reply_to_message_id));
        params.insert("reply_markup".into(), json!(options.reply_markup));
        self.send_request("sendMessage", &params)
    }

    fn forward_message(
        &self,
        chat_id: ChatId,
        from_chat_id: ChatId,
        message_id: i64,
    ) -> Result<ApiResponse> {
        let mut params = Params::new();
        params.insert("chat_id".into(), chat_id.into());
        params.insert("from_chat_id".into(), from_chat_id.into());
        params.insert("message_id".into(), json!(message_id));
        self.send_request("forwardMessage", &params)
    }

    fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse> {
        let mut params = media_params(chat_id, "photo", photo, options);
        params.insert("caption".into(), json!(options.caption));
        self.send_media("sendPhoto", "photo", params)
    }

    fn send_audio(
        &self,
        chat_id: ChatId,
        audio: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse> {
        let params = media_params(chat_id, "audio", audio, options);
        self.send_media("sendAudio", "audio", params)
    }

    fn send_document(
        &self,
        chat_id: ChatId,
        document: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse> {
        let params = media_params(chat_id, "document", document, options);
        self.send_media("sendDocument", "document", params)
    }

    fn send_sticker(
        &self,
        chat_id: ChatId,
        sticker: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse> {
        let params = media_params(chat_id, "sticker", sticker, options);
        self.send_media("sendSticker", "sticker", params)
    }

    fn send_video(
        &self,
        chat_id: ChatId,
        video: &str,
        options: &MessageOptions,
    ) -> Result<ApiResponse> {
        let params = media_params(chat_id, "video", video, options);
        self.send_media("sendVideo", "video", params)
    }

    fn send_location(
        &self,
        chat_id: ChatId,
        latitude: f64,
        longitude: f64,
        options: &MessageOptions,
    ) -> Result<ApiResponse> {
        let mut params = Params::new();
        params.insert("chat_id".into(), chat_id.into());
        params.insert("latitude".into(), json!(latitude));
        params.insert("longitude".into(), json!(longitude));
        params.insert("reply_to_message_id".into(), json!(options.reply_to_message_id));
        params.insert("reply_markup".into(), json!(options.reply_markup));
        self.send_request("sendLocation", &params)
    }

    fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<ApiResponse> {
        let mut params = Params::new();
        params.insert("chat_id".into(), chat_id.into());
        params.insert("action".into(), json!(action.as_str()));
        self.send_request("sendChatAction", &params)
    }

    fn get_user_profile_photos(
        &self,
        user_id: i64,
        offset: Option<u32>,
        limit: Option<u32>,
    ) -> Result<ApiResponse> {
        let mut params = Params::new();
        params.insert("user_id".into(), json!(user_id));
        params.insert("offset".into(), json!(offset));
        params.insert("limit".into(), json!(limit));
        self.send_request("getUserProfilePhotos", &params)
    }

    fn set_webhook(&self, url: &str) -> Result<ApiResponse> {
        let parsed = url::Url::parse(url)
            .map_err(|_| BotError::InvalidWebhookUrl("Invalid URL provided".to_string()))?;
        if parsed.scheme() != "https" {
            return Err(BotError::InvalidWebhookUrl(
                "Invalid URL, it should be a HTTPS url.".to_string(),
            ));
        }
        let mut params = Params::new();
        params.insert("url".into(), json!(url));
        let res = self.send_request("setWebhook", &params)?;
        info!("Webhook set: ok={}", res.ok);
        Ok(res)
    }

    fn remove_webhook(&self) -> Result<ApiResponse> {
        let mut params = Params::new();
        params.insert("url".into(), json!(""));
        self.send_request("setWebhook", &params)
    }

    fn get_file(&self, file_id: &str) -> Result<ApiResponse> {
        let mut params = Params::new();
        params.insert("file_id".into(), json!(file_id));
        self.send_request("getFile", &params)
    }

    fn get_file_url(&self, file_id: &str) -> Result<String> {
        let res = self.get_file(file_id)?;
        if !res.ok {
            error!("Failed to get file path: {:?}", res);
            return Err(BotError::MissingField("file_path"));
        }
        let file_path = res
            .result
            .as_ref()
            .and_then(|r| r.get("file_path"))
            .and_then(Value::as_str)
            .ok_or(BotError::MissingField("file_path"))?;
        Ok(self.config.file_url(file_path))
    }

    fn delete_message(&self, chat_id: ChatId, message_id: i64) -> Result<bool> {
        let mut params = Params::new();
        params.insert("chat_id".into(), chat_id.into());
        params.insert("message_id".into(), json!(message_id));
        let res = self.send_request("deleteMessage", &params)?;
        Ok(res.ok && res.result.as_ref().and_then(Value::as_bool).unwrap_or(false))
    }
}
