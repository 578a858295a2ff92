use crate::error::BotError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Request fields keyed by parameter name. `Null` entries are left out of
/// the request.
pub type Params = serde_json::Map<String, Value>;

/// Decoded body of any Bot API call. Success and failure both come back as
/// this; callers inspect `ok` themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Numeric chat id or `@channelusername`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(id) => ChatId::Id(id),
            Err(_) => ChatId::Username(value.to_string()),
        }
    }
}

impl From<ChatId> for Value {
    fn from(chat_id: ChatId) -> Self {
        match chat_id {
            ChatId::Id(id) => Value::from(id),
            ChatId::Username(name) => Value::from(name),
        }
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

/// Optional fields shared by the send* methods. Fields a method does not
/// support are ignored by it.
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
    pub caption: Option<String>,
    pub disable_web_page_preview: bool,
    pub reply_to_message_id: Option<i64>,
    /// Keyboard markup object, sent as JSON.
    pub reply_markup: Option<Value>,
}

impl MessageOptions {
    pub fn with_caption(caption: &str) -> Self {
        MessageOptions {
            caption: Some(caption.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
    RecordVideo,
    UploadVideo,
    RecordAudio,
    UploadAudio,
    UploadDocument,
    FindLocation,
}

impl ChatAction {
    pub const ALL: [ChatAction; 8] = [
        ChatAction::Typing,
        ChatAction::UploadPhoto,
        ChatAction::RecordVideo,
        ChatAction::UploadVideo,
        ChatAction::RecordAudio,
        ChatAction::UploadAudio,
        ChatAction::UploadDocument,
        ChatAction::FindLocation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatAction::Typing => "typing",
            ChatAction::UploadPhoto => "upload_photo",
            ChatAction::RecordVideo => "record_video",
            ChatAction::UploadVideo => "upload_video",
            ChatAction::RecordAudio => "record_audio",
            ChatAction::UploadAudio => "upload_audio",
            ChatAction::UploadDocument => "upload_document",
            ChatAction::FindLocation => "find_location",
        }
    }
}

impl FromStr for ChatAction {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChatAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| {
                let accepted: Vec<&str> = ChatAction::ALL.iter().map(|a| a.as_str()).collect();
                BotError::InvalidChatAction(accepted.join(", "))
            })
    }
}

/// Renders one field for a query string or a multipart text part.
/// Returns `None` for `Null`, which means "leave the field out".
pub fn form_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Flattens `params` into name/value pairs, dropping `Null`s.
pub fn form_pairs(params: &Params) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(name, value)| form_value(value).map(|v| (name.clone(), v)))
        .collect()
}
