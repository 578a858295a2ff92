use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Invalid media reference: {0}")]
    InvalidMediaReference(String),

    #[error("Bad file type/extension: {mime}")]
    UnsupportedMimeType { mime: String },

    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to upload to {method}: {source}")]
    Upload {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {method} failed: {source}")]
    Request {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Malformed JSON response from {method}: {source}")]
    MalformedResponse {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid Action! Accepted value: {0}")]
    InvalidChatAction(String),

    #[error("Invalid webhook URL: {0}")]
    InvalidWebhookUrl(String),

    #[error("Expected '{0}' in response")]
    MissingField(&'static str),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BotError>;
