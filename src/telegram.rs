// src/telegram.rs
//
// Telegram Bot API transport. The dispatcher only sees the `Transport`
// trait, so tests (and any future channel) swap the client out wholesale.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SendError;

pub type MessageId = i64;

/// The one operation the delivery side needs from a message channel.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<MessageId, SendError>;
}

pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(http: reqwest::Client, token: &str) -> Self {
        Self {
            http,
            base: format!("https://api.telegram.org/bot{token}"),
        }
    }

    /// Point the client at a different API host; used by tests.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<SentMessage>,
    error_code: Option<u16>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

#[derive(Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send(&self, chat_id: &str, text: &str) -> Result<MessageId, SendError> {
        let body = SendMessageBody {
            chat_id,
            text,
            parse_mode: "HTML",
            // keep messages compact in the channel
            disable_web_page_preview: true,
        };
        let resp = self
            .http
            .post(format!("{}/sendMessage", self.base))
            .json(&body)
            .send()
            .await
            .map_err(|e| SendError::Network(e.to_string()))?;

        let api: ApiResponse = resp
            .json()
            .await
            .map_err(|e| SendError::Network(format!("telegram response decode: {e}")))?;

        if api.ok {
            return Ok(api.result.map(|m| m.message_id).unwrap_or_default());
        }

        let description = api.description.unwrap_or_default();
        let lowered = description.to_lowercase();
        Err(match api.error_code {
            Some(401) | Some(403) => SendError::Unauthorized,
            Some(429) => SendError::RateLimited {
                retry_after: api
                    .parameters
                    .and_then(|p| p.retry_after)
                    .unwrap_or(30),
            },
            Some(400) if lowered.contains("chat not found") => SendError::ChatNotFound,
            Some(400) if lowered.contains("too long") => SendError::MessageTooLong,
            code => SendError::Network(format!(
                "telegram api error {:?}: {description}",
                code
            )),
        })
    }
}
