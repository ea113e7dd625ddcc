//! Telegram Bot API client module
//!
//! Wraps the handful of Bot API methods the bot needs: posting text, posting a
//! photo with a caption, and long-polling for updates.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::Transport;
use crate::core::models::ParseMode;
use crate::errors::PostError;

const API_BASE: &str = "https://api.telegram.org";

/// Seconds Telegram holds a `getUpdates` request open when nothing arrives.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// # Errors
    ///
    /// Returns a `TelegramError` carrying Telegram's description when `ok` is
    /// false or the result is missing.
    pub fn into_result(self, method: &str) -> Result<T, PostError> {
        if !self.ok {
            return Err(PostError::TelegramError(format!(
                "{} failed ({}): {}",
                method,
                self.error_code.unwrap_or_default(),
                self.description.as_deref().unwrap_or("no description")
            )));
        }
        self.result
            .ok_or_else(|| PostError::TelegramError(format!("{} returned no result", method)))
    }
}

/// One entry of a `getUpdates` response. Only the id is interpreted; the
/// payload is kept raw for logging.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

impl Update {
    /// Name of the update's payload field, e.g. `message` or `channel_post`.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.payload.keys().next().map_or("unknown", String::as_str)
    }
}

#[must_use]
pub fn build_send_message_payload(chat_id: &str, text: &str, parse_mode: ParseMode) -> Value {
    json!({
        "chat_id": chat_id,
        "text": text,
        "parse_mode": parse_mode.as_str(),
    })
}

/// Telegram Bot API client
pub struct TelegramClient {
    http: Client,
    token: String,
}

impl TelegramClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT_SECS + 30))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build Telegram HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self { http, token }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        method: &str,
    ) -> Result<T, PostError> {
        // Telegram answers errors with a JSON envelope too, so the body is
        // parsed regardless of status.
        let status = response.status();
        let body = response.text().await?;
        let parsed: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            PostError::TelegramError(format!(
                "{} returned unreadable response (status {}): {}",
                method, status, e
            ))
        })?;
        parsed.into_result(method)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP call fails or Telegram rejects the message.
    pub async fn post_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<(), PostError> {
        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&build_send_message_payload(chat_id, text, parse_mode))
            .send()
            .await?;
        let _: Value = Self::decode(response, "sendMessage").await?;
        info!("Posted text message to chat {}", chat_id);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the upload fails or Telegram rejects the photo.
    pub async fn post_photo(
        &self,
        chat_id: &str,
        photo: Vec<u8>,
        file_name: &str,
        caption: &str,
        parse_mode: ParseMode,
    ) -> Result<(), PostError> {
        let mime = mime_guess::from_path(file_name).first_or_octet_stream();
        let size = photo.len();
        let part = Part::bytes(photo)
            .file_name(file_name.to_string())
            .mime_str(mime.essence_str())?;

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .text("parse_mode", parse_mode.as_str())
            .part("photo", part);

        let response = self
            .http
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await?;
        let _: Value = Self::decode(response, "sendPhoto").await?;
        info!("Posted photo ({} bytes) to chat {}", size, chat_id);
        Ok(())
    }

    /// Long-polls for updates newer than `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP call fails or Telegram answers `ok: false`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, PostError> {
        let mut query: Vec<(&str, String)> =
            vec![("timeout", LONG_POLL_TIMEOUT_SECS.to_string())];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let response = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&query)
            .send()
            .await?;
        let updates: Vec<Update> = Self::decode(response, "getUpdates").await?;
        debug!("getUpdates returned {} updates", updates.len());
        Ok(updates)
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: ParseMode,
    ) -> Result<(), PostError> {
        self.post_message(chat_id, text, parse_mode).await
    }

    async fn send_photo(
        &self,
        chat_id: &str,
        photo: Vec<u8>,
        file_name: &str,
        caption: &str,
        parse_mode: ParseMode,
    ) -> Result<(), PostError> {
        self.post_photo(chat_id, photo, file_name, caption, parse_mode)
            .await
    }
}
