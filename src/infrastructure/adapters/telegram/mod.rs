//! Telegram adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::command_menu;
use crate::domain::traits::{Bot, BotInfo};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

fn api_url(token: &str, method: &str) -> String {
    format!("{}/bot{}/{}", API_BASE, token, method)
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "scrapetech".to_string(),
                username: "scrapetech_bot".to_string(),
            },
        }
    }

    fn url(&self, method: &str) -> String {
        api_url(&self.token, method)
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct Response {
            result: BotInfoResponse,
        }

        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let response = self
            .client
            .get(self.url("getMe"))
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        self.info = BotInfo {
            id: data.result.id.to_string(),
            name: data.result.first_name,
            username: data.result.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        #[derive(Deserialize)]
        struct Response {
            result: Vec<Update>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        let response = self
            .client
            .post(self.url("getUpdates"))
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Telegram API error: {}", response.status())));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result)
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> i64 {
        updates.iter().map(|u| u.update_id + 1).max().unwrap_or(0)
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest {
            chat_id: String,
            text: String,
        }

        #[derive(Deserialize)]
        struct Response {
            result: MessageResult,
        }

        #[derive(Deserialize)]
        struct MessageResult {
            message_id: i64,
        }

        tracing::debug!("Sending to {}: {}", chat_id, text);

        let request = SendMessageRequest {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        };

        let response = self
            .client
            .post(self.url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Telegram API error: {}", response.status())));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.result.message_id.to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// The setMyCommands form body: a single `commands` field holding the
/// menu as a literal JSON array.
pub fn set_my_commands_form() -> Result<Vec<(&'static str, String)>, BotError> {
    let payload = serde_json::to_string(&command_menu()).map_err(|e| BotError::Parse(e.to_string()))?;
    Ok(vec![("commands", payload)])
}

/// One-shot command registration. A single synchronous POST; the raw
/// response body comes back untouched whatever the HTTP status, and
/// only transport failures are errors.
pub fn register_commands_blocking(token: &str) -> Result<String, BotError> {
    let form = set_my_commands_form()?;
    let client = reqwest::blocking::Client::new();
    let response = client
        .post(api_url(token, "setMyCommands"))
        .form(&form)
        .send()
        .map_err(|e| BotError::Network(e.to_string()))?;
    response.text().map_err(|e| BotError::Network(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_offset_is_one_past_the_newest_update() {
        let updates = vec![
            Update { update_id: 5, message: None },
            Update { update_id: 9, message: None },
            Update { update_id: 7, message: None },
        ];
        assert_eq!(TelegramAdapter::get_next_offset(&updates), 10);
        assert_eq!(TelegramAdapter::get_next_offset(&[]), 0);
    }

    #[test]
    fn commands_form_carries_the_menu_verbatim() {
        let form = set_my_commands_form().unwrap();
        assert_eq!(form.len(), 1);
        assert_eq!(form[0].0, "commands");

        let value: serde_json::Value = serde_json::from_str(&form[0].1).unwrap();
        let commands = value.as_array().unwrap();
        assert_eq!(commands.len(), 6);
        for (entry, expected) in commands.iter().zip(command_menu()) {
            assert_eq!(entry["command"], expected.command);
            assert_eq!(entry["description"], expected.description);
        }
    }

    #[test]
    fn update_parses_a_minimal_message() {
        let raw = r#"{
            "update_id": 1,
            "message": {
                "message_id": 2,
                "from": {"id": 7, "username": "alice", "first_name": "Alice"},
                "chat": {"id": 7},
                "text": "/positions"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let msg = update.message.unwrap();
        assert_eq!(msg.chat.id, 7);
        assert_eq!(msg.text.as_deref(), Some("/positions"));
        assert_eq!(msg.from.unwrap().username.as_deref(), Some("alice"));
    }
}
