use crate::domain::model::{ChatMessage, ChatSettings};
use crate::domain::ports::Storage;
use crate::utils::error::Result;

pub const CHAT_MESSAGES_KEY: &str = "jgtmlTraderChatMessages";
pub const CHAT_SETTINGS_KEY: &str = "jgtmlTraderChatSettings";

fn file_for(key: &str) -> String {
    format!("{}.json", key)
}

/// 以兩個固定 key 保存聊天紀錄與設定
pub struct ChatStore<S: Storage> {
    storage: S,
}

impl<S: Storage> ChatStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn save_messages(&self, messages: &[ChatMessage]) -> Result<()> {
        let json = serde_json::to_vec(messages)?;
        self.storage
            .write_file(&file_for(CHAT_MESSAGES_KEY), &json)
            .await?;
        tracing::debug!("Saved {} chat messages", messages.len());
        Ok(())
    }

    /// 讀取失敗時回傳空紀錄
    pub async fn load_messages(&self) -> Vec<ChatMessage> {
        let file = file_for(CHAT_MESSAGES_KEY);
        if !self.storage.exists(&file).await {
            return Vec::new();
        }

        let loaded: Result<Vec<ChatMessage>> = match self.storage.read_file(&file).await {
            Ok(bytes) => serde_json::from_slice::<Vec<ChatMessage>>(&bytes).map_err(Into::into),
            Err(e) => Err(e),
        };

        match loaded {
            Ok(messages) => messages,
            Err(e) => {
                tracing::warn!("Error loading chat messages from {}: {}", file, e);
                Vec::new()
            }
        }
    }

    pub async fn save_settings(&self, settings: &ChatSettings) -> Result<()> {
        let json = serde_json::to_vec(settings)?;
        self.storage
            .write_file(&file_for(CHAT_SETTINGS_KEY), &json)
            .await
    }

    /// `autoPlayTTS` 不是布林值時一律視為 false
    pub async fn load_settings(&self) -> ChatSettings {
        let file = file_for(CHAT_SETTINGS_KEY);
        if !self.storage.exists(&file).await {
            return ChatSettings::default();
        }

        let bytes = match self.storage.read_file(&file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Error loading chat settings from {}: {}", file, e);
                return ChatSettings::default();
            }
        };

        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) => ChatSettings {
                auto_play_tts: value
                    .get("autoPlayTTS")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            },
            Err(e) => {
                tracing::warn!("Error loading chat settings from {}: {}", file, e);
                ChatSettings::default()
            }
        }
    }
}
