use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 單一元件：類別 -> 元件或狀態，例如 `{"fractal_analysis": "jgtpy.fractal_detection"}`
pub type JgtmlSignalComponent = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JgtmlSignal {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub jgtml_components: Vec<JgtmlSignalComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alligator_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JgtmlSpec {
    pub strategy_intent: String,
    pub instruments: Vec<String>,
    pub timeframes: Vec<String>,
    pub signals: Vec<JgtmlSignal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPackagePreview {
    pub strategy: String,
    pub instruments: Vec<String>,
    pub timeframes: Vec<String>,
    pub signal_count: usize,
    pub first_signal_name: String,
    pub unique_components: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSpecOutput {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_package_preview: Option<SignalPackagePreview>,
}

/// 一次 narrative -> spec 流程的產物
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecBundle {
    pub narrative: String,
    pub spec: JgtmlSpec,
    pub parsed: ParsedSpecOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatSender {
    User,
    AI,
    System,
}

impl fmt::Display for ChatSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatSender::User => write!(f, "User"),
            ChatSender::AI => write!(f, "AI"),
            ChatSender::System => write!(f, "System"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: ChatSender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ChatMessage {
    pub fn new(sender: ChatSender, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            is_error: false,
        }
    }

    /// 會送進模型歷史與摘要的訊息：使用者訊息，以及非錯誤的 AI 回覆
    pub fn is_conversational(&self) -> bool {
        match self.sender {
            ChatSender::User => true,
            ChatSender::AI => !self.is_error,
            ChatSender::System => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    #[serde(rename = "autoPlayTTS")]
    pub auto_play_tts: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPersona {
    pub id: &'static str,
    pub name: &'static str,
    pub system_instruction: &'static str,
}

pub type RawDataRow = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MfiTrend {
    Bullish,
    Bearish,
    Neutral,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl MfiTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            MfiTrend::Bullish => "Bullish",
            MfiTrend::Bearish => "Bearish",
            MfiTrend::Neutral => "Neutral",
            MfiTrend::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for MfiTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeframeConfig {
    pub label: &'static str,
    pub mfi_key: &'static str,
    pub zcol_key: &'static str,
}

pub const TIMEFRAMES_CONFIG: [TimeframeConfig; 4] = [
    TimeframeConfig {
        label: "M1",
        mfi_key: "mfi_str_M1",
        zcol_key: "zcol_M1",
    },
    TimeframeConfig {
        label: "W1",
        mfi_key: "mfi_str_W1",
        zcol_key: "zcol_W1",
    },
    TimeframeConfig {
        label: "D1",
        mfi_key: "mfi_str_D1",
        zcol_key: "zcol_D1",
    },
    // H4 是 CSV 本身的時間框架，欄位不帶後綴
    TimeframeConfig {
        label: "H4",
        mfi_key: "mfi_str",
        zcol_key: "zcol",
    },
];

pub const DEFAULT_INSTRUMENT_NAME: &str = "SPX500";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeDisplay {
    pub label: String,
    pub trend: MfiTrend,
    pub mfi: String,
    pub zcol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceColumns {
    pub mfi: Vec<String>,
    pub zone: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStructure {
    pub instrument: String,
    pub last_close_price: String,
    pub timeframes: Vec<TimeframeDisplay>,
    pub source_columns: SourceColumns,
}
