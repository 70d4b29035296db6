use crate::domain::model::{JgtmlSignal, JgtmlSpec};
use crate::utils::error::{IntentError, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const REQUIRED_LIST_FIELDS: [&str; 3] = ["instruments", "timeframes", "signals"];

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?\s*```$").expect("valid regex")
});

/// 去掉模型偶爾包上的 markdown code fence
pub fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match FENCE_RE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) if !inner.as_str().trim().is_empty() => inner.as_str().trim(),
        _ => trimmed,
    }
}

/// 把 LLM 回覆轉成 `JgtmlSpec`，必要欄位缺漏時回報驗證錯誤
pub fn parse_spec_response(text: &str) -> Result<JgtmlSpec> {
    let json_str = strip_json_fence(text);

    let value: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| IntentError::SpecParse {
            message: e.to_string(),
        })?;

    validate_required_fields(&value)?;

    serde_json::from_value(value).map_err(|e| IntentError::SpecParse {
        message: e.to_string(),
    })
}

fn validate_required_fields(value: &serde_json::Value) -> Result<()> {
    let strategy_ok = value
        .get("strategy_intent")
        .and_then(|v| v.as_str())
        .is_some_and(|s| !s.is_empty());
    let lists_ok = REQUIRED_LIST_FIELDS
        .iter()
        .all(|field| value.get(field).is_some_and(|v| !v.is_null()));

    if strategy_ok && lists_ok {
        Ok(())
    } else {
        tracing::error!("Parsed JSON is missing required JGTMLSpec fields: {}", value);
        Err(IntentError::SpecValidation {
            message: "Parsed JSON is missing required JGTMLSpec fields.".to_string(),
        })
    }
}

impl JgtmlSpec {
    /// 讀取先前產生的 `.jgtml-spec` JSON 檔
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        parse_spec_response(&content)
    }

    pub fn signals(&self) -> &[JgtmlSignal] {
        &self.signals
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
