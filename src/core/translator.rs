use crate::core::prompts::{summarize_prompt, translate_prompt};
use crate::core::spec::parse_spec_response;
use crate::domain::model::{ChatMessage, JgtmlSpec};
use crate::domain::ports::{GenerateRequest, LlmClient};
use crate::utils::error::{IntentError, Result};

pub const TRANSLATE_TEMPERATURE: f32 = 0.2;
pub const SUMMARIZE_TEMPERATURE: f32 = 0.5;
pub const NO_HISTORY_SUMMARY: &str = "No relevant chat history to summarize.";

pub async fn translate_narrative_to_spec<L: LlmClient + ?Sized>(
    llm: &L,
    narrative: &str,
    temperature: f32,
) -> Result<JgtmlSpec> {
    if narrative.trim().is_empty() {
        return Err(IntentError::ProcessingError {
            message: "Trader narrative is empty".to_string(),
        });
    }

    let mut request = GenerateRequest::from_prompt(translate_prompt(narrative));
    request.temperature = Some(temperature);
    request.response_mime_type = Some("application/json".to_string());

    let text = llm.generate(&request).await?;
    tracing::debug!("Raw LLM spec response: {}", text);

    parse_spec_response(&text)
}

/// 使用者訊息與非錯誤的 AI 回覆，一行一則
pub fn format_chat_history(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|msg| msg.is_conversational())
        .map(|msg| format!("{}: {}", msg.sender, msg.text))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn summarize_chat_history<L: LlmClient + ?Sized>(
    llm: &L,
    messages: &[ChatMessage],
    temperature: f32,
) -> Result<String> {
    let history = format_chat_history(messages);
    if history.trim().is_empty() {
        return Ok(NO_HISTORY_SUMMARY.to_string());
    }

    let mut request = GenerateRequest::from_prompt(summarize_prompt(&history));
    request.temperature = Some(temperature);

    let text = llm.generate(&request).await?;
    Ok(text.trim().to_string())
}
