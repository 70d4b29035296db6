use crate::core::translator::{summarize_chat_history, SUMMARIZE_TEMPERATURE};
use crate::domain::model::{ChatMessage, ChatPersona, ChatSender};
use crate::domain::ports::{Content, GenerateRequest, LlmClient};
use crate::utils::error::{IntentError, Result};

const DEFINITIVE_ERROR_HINT: &str = " This might be a persistent issue (e.g. API Key or quota).";

/// 與敘事助理的多輪對話，逐段串流回覆
pub struct ChatSession<L: LlmClient> {
    llm: L,
    persona: ChatPersona,
    messages: Vec<ChatMessage>,
    summarize_temperature: f32,
}

impl<L: LlmClient> ChatSession<L> {
    pub fn new(llm: L, persona: ChatPersona, history: Vec<ChatMessage>) -> Self {
        Self {
            llm,
            persona,
            messages: history,
            summarize_temperature: SUMMARIZE_TEMPERATURE,
        }
    }

    pub fn with_summarize_temperature(mut self, temperature: f32) -> Self {
        self.summarize_temperature = temperature;
        self
    }

    pub fn persona(&self) -> &ChatPersona {
        &self.persona
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// 空白對話時加上歡迎訊息，有加回傳 true
    pub fn welcome(&mut self) -> bool {
        if !self.messages.is_empty() {
            return false;
        }
        self.messages.push(ChatMessage::new(
            ChatSender::AI,
            format!(
                "Hello! I'm the {}. How can I help you formulate your trading narrative today?",
                self.persona.name
            ),
        ));
        true
    }

    pub fn model_history(&self) -> Vec<Content> {
        self.messages
            .iter()
            .filter(|msg| msg.is_conversational())
            .map(|msg| match msg.sender {
                ChatSender::User => Content::user(msg.text.clone()),
                _ => Content::model(msg.text.clone()),
            })
            .collect()
    }

    pub async fn send_message(
        &mut self,
        text: &str,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(IntentError::EmptyMessage);
        }

        let mut contents = self.model_history();
        contents.push(Content::user(trimmed));

        self.messages.push(ChatMessage::new(ChatSender::User, text));
        self.messages.push(ChatMessage::new(ChatSender::AI, ""));
        let reply_index = self.messages.len() - 1;

        let request = GenerateRequest {
            system_instruction: Some(self.persona.system_instruction.to_string()),
            contents,
            ..Default::default()
        };

        match self.llm.generate_stream(&request, on_chunk).await {
            Ok(full_text) => {
                self.messages[reply_index].text = full_text.clone();
                Ok(full_text)
            }
            Err(e) => {
                tracing::error!("Chat API error: {}", e);
                let reply = &mut self.messages[reply_index];
                reply.text = format!(
                    "Sorry, I encountered an error: {}{}",
                    e.user_friendly_message(),
                    if e.is_definitive() {
                        DEFINITIVE_ERROR_HINT
                    } else {
                        ""
                    }
                );
                reply.is_error = true;
                Err(e)
            }
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.messages.push(ChatMessage::new(
            ChatSender::AI,
            "Chat cleared. How can I assist you now?",
        ));
    }

    pub fn has_summarizable_content(&self) -> bool {
        self.messages
            .iter()
            .any(|msg| msg.sender != ChatSender::System && !msg.text.trim().is_empty())
    }

    pub async fn summarize(&self) -> Result<String> {
        summarize_chat_history(&self.llm, &self.messages, self.summarize_temperature).await
    }
}
