use crate::domain::ports::{ConfigProvider, Content, GenerateRequest, LlmClient, Part};
use crate::utils::error::{IntentError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct GeminiRequest<'a> {
    contents: &'a [Content],
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    error: Option<GeminiApiError>,
}

/// 串流中途以 200 送出的錯誤事件
#[derive(Deserialize)]
struct GeminiApiError {
    code: Option<u16>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

impl GeminiResponse {
    fn api_failure(&self, raw: &str) -> Option<IntentError> {
        let error = self.error.as_ref()?;
        let status = error
            .code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Some(classify_api_failure(status, raw))
    }

    /// 第一個 candidate 所有文字片段的串接；沒有 candidate 時為 None
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        Some(
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>(),
        )
    }
}

impl<'a> GeminiRequest<'a> {
    fn from_request(request: &'a GenerateRequest) -> Self {
        let generation_config =
            if request.temperature.is_some() || request.response_mime_type.is_some() {
                Some(GenerationConfig {
                    temperature: request.temperature,
                    response_mime_type: request.response_mime_type.clone(),
                })
            } else {
                None
            };

        Self {
            contents: &request.contents,
            system_instruction: request
                .system_instruction
                .as_ref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| GeminiSystemInstruction {
                    parts: vec![Part { text: s.clone() }],
                }),
            generation_config,
        }
    }
}

/// Gemini `generateContent` / `streamGenerateContent` 的 REST 客戶端
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().trim().to_string(),
            api_key: config
                .api_key()
                .filter(|key| !key.trim().is_empty())
                .map(str::to_string),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(IntentError::MissingApiKey)
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    async fn post(
        &self,
        url: &str,
        request: &GenerateRequest,
        query: &[(&str, &str)],
    ) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;
        if request.contents.is_empty() {
            return Err(IntentError::EmptyMessage);
        }

        let body = GeminiRequest::from_request(request);
        tracing::debug!(
            "POST {} ({} content entries, temperature {:?})",
            url,
            request.contents.len(),
            request.temperature
        );

        let response = self
            .client
            .post(url)
            .query(query)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        tracing::debug!("Gemini response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API error ({}): {}", status, text);
            return Err(classify_api_failure(status, &text));
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let url = self.endpoint("generateContent");
        let response = self.post(&url, request, &[]).await?;

        let raw = response.text().await?;
        let json: GeminiResponse = serde_json::from_str(&raw)?;
        if let Some(err) = json.api_failure(&raw) {
            return Err(err);
        }
        json.text().ok_or_else(|| IntentError::LlmResponse {
            message: "Invalid response format: no candidates returned".to_string(),
        })
    }

    async fn generate_stream(
        &self,
        request: &GenerateRequest,
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<String> {
        let url = self.endpoint("streamGenerateContent");
        let mut response = self.post(&url, request, &[("alt", "sse")]).await?;

        let mut decoder = SseDecoder::default();
        while let Some(bytes) = response.chunk().await? {
            decoder.push(&bytes, on_chunk)?;
        }
        decoder.finish(on_chunk)
    }
}

/// 把 SSE 位元組切成行；跨網路分塊的行與 UTF-8 字元先留在緩衝區
#[derive(Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    full_text: String,
}

impl SseDecoder {
    fn push(
        &mut self,
        bytes: &[u8],
        on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
    ) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            handle_sse_line(&line, &mut self.full_text, on_chunk)?;
        }
        Ok(())
    }

    /// 最後一行可能沒有換行
    fn finish(mut self, on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send)) -> Result<String> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            handle_sse_line(&line, &mut self.full_text, on_chunk)?;
        }
        Ok(self.full_text)
    }
}

fn handle_sse_line(
    line: &[u8],
    full_text: &mut String,
    on_chunk: &mut (dyn for<'c> FnMut(&'c str) + Send),
) -> Result<()> {
    let line = String::from_utf8_lossy(line);
    let Some(payload) = line.trim().strip_prefix("data:") else {
        return Ok(());
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(());
    }

    let event: GeminiResponse = serde_json::from_str(payload)?;
    if let Some(err) = event.api_failure(payload) {
        tracing::error!("Gemini stream error event: {}", payload);
        return Err(err);
    }
    if let Some(text) = event.text().filter(|t| !t.is_empty()) {
        on_chunk(&text);
        full_text.push_str(&text);
    }
    Ok(())
}

/// 依使用者可理解的類別分類 API 失敗
pub(crate) fn classify_api_failure(status: StatusCode, body: &str) -> IntentError {
    let lower = body.to_lowercase();

    if body.contains("API_KEY_INVALID") || body.contains("API key not valid") {
        IntentError::InvalidApiKey
    } else if lower.contains("permission denied")
        || lower.contains("authentication failed")
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        IntentError::AuthenticationFailed
    } else if body.contains("RESOURCE_EXHAUSTED") || status == StatusCode::TOO_MANY_REQUESTS {
        IntentError::QuotaExceeded
    } else {
        IntentError::LlmResponse {
            message: format!("API error ({}): {}", status, body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::time::Duration;

    struct TestConfig {
        base_url: String,
        api_key: Option<String>,
    }

    impl ConfigProvider for TestConfig {
        fn api_key(&self) -> Option<&str> {
            self.api_key.as_deref()
        }
        fn model(&self) -> &str {
            "gemini-test"
        }
        fn base_url(&self) -> &str {
            &self.base_url
        }
        fn timeout(&self) -> Duration {
            Duration::from_secs(5)
        }
        fn translate_temperature(&self) -> f32 {
            0.2
        }
        fn summarize_temperature(&self) -> f32 {
            0.5
        }
        fn simulated_parse_delay(&self) -> Duration {
            Duration::ZERO
        }
    }

    fn client_for(server: &MockServer, api_key: Option<&str>) -> GeminiClient {
        GeminiClient::from_config(&TestConfig {
            base_url: server.base_url(),
            api_key: api_key.map(str::to_string),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_first_candidate_text() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-test:generateContent")
                .header("x-goog-api-key", "test-key")
                .json_body_partial(r#"{"generationConfig":{"temperature":0.5}}"#);
            then.status(200).json_body(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Hello "}, {"text": "trader"}]}
                }]
            }));
        });

        let client = client_for(&server, Some("test-key"));
        let mut request = GenerateRequest::from_prompt("hi");
        request.temperature = Some(0.5);

        let text = client.generate(&request).await.unwrap();

        api_mock.assert();
        assert_eq!(text, "Hello trader");
    }

    #[tokio::test]
    async fn test_missing_api_key_blocks_the_call() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST);
            then.status(200);
        });

        let client = client_for(&server, None);
        let err = client
            .generate(&GenerateRequest::from_prompt("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, IntentError::MissingApiKey));
        api_mock.assert_hits(0);
    }

    #[tokio::test]
    async fn test_quota_and_invalid_key_are_classified() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-test:generateContent");
            then.status(429)
                .body(r#"{"error":{"code":429,"status":"RESOURCE_EXHAUSTED"}}"#);
        });

        let client = client_for(&server, Some("test-key"));
        let err = client
            .generate(&GenerateRequest::from_prompt("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntentError::QuotaExceeded));

        let err = classify_api_failure(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"API key not valid. Please pass a valid API key.","details":[{"reason":"API_KEY_INVALID"}]}}"#,
        );
        assert!(matches!(err, IntentError::InvalidApiKey));

        let err = classify_api_failure(StatusCode::FORBIDDEN, "forbidden");
        assert!(matches!(err, IntentError::AuthenticationFailed));

        let err = classify_api_failure(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(matches!(err, IntentError::LlmResponse { .. }));
    }

    #[tokio::test]
    async fn test_generate_stream_emits_chunks() {
        let server = MockServer::start();
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Okay, \"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"a double top.\"}]}}]}\r\n\r\n",
        );
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-test:streamGenerateContent")
                .query_param("alt", "sse");
            then.status(200)
                .header("Content-Type", "text/event-stream")
                .body(body);
        });

        let client = client_for(&server, Some("test-key"));
        let mut chunks = Vec::new();
        let full = client
            .generate_stream(&GenerateRequest::from_prompt("double top"), &mut |c| {
                chunks.push(c.to_string())
            })
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(chunks, vec!["Okay, ", "a double top."]);
        assert_eq!(full, "Okay, a double top.");
    }

    #[tokio::test]
    async fn test_stream_error_event_is_classified() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-test:streamGenerateContent")
                .query_param("alt", "sse");
            then.status(200)
                .header("Content-Type", "text/event-stream")
                .body("data: {\"error\":{\"code\":429,\"status\":\"RESOURCE_EXHAUSTED\"}}\r\n\r\n");
        });

        let client = client_for(&server, Some("test-key"));
        let mut chunks = Vec::new();
        let err = client
            .generate_stream(&GenerateRequest::from_prompt("hi"), &mut |c: &str| {
                chunks.push(c.to_string())
            })
            .await
            .unwrap_err();

        api_mock.assert();
        assert!(matches!(err, IntentError::QuotaExceeded));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_sse_decoder_handles_split_chunks() {
        let first = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Wave 5 \u{2192} \"}]}}]}\n\n";
        let last = "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"1.0800\"}]}}]}";
        let stream = format!("{}{}", first, last);
        let bytes = stream.as_bytes();

        // 在「→」(3 bytes) 中間切開，最後一行沒有換行
        let arrow = stream.find('\u{2192}').unwrap();
        let cuts = [10, arrow + 1, arrow + 2, first.len() + 7];

        let mut decoder = SseDecoder::default();
        let mut chunks: Vec<String> = Vec::new();
        let mut start = 0;
        for cut in cuts {
            decoder
                .push(&bytes[start..cut], &mut |c: &str| chunks.push(c.to_string()))
                .unwrap();
            start = cut;
        }
        decoder
            .push(&bytes[start..], &mut |c: &str| chunks.push(c.to_string()))
            .unwrap();
        assert_eq!(chunks, vec!["Wave 5 \u{2192} "]);

        let full = decoder
            .finish(&mut |c: &str| chunks.push(c.to_string()))
            .unwrap();
        assert_eq!(chunks, vec!["Wave 5 \u{2192} ", "1.0800"]);
        assert_eq!(full, "Wave 5 \u{2192} 1.0800");
    }

    #[test]
    fn test_sse_line_ignores_comments_and_done() {
        let mut full = String::new();
        let mut calls = 0;
        for line in [": keep-alive\n", "\r\n", "data: [DONE]\n", "event: message\n"] {
            handle_sse_line(line.as_bytes(), &mut full, &mut |_: &str| calls += 1).unwrap();
        }
        assert_eq!(calls, 0);
        assert!(full.is_empty());
    }

    #[test]
    fn test_request_body_shape() {
        let mut request = GenerateRequest::from_prompt("narrative");
        request.system_instruction = Some("be terse".to_string());
        request.response_mime_type = Some("application/json".to_string());

        let body = serde_json::to_value(GeminiRequest::from_request(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "narrative");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert!(body["generationConfig"].get("temperature").is_none());
    }
}
