/// Gemini REST API 客户端
///
/// 封装 `generateContent`（文本 + 结构化输出）和 `predict`（图片生成）两个接口，
/// 只负责传输和报文结构，不关心题目业务
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

// ========== generateContent 报文 ==========

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// 请求中的一个片段：文本或内联图片
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    /// base64 编码的数据
    pub data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: JsonValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// 第一个候选结果中所有文本片段拼接后的内容
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn block_reason(&self) -> Option<&str> {
        self.prompt_feedback.as_ref()?.block_reason.as_deref()
    }
}

// ========== predict（图片生成）报文 ==========

#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub instances: Vec<PredictInstance>,
    pub parameters: PredictParameters,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictInstance {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters {
    pub sample_count: u32,
    pub output_mime_type: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictResponse {
    /// 被安全策略过滤时为空
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// API 错误响应 `{ "error": { "message": ..., "status": ... } }`
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Gemini 客户端
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// 创建新的 Gemini 客户端（不设置超时）
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// 调用 `models/{model}:generateContent`
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> AppResult<GenerateContentResponse> {
        self.post(&format!("{}:generateContent", model), request).await
    }

    /// 调用 `models/{model}:predict`
    pub async fn predict(&self, model: &str, request: &PredictRequest) -> AppResult<PredictResponse> {
        self.post(&format!("{}:predict", model), request).await
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, endpoint: &str, body: &B) -> AppResult<R> {
        let api_key = self.api_key.as_deref().ok_or_else(AppError::missing_api_key)?;
        let url = format!("{}/models/{}", self.api_base_url, endpoint);
        debug!("调用 Gemini API: {}", url);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini API 请求失败 ({}): {}", endpoint, e);
                AppError::from(e)
            })?;

        let status = response.status();
        let text = response.text().await?;
        debug!("Gemini API 响应: HTTP {} ({} 字节)", status, text.len());

        if !status.is_success() {
            let message = error_message(status, &text);
            warn!("Gemini API 返回错误 ({}): {}", endpoint, message);
            return Err(AppError::upstream(message));
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// 从错误响应体中提取可读的错误信息
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(code) => format!("{} ({})", envelope.error.message, code),
            None => envelope.error.message,
        },
        Err(_) => format!("HTTP {}", status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_uses_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::inline_data("image/png", "AAAA"), Part::text("hi")],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".into(),
                response_schema: json!({"type": "OBJECT"}),
            }),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                    {"text": "hi"}
                ]}],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "OBJECT"}
                }
            })
        );
    }

    #[test]
    fn test_predict_request_shape() {
        let request = PredictRequest {
            instances: vec![PredictInstance { prompt: "a cube".into() }],
            parameters: PredictParameters {
                sample_count: 1,
                output_mime_type: "image/png".into(),
                aspect_ratio: "1:1".into(),
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["parameters"]["sampleCount"], 1);
        assert_eq!(value["parameters"]["outputMimeType"], "image/png");
        assert_eq!(value["parameters"]["aspectRatio"], "1:1");
        assert_eq!(value["instances"][0]["prompt"], "a cube");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"pro"}, {"text": "blems\": []}"}]}}]
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"problems\": []}"));
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(response.text(), None);
        assert_eq!(response.block_reason(), Some("SAFETY"));
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            error_message(StatusCode::TOO_MANY_REQUESTS, body),
            "Quota exceeded (RESOURCE_EXHAUSTED)"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "<html>"), "HTTP 502 Bad Gateway");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_request() {
        let client = GeminiClient::new(&Config::default());
        let result = client.predict("m", &PredictRequest {
            instances: vec![],
            parameters: PredictParameters {
                sample_count: 1,
                output_mime_type: "image/png".into(),
                aspect_ratio: "1:1".into(),
            },
        }).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
