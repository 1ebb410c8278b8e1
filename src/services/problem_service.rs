//! 题目生成服务 - 业务能力层
//!
//! 只负责"看图出题"能力：构建提示词和结构化输出 schema，
//! 调用文本模型，并严格校验返回结构

use std::future::Future;

use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, info, warn};

use crate::clients::gemini_client::{
    Content, GenerateContentRequest, GenerationConfig, Part,
};
use crate::clients::GeminiClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ProblemDraft, SourceImage};

/// 看图出题能力
pub trait ProblemGenerator: Send + Sync {
    /// 根据截图生成 `count` 道同类题目（尚未配图）
    fn generate(
        &self,
        image: &SourceImage,
        count: u8,
    ) -> impl Future<Output = AppResult<Vec<ProblemDraft>>> + Send;
}

/// 上游返回的 JSON 结构 `{ problems: [{ problem, answer, imagePrompt? }] }`
#[derive(Debug, Deserialize)]
struct ProblemsPayload {
    problems: Vec<ProblemItem>,
}

#[derive(Debug, Deserialize)]
struct ProblemItem {
    problem: String,
    answer: String,
    #[serde(rename = "imagePrompt", default)]
    image_prompt: Option<String>,
}

/// 基于 Gemini 的题目生成服务
pub struct ProblemService {
    client: GeminiClient,
    model_name: String,
}

impl ProblemService {
    pub fn new(config: &Config) -> Self {
        Self::with_client(GeminiClient::new(config), config.text_model.clone())
    }

    pub fn with_client(client: GeminiClient, model_name: impl Into<String>) -> Self {
        Self {
            client,
            model_name: model_name.into(),
        }
    }
}

impl ProblemGenerator for ProblemService {
    async fn generate(&self, image: &SourceImage, count: u8) -> AppResult<Vec<ProblemDraft>> {
        if !self.client.has_api_key() {
            return Err(AppError::missing_api_key());
        }

        info!("🤖 请求模型 {} 生成 {} 道题目", self.model_name, count);
        debug!("截图: {} ({}, {} 字节)", image.file_name, image.mime_type, image.bytes.len());

        let request = build_request(image, count);
        let response = self.client.generate_content(&self.model_name, &request).await?;

        let text = match response.text() {
            Some(text) => text,
            None => {
                return Err(match response.block_reason() {
                    Some(reason) => AppError::upstream(format!("请求被模型拦截 ({})", reason)),
                    None => AppError::upstream("模型返回内容为空"),
                })
            }
        };

        let drafts = parse_problems(text.trim())?;
        if drafts.len() != usize::from(count) {
            warn!("⚠️ 请求 {} 道题目，模型返回了 {} 道", count, drafts.len());
        }
        Ok(drafts)
    }
}

/// 构建 generateContent 请求：图片 + 指令 + 严格 schema
fn build_request(image: &SourceImage, count: u8) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![
                Part::inline_data(&image.mime_type, image.base64_data()),
                Part::text(build_instruction(count)),
            ],
        }],
        generation_config: Some(GenerationConfig {
            response_mime_type: "application/json".to_string(),
            response_schema: response_schema(count),
        }),
    }
}

fn build_instruction(count: u8) -> String {
    format!(
        "You are an expert math instructor. Analyze the math problem in the image. \
         Your task is to generate {count} new, similar math problems. These problems should follow \
         the same mathematical concepts but be creative and engaging. Ensure maximum variation in \
         each problem by using different names, themes, numbers, quantities, years, and months. \
         For each problem you generate, provide a clear problem statement and the corresponding \
         final answer. Only when a problem cannot be understood without a diagram (for example a \
         geometry figure or a chart), also provide an imagePrompt describing that diagram precisely; \
         otherwise omit imagePrompt."
    )
}

/// 结构化输出 schema
fn response_schema(count: u8) -> JsonValue {
    json!({
        "type": "OBJECT",
        "properties": {
            "problems": {
                "type": "ARRAY",
                "description": format!("An array of {} math problems.", count),
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "problem": {
                            "type": "STRING",
                            "description": "The full text of the generated math problem."
                        },
                        "answer": {
                            "type": "STRING",
                            "description": "The final answer to the generated math problem."
                        },
                        "imagePrompt": {
                            "type": "STRING",
                            "description": "A description of the diagram this problem needs. Omit when no diagram is needed."
                        }
                    },
                    "required": ["problem", "answer"]
                }
            }
        },
        "required": ["problems"]
    })
}

/// 解析模型返回的 JSON 文本
///
/// - 不是合法 JSON → `Upstream`
/// - JSON 合法但结构不符 → `Validation`
fn parse_problems(text: &str) -> AppResult<Vec<ProblemDraft>> {
    let value: JsonValue = serde_json::from_str(text)?;
    let payload: ProblemsPayload =
        serde_json::from_value(value).map_err(AppError::invalid_payload)?;

    Ok(payload
        .problems
        .into_iter()
        .map(|item| ProblemDraft {
            problem: item.problem,
            answer: item.answer,
            image_prompt: item.image_prompt,
        })
        .collect())
}
