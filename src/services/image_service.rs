//! 插图生成服务 - 业务能力层
//!
//! 为需要配图的题目各生成一张插图。单张插图失败只会让该题没有插图，
//! 不会影响同一批的其他题目

use std::future::Future;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::clients::gemini_client::{PredictInstance, PredictParameters, PredictRequest};
use crate::clients::GeminiClient;
use crate::config::Config;
use crate::models::{Problem, ProblemDraft, ProblemSet};
use crate::utils::truncate_text;

/// 插图生成能力
///
/// 永不失败：任何错误都降级为"没有插图"（`None`）
pub trait ImageSynthesizer: Send + Sync {
    fn synthesize(&self, prompt: &str) -> impl Future<Output = Option<Vec<u8>>> + Send;
}

/// 基于 Gemini 图片模型的插图服务
pub struct ImageService {
    client: GeminiClient,
    model_name: String,
    aspect_ratio: String,
}

impl ImageService {
    pub fn new(config: &Config) -> Self {
        Self {
            client: GeminiClient::new(config),
            model_name: config.image_model.clone(),
            aspect_ratio: config.image_aspect_ratio.clone(),
        }
    }

    fn build_request(&self, prompt: &str) -> PredictRequest {
        PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters {
                sample_count: 1,
                output_mime_type: "image/png".to_string(),
                aspect_ratio: self.aspect_ratio.clone(),
            },
        }
    }
}

impl ImageSynthesizer for ImageService {
    async fn synthesize(&self, prompt: &str) -> Option<Vec<u8>> {
        debug!("生成插图: {}", truncate_text(prompt, 60));

        let response = match self
            .client
            .predict(&self.model_name, &self.build_request(prompt))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("⚠️ 插图生成失败，跳过该插图: {}", e);
                return None;
            }
        };

        let Some(encoded) = response
            .predictions
            .into_iter()
            .find_map(|p| p.bytes_base64_encoded)
        else {
            warn!("⚠️ 图片模型没有返回图片: {}", truncate_text(prompt, 60));
            return None;
        };

        match BASE64.decode(encoded.as_bytes()) {
            Ok(bytes) if !bytes.is_empty() => Some(bytes),
            Ok(_) => None,
            Err(e) => {
                warn!("⚠️ 插图数据无法解码: {}", e);
                None
            }
        }
    }
}

/// 为一批题目并发生成插图，全部完成后才返回完整的题目集合
///
/// 只有带非空 `image_prompt` 的题目会发起请求；返回顺序与输入一致。
pub async fn illustrate<S: ImageSynthesizer>(synthesizer: &S, drafts: Vec<ProblemDraft>) -> ProblemSet {
    let wanted = drafts.iter().filter(|d| d.illustration_prompt().is_some()).count();
    if wanted > 0 {
        info!("🖼 正在为 {} 道题目生成插图...", wanted);
    }

    let problems = join_all(drafts.into_iter().map(|draft| async move {
        let image = match draft.illustration_prompt() {
            Some(prompt) => synthesizer.synthesize(prompt).await,
            None => None,
        };
        Problem {
            statement: draft.problem,
            answer: draft.answer,
            image,
        }
    }))
    .await;

    if wanted > 0 {
        let done = problems.iter().filter(|p| p.has_image()).count();
        info!("✓ 插图生成完成: {}/{}", done, wanted);
    }

    ProblemSet::new(problems)
}
