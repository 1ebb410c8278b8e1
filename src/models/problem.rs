//! 题目数据模型

use crate::error::{AppError, AppResult};
use crate::models::SourceImage;

/// 单次请求允许的最少题目数
pub const MIN_PROBLEMS: u8 = 1;
/// 单次请求允许的最多题目数
pub const MAX_PROBLEMS: u8 = 20;

/// 上游返回的一道题（尚未生成插图）
///
/// `image_prompt` 只用于决定是否需要生成插图，不会进入 [`Problem`]。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemDraft {
    pub problem: String,
    pub answer: String,
    pub image_prompt: Option<String>,
}

impl ProblemDraft {
    /// 去掉首尾空白后仍非空的插图提示词
    pub fn illustration_prompt(&self) -> Option<&str> {
        self.image_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

/// 生成的一道题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub statement: String,
    pub answer: String,
    /// PNG 插图，只有需要配图且生成成功时才存在
    pub image: Option<Vec<u8>>,
}

impl Problem {
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// 一次请求生成的题目集合，创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProblemSet {
    problems: Vec<Problem>,
}

impl ProblemSet {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Problem> {
        self.problems.iter()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

/// 解析用户输入的题目数量，必须是 [1, 20] 内的整数
pub fn parse_problem_count(text: &str) -> Option<u8> {
    text.trim()
        .parse::<u8>()
        .ok()
        .filter(|n| (MIN_PROBLEMS..=MAX_PROBLEMS).contains(n))
}

/// 已通过校验的生成请求
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub source_image: SourceImage,
    pub count: u8,
}

impl GenerationRequest {
    /// 校验输入并构建请求；校验失败时不会发出任何网络请求
    pub fn new(source_image: Option<&SourceImage>, count_text: &str) -> AppResult<Self> {
        match (source_image, parse_problem_count(count_text)) {
            (Some(image), Some(count)) => Ok(Self {
                source_image: image.clone(),
                count,
            }),
            _ => Err(AppError::Validation(format!(
                "请上传题目截图，并将题目数量设置为 {} 到 {} 之间的整数。",
                MIN_PROBLEMS, MAX_PROBLEMS
            ))),
        }
    }
}
