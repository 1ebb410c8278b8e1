//! 错误类型
//!
//! 所有对外可见的失败最终都只表现为一条用户可读的消息（`to_string()`），
//! 不暴露结构化错误码。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（缺少 API 密钥等），不可重试
    #[error("配置错误: {0}")]
    Config(String),

    /// 本地输入不合法，或上游返回的数据结构不符合约定
    #[error("{0}")]
    Validation(String),

    /// 网络传输 / 模型调用失败，用户可以手动重新提交
    #[error("生成题目失败: {0}")]
    Upstream(String),

    /// 栅格化 / PDF 合成 / 保存失败
    #[error("PDF 生成失败: {0}")]
    Export(String),
}

impl AppError {
    /// 缺少 API 密钥
    pub fn missing_api_key() -> Self {
        AppError::Config("未设置 GEMINI_API_KEY（或 API_KEY）环境变量".to_string())
    }

    /// 上游返回的结构不合法
    pub fn invalid_payload(detail: impl std::fmt::Display) -> Self {
        AppError::Validation(format!("生成题目失败: 返回格式不正确，需要 'problems' 数组 ({})", detail))
    }

    /// 创建上游调用错误
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::Upstream(message.into())
    }

    /// 创建导出错误
    pub fn export(message: impl Into<String>) -> Self {
        AppError::Export(message.into())
    }

    /// 归入导出错误，保留原始信息但去掉原来的分类前缀
    pub fn into_export(self) -> Self {
        match self {
            AppError::Config(message)
            | AppError::Validation(message)
            | AppError::Upstream(message)
            | AppError::Export(message) => AppError::Export(message),
        }
    }

    /// 是否属于导出阶段的错误
    pub fn is_export(&self) -> bool {
        matches!(self, AppError::Export(_))
    }
}

// ========== 从常见错误类型转换 ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Upstream(format!("JSON解析失败: {}", err))
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Export(err.to_string())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
