//! 用户上传的题目截图

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::error::{AppError, AppResult};

/// 题目截图（原始字节 + MIME 类型）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// 从文件读取截图，MIME 类型由扩展名推断
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::Validation(format!("读取图片失败 ({}): {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_type_for(path);
        Ok(Self::new(bytes, mime_type, file_name))
    }

    /// base64 编码后的图片数据（不带 data URL 前缀）
    pub fn base64_data(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// 供预览使用的 data URL
    pub fn preview_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_data())
    }
}

/// 根据扩展名推断图片 MIME 类型，未知时按 PNG 处理
fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "image/png",
    }
}
