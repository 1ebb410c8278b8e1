use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- Gemini 配置 ---
    /// API 密钥，缺失时在提交时报配置错误
    pub api_key: Option<String>,
    pub api_base_url: String,
    /// 生成题目所用的文本模型
    pub text_model: String,
    /// 生成插图所用的图片模型
    pub image_model: String,
    pub image_aspect_ratio: String,
    // --- 浏览器配置 ---
    /// 设置后连接已有浏览器的调试端口，否则启动无头浏览器
    pub browser_debug_port: Option<u16>,
    pub chrome_executable: Option<String>,
    /// 结果页渲染宽度（CSS 像素）
    pub view_width_px: u32,
    // --- 导出配置 ---
    /// 导出完成后保持"下载中"状态的时间
    pub download_grace_ms: u64,
    pub output_dir: String,
    // --- 驱动程序输入 ---
    pub source_image: Option<String>,
    pub problem_count: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "imagen-4.0-generate-001".to_string(),
            image_aspect_ratio: "1:1".to_string(),
            browser_debug_port: None,
            chrome_executable: None,
            view_width_px: 768,
            download_grace_ms: 1000,
            output_dir: ".".to_string(),
            source_image: None,
            problem_count: "5".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("API_KEY")).ok().filter(|k| !k.trim().is_empty()),
            api_base_url: std::env::var("GEMINI_API_BASE_URL").unwrap_or(default.api_base_url),
            text_model: std::env::var("TEXT_MODEL").unwrap_or(default.text_model),
            image_model: std::env::var("IMAGE_MODEL").unwrap_or(default.image_model),
            image_aspect_ratio: std::env::var("IMAGE_ASPECT_RATIO").unwrap_or(default.image_aspect_ratio),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok(),
            view_width_px: std::env::var("VIEW_WIDTH_PX").ok().and_then(|v| v.parse().ok()).unwrap_or(default.view_width_px),
            download_grace_ms: std::env::var("DOWNLOAD_GRACE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.download_grace_ms),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(default.output_dir),
            source_image: std::env::var("SOURCE_IMAGE").ok(),
            problem_count: std::env::var("PROBLEM_COUNT").unwrap_or(default.problem_count),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    pub fn download_grace(&self) -> Duration {
        Duration::from_millis(self.download_grace_ms)
    }
}
