/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::ProblemSet;
use crate::workflow::ExportStatus;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug / info 级别。
/// 重复调用是安全的（测试中会多次初始化）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - 数学题变式生成 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🤖 文本模型: {} | 图片模型: {}", config.text_model, config.image_model);
    info!("{}", "=".repeat(60));
}

/// 打印生成的题目集合
pub fn log_problem_set(set: &ProblemSet) {
    info!("\n{}", "─".repeat(60));
    info!("📋 共生成 {} 道题目", set.len());
    for (i, problem) in set.iter().enumerate() {
        let marker = if problem.has_image() { " 🖼" } else { "" };
        info!("  {}. {}{}", i + 1, truncate_text(&problem.statement, 60), marker);
        info!("     答案: {}", truncate_text(&problem.answer, 40));
    }
    info!("{}", "─".repeat(60));
}

/// 打印导出进度
pub fn log_export_status(status: &ExportStatus) {
    info!("📄 {} ({}%)", status.label, status.progress);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
