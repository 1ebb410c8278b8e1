//! 无头驱动程序
//!
//! 用环境变量代替表单输入：读取截图 → 生成题目 → 导出 PDF

use anyhow::{bail, Context, Result};
use chromiumoxide::Browser;
use tracing::{info, warn};

use crate::browser;
use crate::config::Config;
use crate::infrastructure::{JsExecutor, PageRasterizer};
use crate::models::SourceImage;
use crate::orchestrator::session::Session;
use crate::services::{ImageService, ProblemService};
use crate::utils::logging::{log_export_status, log_problem_set, log_startup};
use crate::workflow::{ExportPipeline, ExportReport, FileSink};

/// 基于真实浏览器和 Gemini API 的会话
pub type BrowserSession = Session<ProblemService, ImageService, PageRasterizer, FileSink>;

/// 应用主结构
pub struct App {
    config: Config,
    _browser: Browser,
    session: BrowserSession,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let (browser, page) = browser::open_browser(&config).await?;
        let rasterizer = PageRasterizer::new(JsExecutor::new(page), config.view_width_px);
        let exporter = ExportPipeline::new(
            rasterizer,
            FileSink::new(&config.output_dir),
            config.view_width_px,
        );

        let session = Session::new(ProblemService::new(&config), ImageService::new(&config), exporter)
            .with_download_grace(config.download_grace());

        Ok(Self {
            config,
            _browser: browser,
            session,
        })
    }

    /// 运行一次完整流程
    pub async fn run(&mut self) -> Result<ExportReport> {
        let path = self
            .config
            .source_image
            .clone()
            .context("请通过 SOURCE_IMAGE 环境变量指定题目截图")?;
        let image = SourceImage::from_path(&path)
            .await
            .with_context(|| format!("无法读取题目截图: {}", path))?;

        self.session.select_image(image);
        self.session.set_count_text(self.config.problem_count.clone());

        if !self.session.submit().await {
            bail!(self.session.error().unwrap_or("生成题目失败").to_string());
        }
        let Some(set) = self.session.current() else {
            bail!("模型没有返回任何题目");
        };
        log_problem_set(set);

        // 后台打印导出进度
        let mut progress = self.session.export_progress();
        let printer = tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                log_export_status(&progress.borrow_and_update());
            }
        });

        let report = self.session.download().await;
        printer.abort();

        match report {
            Some(report) => {
                for warning in &report.warnings {
                    warn!("⚠️ {}", warning);
                }
                info!("✅ 已导出 {} 页 PDF: {}", report.page_count, report.location);
                Ok(report)
            }
            None => bail!(self.session.error().unwrap_or("PDF 导出未执行").to_string()),
        }
    }
}
