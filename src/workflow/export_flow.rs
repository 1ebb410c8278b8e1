//! PDF 导出流程 - 流程层
//!
//! 流程顺序（严格串行，同一时间只有一个导出任务）：
//! 1. 渲染结果页
//! 2. 截取题目区 → 第 1 页
//! 3. 截取答案区 → 第 2 页
//! 4. 保存 `math-problems.pdf`
//!
//! 每个阶段都会通过 watch 通道发布进度，供界面订阅

use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::ProblemSet;
use crate::services::pdf_service::{PageLayout, PdfBuilder, Placement};
use crate::services::render_service::{render_results_html, Raster, Rasterizer, Region};

/// 导出文件名
pub const PDF_FILE_NAME: &str = "math-problems.pdf";
const PDF_TITLE: &str = "Math Problems";

/// 导出阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    /// 没有进行中的导出
    Idle,
    Init,
    CreateDocument,
    RenderProblems,
    ComposePage1,
    RenderAnswers,
    ComposePage2,
    Finalize,
    Done,
    Failed,
}

impl ExportPhase {
    /// 该阶段对应的进度百分比
    pub fn progress(self) -> u8 {
        match self {
            ExportPhase::Idle | ExportPhase::Init | ExportPhase::Failed => 0,
            ExportPhase::CreateDocument => 10,
            ExportPhase::RenderProblems => 25,
            ExportPhase::ComposePage1 => 50,
            ExportPhase::RenderAnswers => 65,
            ExportPhase::ComposePage2 => 80,
            ExportPhase::Finalize | ExportPhase::Done => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportPhase::Idle => "",
            ExportPhase::Init => "正在初始化...",
            ExportPhase::CreateDocument => "正在创建 PDF 文档...",
            ExportPhase::RenderProblems => "正在处理题目...",
            ExportPhase::ComposePage1 => "正在将题目写入 PDF...",
            ExportPhase::RenderAnswers => "正在处理答案...",
            ExportPhase::ComposePage2 => "正在将答案写入 PDF...",
            ExportPhase::Finalize => "正在完成 PDF...",
            ExportPhase::Done => "PDF 已生成",
            ExportPhase::Failed => "PDF 生成失败",
        }
    }
}

/// 导出任务的可观察状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportStatus {
    pub phase: ExportPhase,
    pub progress: u8,
    pub label: String,
}

impl ExportStatus {
    pub fn idle() -> Self {
        Self::at(ExportPhase::Idle)
    }

    pub fn at(phase: ExportPhase) -> Self {
        Self {
            phase,
            progress: phase.progress(),
            label: phase.label().to_string(),
        }
    }

    /// 失败状态保留失败前的进度
    fn failed(progress: u8, message: &str) -> Self {
        Self {
            phase: ExportPhase::Failed,
            progress,
            label: message.to_string(),
        }
    }
}

/// 一次成功导出的结果
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// 文件保存位置
    pub location: String,
    pub page_count: usize,
    pub problems_page: Placement,
    pub answers_page: Placement,
    /// 非致命警告（内容被压缩等）
    pub warnings: Vec<String>,
}

/// 导出文件的保存能力
pub trait ArtifactSink: Send + Sync {
    /// 保存文件，返回保存位置
    fn save(&self, file_name: &str, bytes: Vec<u8>) -> impl Future<Output = AppResult<String>> + Send;
}

/// 保存到本地目录
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for FileSink {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::export(format!("无法创建目录 {}: {}", self.dir.display(), e)))?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::export(format!("写入文件失败 ({}): {}", path.display(), e)))?;
        debug!("已写入 {} 字节: {}", bytes.len(), path.display());
        Ok(path.display().to_string())
    }
}

/// 导出占用标记，离开作用域时释放（任务被中途丢弃也会释放）
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// PDF 导出流程
pub struct ExportPipeline<R, A> {
    rasterizer: R,
    sink: A,
    layout: PageLayout,
    view_width_px: u32,
    running: AtomicBool,
    status: watch::Sender<ExportStatus>,
}

impl<R: Rasterizer, A: ArtifactSink> ExportPipeline<R, A> {
    pub fn new(rasterizer: R, sink: A, view_width_px: u32) -> Self {
        let (status, _) = watch::channel(ExportStatus::idle());
        Self {
            rasterizer,
            sink,
            layout: PageLayout::A4_PORTRAIT,
            view_width_px,
            running: AtomicBool::new(false),
            status,
        }
    }

    /// 订阅导出进度
    pub fn subscribe(&self) -> watch::Receiver<ExportStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> ExportStatus {
        self.status.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 清除上一次导出的进度显示
    pub fn reset_status(&self) {
        if !self.is_running() {
            self.status.send_replace(ExportStatus::idle());
        }
    }

    /// 导出题目集合
    ///
    /// 集合为空或已有导出在进行时直接返回 `Ok(None)`，不做任何事
    pub async fn run(&self, set: &ProblemSet) -> AppResult<Option<ExportReport>> {
        if set.is_empty() {
            debug!("没有题目，跳过导出");
            return Ok(None);
        }
        if self.running.swap(true, Ordering::AcqRel) {
            warn!("⚠️ 已有导出任务在进行，忽略本次请求");
            return Ok(None);
        }

        info!("📄 开始导出 PDF ({} 道题目)", set.len());
        let guard = RunningGuard(&self.running);
        let result = self.execute(set).await;
        drop(guard);

        match result {
            Ok(report) => {
                self.publish(ExportPhase::Done);
                info!("✅ PDF 已保存: {}", report.location);
                Ok(Some(report))
            }
            Err(e) => {
                let e = e.into_export();
                let progress = self.status.borrow().progress;
                self.status.send_replace(ExportStatus::failed(progress, &e.to_string()));
                error!("❌ {}", e);
                Err(e)
            }
        }
    }

    async fn execute(&self, set: &ProblemSet) -> AppResult<ExportReport> {
        self.publish(ExportPhase::Init);
        let html = render_results_html(set, self.view_width_px);
        self.rasterizer.load(&html).await?;

        self.publish(ExportPhase::CreateDocument);
        tokio::task::yield_now().await;
        let mut pdf = PdfBuilder::new(PDF_TITLE, self.layout);
        let mut warnings = Vec::new();

        // 第 1 页：题目
        self.publish(ExportPhase::RenderProblems);
        let problems = self.rasterizer.snapshot(Region::Problems).await?;
        self.publish(ExportPhase::ComposePage1);
        tokio::task::yield_now().await;
        let problems_page = self.add_page(&mut pdf, &problems, Region::Problems, &mut warnings)?;

        // 第 2 页：答案（强制分页）
        self.publish(ExportPhase::RenderAnswers);
        let answers = self.rasterizer.snapshot(Region::Answers).await?;
        self.publish(ExportPhase::ComposePage2);
        tokio::task::yield_now().await;
        let answers_page = self.add_page(&mut pdf, &answers, Region::Answers, &mut warnings)?;

        self.publish(ExportPhase::Finalize);
        let page_count = pdf.page_count();
        let bytes = pdf.finish();
        let location = self.sink.save(PDF_FILE_NAME, bytes).await?;

        Ok(ExportReport {
            location,
            page_count,
            problems_page,
            answers_page,
            warnings,
        })
    }

    fn add_page(
        &self,
        pdf: &mut PdfBuilder,
        raster: &Raster,
        region: Region,
        warnings: &mut Vec<String>,
    ) -> AppResult<Placement> {
        let placement = pdf.add_image_page(raster)?;
        if placement.clamped {
            let message = format!("{}内容超过一页 PDF 的高度，已被压缩以适应页面", region.name());
            warn!("⚠️ {}", message);
            warnings.push(message);
        }
        Ok(placement)
    }

    fn publish(&self, phase: ExportPhase) {
        let status = ExportStatus::at(phase);
        debug!("导出进度: {} ({}%)", status.label, status.progress);
        self.status.send_replace(status);
    }
}
