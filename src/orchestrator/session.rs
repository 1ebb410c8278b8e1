//! 应用状态机 - 编排层
//!
//! 顶层状态 `Form / Loading / Results`，外加两个正交标志：
//! `downloading`（正在导出）和 `error`（最近一次失败的提示信息）。
//!
//! ```text
//! Form / Results ──submit(合法)──▶ Loading ──成功──▶ Results（写入历史）
//!                          └────失败──▶ Form + error
//! Results ──back──▶ Form（保留历史）
//! Form / Results ──history_back / history_forward──▶ Results（不发网络请求，最早一组再后退回到 Form）
//! Results ──download──▶ Results（downloading 直到导出结束）
//! ```

use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::AppResult;
use crate::models::{GenerationRequest, ProblemSet, SourceImage};
use crate::services::{illustrate, ImageSynthesizer, ProblemGenerator, Rasterizer};
use crate::workflow::{
    ArtifactSink, ExportPipeline, ExportReport, ExportStatus, History, HistoryStep,
};

/// 顶层界面状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Form,
    Loading,
    Results,
}

/// 一次会话的全部状态（只存在于内存中）
pub struct Session<G, I, R, A> {
    generator: G,
    synthesizer: I,
    exporter: ExportPipeline<R, A>,
    history: History,
    source_image: Option<SourceImage>,
    count_text: String,
    view: View,
    downloading: bool,
    error: Option<String>,
    download_grace: Duration,
}

impl<G, I, R, A> Session<G, I, R, A>
where
    G: ProblemGenerator,
    I: ImageSynthesizer,
    R: Rasterizer,
    A: ArtifactSink,
{
    pub fn new(generator: G, synthesizer: I, exporter: ExportPipeline<R, A>) -> Self {
        Self {
            generator,
            synthesizer,
            exporter,
            history: History::new(),
            source_image: None,
            count_text: "5".to_string(),
            view: View::Form,
            downloading: false,
            error: None,
            download_grace: Duration::from_millis(1000),
        }
    }

    /// 导出完成后继续显示"下载中"的时间
    pub fn with_download_grace(mut self, grace: Duration) -> Self {
        self.download_grace = grace;
        self
    }

    // ========== 状态查询 ==========

    pub fn view(&self) -> View {
        self.view
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.view == View::Loading
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// 当前显示的题目集合（只在结果页存在）
    pub fn current(&self) -> Option<&ProblemSet> {
        match self.view {
            View::Results => self.history.current(),
            _ => None,
        }
    }

    pub fn source_image(&self) -> Option<&SourceImage> {
        self.source_image.as_ref()
    }

    pub fn count_text(&self) -> &str {
        &self.count_text
    }

    /// 提交按钮是否可用
    pub fn can_submit(&self) -> bool {
        self.view != View::Loading
            && GenerationRequest::new(self.source_image.as_ref(), &self.count_text).is_ok()
    }

    pub fn can_download(&self) -> bool {
        !self.downloading && self.current().is_some_and(|set| !set.is_empty())
    }

    /// 订阅导出进度
    pub fn export_progress(&self) -> watch::Receiver<ExportStatus> {
        self.exporter.subscribe()
    }

    // ========== 表单输入 ==========

    pub fn select_image(&mut self, image: SourceImage) {
        info!("🖼 已选择图片: {} ({} 字节)", image.file_name, image.bytes.len());
        self.source_image = Some(image);
    }

    pub fn remove_image(&mut self) {
        self.source_image = None;
    }

    /// 题目数量按用户输入的原样保存，提交时才校验
    pub fn set_count_text(&mut self, text: impl Into<String>) {
        self.count_text = text.into();
    }

    // ========== 状态转换 ==========

    /// 提交生成请求，成功写入历史时返回 `true`
    ///
    /// 结果页上也可以再次提交（沿用已选图片和数量），新集合接在当前游标之后
    pub async fn submit(&mut self) -> bool {
        if self.view == View::Loading {
            warn!("⚠️ 已有生成请求在进行，忽略本次提交");
            return false;
        }

        let request = match GenerationRequest::new(self.source_image.as_ref(), &self.count_text) {
            Ok(request) => request,
            Err(e) => {
                warn!("⚠️ 输入校验失败: {}", e);
                self.error = Some(e.to_string());
                return false;
            }
        };

        self.view = View::Loading;
        self.error = None;

        match self.generate(&request).await {
            Ok(set) => {
                let is_empty = set.is_empty();
                let index = self.history.commit(set);
                info!("✓ 已写入历史记录 #{} (共 {} 条)", index + 1, self.history.len());
                self.view = if is_empty { View::Form } else { View::Results };
                true
            }
            Err(e) => {
                error!("❌ {}", e);
                self.error = Some(e.to_string());
                self.view = View::Form;
                false
            }
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<ProblemSet> {
        let drafts = self
            .generator
            .generate(&request.source_image, request.count)
            .await?;
        Ok(illustrate(&self.synthesizer, drafts).await)
    }

    /// 返回表单（"重新开始"），保留历史记录
    pub fn back(&mut self) {
        self.history.clear_selection();
        self.leave_results();
    }

    /// 历史导航在表单页和结果页都可用，生成过程中不可用
    pub fn can_navigate_history(&self) -> bool {
        self.view != View::Loading && !self.history.is_empty()
    }

    /// 查看上一组题目；已经是最早一组时返回表单
    pub fn history_back(&mut self) {
        if !self.can_navigate_history() || !self.history.can_go_back() {
            return;
        }
        match self.history.back() {
            HistoryStep::Moved(index) => {
                info!("⬅ 切换到历史记录 #{}", index + 1);
                self.show_selected();
            }
            HistoryStep::Cleared => self.leave_results(),
            HistoryStep::Unchanged => {}
        }
    }

    /// 查看下一组题目（表单页上从第一组开始）
    pub fn history_forward(&mut self) {
        if !self.can_navigate_history() || !self.history.can_go_forward() {
            return;
        }
        if let HistoryStep::Moved(index) = self.history.forward() {
            info!("➡ 切换到历史记录 #{}", index + 1);
            self.show_selected();
        }
    }

    /// 游标落在非空集合上时显示结果页，空集合停留在表单
    fn show_selected(&mut self) {
        self.view = match self.history.current() {
            Some(set) if !set.is_empty() => View::Results,
            _ => View::Form,
        };
    }

    fn leave_results(&mut self) {
        self.view = View::Form;
        self.error = None;
        self.downloading = false;
        self.exporter.reset_status();
    }

    /// 把当前题目集合导出为 PDF
    ///
    /// 不在结果页、没有题目或正在导出时什么也不做
    pub async fn download(&mut self) -> Option<ExportReport> {
        if self.downloading {
            warn!("⚠️ 正在导出，忽略重复请求");
            return None;
        }
        let set = match self.view {
            View::Results => self.history.current().filter(|set| !set.is_empty())?,
            _ => return None,
        };

        self.downloading = true;
        self.error = None;

        match self.exporter.run(set).await {
            Ok(Some(report)) => {
                tokio::time::sleep(self.download_grace).await;
                self.downloading = false;
                Some(report)
            }
            Ok(None) => {
                self.downloading = false;
                None
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.downloading = false;
                None
            }
        }
    }
}
