//! 集成测试共用的假实现

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use image::ImageFormat;
use math_problem_generator::error::{AppError, AppResult};
use math_problem_generator::models::{ProblemDraft, SourceImage};
use math_problem_generator::services::{
    ImageSynthesizer, ProblemGenerator, Raster, Rasterizer, Region,
};
use math_problem_generator::workflow::{ArtifactSink, ExportPipeline, ExportStatus};
use math_problem_generator::Session;
use tokio::sync::watch;

/// 生成指定尺寸的纯色 PNG
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn source_image() -> SourceImage {
    SourceImage::new(png(4, 4), "image/png", "question.png")
}

pub fn drafts(tag: &str, count: usize) -> Vec<ProblemDraft> {
    (1..=count)
        .map(|i| ProblemDraft {
            problem: format!("{} problem {}", tag, i),
            answer: format!("{} answer {}", tag, i),
            image_prompt: None,
        })
        .collect()
}

/// 按顺序返回预设结果的出题服务
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    responses: Arc<Mutex<VecDeque<AppResult<Vec<ProblemDraft>>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    pub fn push(&self, response: AppResult<Vec<ProblemDraft>>) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProblemGenerator for ScriptedGenerator {
    async fn generate(&self, _image: &SourceImage, _count: u8) -> AppResult<Vec<ProblemDraft>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::upstream("没有预设的响应")))
    }
}

/// 提示词包含 "fail" 时返回空，其余返回一张小 PNG
#[derive(Clone, Default)]
pub struct FakeSynthesizer {
    calls: Arc<AtomicUsize>,
}

impl FakeSynthesizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageSynthesizer for FakeSynthesizer {
    async fn synthesize(&self, prompt: &str) -> Option<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        if prompt.contains("fail") {
            None
        } else {
            Some(png(8, 8))
        }
    }
}

/// 记录调用顺序和当时的导出进度
#[derive(Default)]
pub struct CallLog {
    status: OnceLock<watch::Receiver<ExportStatus>>,
    events: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn attach(&self, rx: watch::Receiver<ExportStatus>) {
        let _ = self.status.set(rx);
    }

    fn record(&self, event: &str) {
        let suffix = match self.status.get() {
            Some(rx) => {
                let status = rx.borrow();
                format!(" @{:?}/{}", status.phase, status.progress)
            }
            None => String::new(),
        };
        self.events.lock().unwrap().push(format!("{}{}", event, suffix));
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

/// 返回固定尺寸截图的栅格化器
#[derive(Clone)]
pub struct FakeRasterizer {
    pub problems_size: (u32, u32),
    pub answers_size: (u32, u32),
    pub fail_on: Option<Region>,
    /// 失败时模拟页面脚本返回了无法解析的结果，而不是截图失败
    pub fail_with_script_result: bool,
    pub call_log: Arc<CallLog>,
}

impl Default for FakeRasterizer {
    fn default() -> Self {
        Self {
            problems_size: (1536, 1200),
            answers_size: (1536, 600),
            fail_on: None,
            fail_with_script_result: false,
            call_log: Arc::new(CallLog::default()),
        }
    }
}

impl Rasterizer for FakeRasterizer {
    async fn load(&self, html: &str) -> AppResult<()> {
        assert!(html.contains("problems-container"));
        self.call_log.record("load");
        Ok(())
    }

    async fn snapshot(&self, region: Region) -> AppResult<Raster> {
        self.call_log.record(region.selector());
        if self.fail_on == Some(region) {
            if self.fail_with_script_result {
                let err = serde_json::from_str::<f64>("undefined").unwrap_err();
                return Err(AppError::from(err));
            }
            return Err(AppError::export("截图失败"));
        }
        let (w, h) = match region {
            Region::Problems => self.problems_size,
            Region::Answers => self.answers_size,
        };
        Raster::from_png(png(w, h))
    }
}

/// 保存到内存的导出目标
#[derive(Clone, Default)]
pub struct MemorySink {
    pub saved: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    pub call_log: Arc<CallLog>,
}

impl ArtifactSink for MemorySink {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> AppResult<String> {
        self.call_log.record("save");
        self.saved.lock().unwrap().push((file_name.to_string(), bytes));
        Ok(format!("memory://{}", file_name))
    }
}

pub type TestSession = Session<ScriptedGenerator, FakeSynthesizer, FakeRasterizer, MemorySink>;

pub fn session(
    generator: &ScriptedGenerator,
    synthesizer: &FakeSynthesizer,
    rasterizer: &FakeRasterizer,
    sink: &MemorySink,
) -> TestSession {
    let exporter = ExportPipeline::new(rasterizer.clone(), sink.clone(), 768);
    Session::new(generator.clone(), synthesizer.clone(), exporter)
        .with_download_grace(Duration::ZERO)
}
