//! PDF 导出流程的集成测试

mod common;

use common::{FakeRasterizer, MemorySink};
use futures::FutureExt;
use math_problem_generator::services::Region;
use math_problem_generator::workflow::{ExportPhase, ExportPipeline, PDF_FILE_NAME};
use math_problem_generator::{Problem, ProblemSet};
use tokio_test::{assert_err, assert_ok};

fn problem_set(count: usize) -> ProblemSet {
    ProblemSet::new(
        (1..=count)
            .map(|i| Problem {
                statement: format!("If x + {} = 10, what is x?", i),
                answer: format!("x = {}", 10 - i as i64),
                image: None,
            })
            .collect(),
    )
}

/// 光栅化器和保存目标共用同一份调用记录，记录完整的调用顺序
fn pipeline(rasterizer: FakeRasterizer) -> (ExportPipeline<FakeRasterizer, MemorySink>, MemorySink) {
    let sink = MemorySink {
        call_log: rasterizer.call_log.clone(),
        ..MemorySink::default()
    };
    let calls = rasterizer.call_log.clone();
    let pipeline = ExportPipeline::new(rasterizer, sink.clone(), 768);
    calls.attach(pipeline.subscribe());
    (pipeline, sink)
}

#[tokio::test]
async fn test_export_runs_phases_in_order() {
    let rasterizer = FakeRasterizer::default();
    let calls = rasterizer.call_log.clone();
    let (pipeline, sink) = pipeline(rasterizer);

    let report = assert_ok!(pipeline.run(&problem_set(3)).await).expect("应该生成 PDF");

    assert_eq!(
        calls.events(),
        vec![
            "load @Init/0",
            "#problems-container @RenderProblems/25",
            "#answers-container @RenderAnswers/65",
            "save @Finalize/100",
        ]
    );
    assert_eq!(report.page_count, 2);
    assert_eq!(report.location, format!("memory://{}", PDF_FILE_NAME));
    assert!(report.warnings.is_empty());
    assert!(!report.problems_page.clamped);
    assert!((report.problems_page.width_mm - 180.0).abs() < 0.01);
    assert!(report.answers_page.height_mm < report.problems_page.height_mm);

    let status = pipeline.status();
    assert_eq!(status.phase, ExportPhase::Done);
    assert_eq!(status.progress, 100);
    assert!(!pipeline.is_running());

    let saved = sink.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].1.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_empty_set_is_noop() {
    let rasterizer = FakeRasterizer::default();
    let calls = rasterizer.call_log.clone();
    let (pipeline, sink) = pipeline(rasterizer);

    let report = assert_ok!(pipeline.run(&ProblemSet::default()).await);

    assert!(report.is_none());
    assert!(calls.events().is_empty());
    assert!(sink.saved.lock().unwrap().is_empty());
    assert_eq!(pipeline.status().phase, ExportPhase::Idle);
}

#[tokio::test]
async fn test_second_export_is_ignored_while_running() {
    let rasterizer = FakeRasterizer::default();
    let (pipeline, sink) = pipeline(rasterizer);
    let set = problem_set(2);

    let (first, second) = tokio::join!(pipeline.run(&set), pipeline.run(&set));

    assert!(assert_ok!(first).is_some());
    assert!(assert_ok!(second).is_none());
    assert_eq!(sink.saved.lock().unwrap().len(), 1);

    // 结束后可以再次导出
    assert!(assert_ok!(pipeline.run(&set).await).is_some());
    assert_eq!(sink.saved.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_tall_content_is_clamped_to_one_page() {
    let rasterizer = FakeRasterizer {
        problems_size: (1536, 4000),
        ..FakeRasterizer::default()
    };
    let (pipeline, _sink) = pipeline(rasterizer);

    let report = assert_ok!(pipeline.run(&problem_set(20)).await).expect("应该生成 PDF");

    assert_eq!(report.page_count, 2);
    assert!(report.problems_page.clamped);
    assert!((report.problems_page.height_mm - 267.0).abs() < 0.01);
    assert!(!report.answers_page.clamped);
    assert_eq!(report.warnings.len(), 1);
}

#[tokio::test]
async fn test_failure_publishes_failed_status() {
    let rasterizer = FakeRasterizer {
        fail_on: Some(Region::Answers),
        ..FakeRasterizer::default()
    };
    let calls = rasterizer.call_log.clone();
    let (pipeline, sink) = pipeline(rasterizer);

    let err = assert_err!(pipeline.run(&problem_set(2)).await);

    assert!(err.is_export());
    assert_eq!(err.to_string(), "PDF 生成失败: 截图失败");
    let status = pipeline.status();
    assert_eq!(status.phase, ExportPhase::Failed);
    assert_eq!(status.progress, 65);
    assert!(status.label.contains("截图失败"));
    assert!(!pipeline.is_running());
    assert!(sink.saved.lock().unwrap().is_empty());
    assert!(!calls.events().iter().any(|e| e.starts_with("save")));

    pipeline.reset_status();
    assert_eq!(pipeline.status().phase, ExportPhase::Idle);
}

#[tokio::test]
async fn test_script_failure_is_reported_as_export_error() {
    let rasterizer = FakeRasterizer {
        fail_on: Some(Region::Problems),
        fail_with_script_result: true,
        ..FakeRasterizer::default()
    };
    let (pipeline, _sink) = pipeline(rasterizer);

    let err = assert_err!(pipeline.run(&problem_set(1)).await);

    assert!(err.is_export());
    let message = err.to_string();
    assert!(message.starts_with("PDF 生成失败: JSON解析失败"), "{}", message);
    assert!(!message.contains("生成题目失败"));
    assert_eq!(pipeline.status().progress, 25);
}

#[tokio::test]
async fn test_dropped_export_releases_running_flag() {
    let (pipeline, sink) = pipeline(FakeRasterizer::default());
    let set = problem_set(2);

    // 第一次轮询停在导出中途，随后整个任务被丢弃
    assert!(pipeline.run(&set).now_or_never().is_none());
    assert!(!pipeline.is_running());
    assert!(sink.saved.lock().unwrap().is_empty());

    assert!(assert_ok!(pipeline.run(&set).await).is_some());
    assert_eq!(sink.saved.lock().unwrap().len(), 1);
}
