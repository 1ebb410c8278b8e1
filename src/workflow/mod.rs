pub mod export_flow;
pub mod history;

pub use export_flow::{
    ArtifactSink, ExportPhase, ExportPipeline, ExportReport, ExportStatus, FileSink, PDF_FILE_NAME,
};
pub use history::{History, HistoryStep};
