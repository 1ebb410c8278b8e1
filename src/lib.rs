//! # Math Problem Generator
//!
//! 上传一张数学题截图，由生成式模型出 N 道同类变式题（含答案和可选插图），
//! 并导出为两页 PDF（题目页 + 答案页）
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure / Clients）
//! - `clients/` - Gemini REST API 的传输与报文
//! - `infrastructure/` - 持有浏览器 Page，只暴露 eval / 截图能力
//!
//! ### ② 业务能力层（Services）
//! - `ProblemService` - 看图出题，严格校验结构化输出
//! - `ImageService` - 为单道题生成插图，失败降级为无图
//! - `render_service` - 结果页 HTML 与区域栅格化接口
//! - `pdf_service` - A4 两页 PDF 的排版与合成
//!
//! ### ③ 流程层（Workflow）
//! - `History` - 线性撤销 / 重做的会话历史
//! - `ExportPipeline` - 带进度的 PDF 导出流程
//!
//! ### ④ 编排层（Orchestration）
//! - `Session` - 应用状态机
//! - `App` - 无头驱动程序

pub mod browser;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{GenerationRequest, Problem, ProblemSet, SourceImage};
pub use orchestrator::{App, Session, View};
pub use workflow::{ExportPipeline, ExportPhase, ExportReport, ExportStatus, History};
