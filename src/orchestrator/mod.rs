//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `session` - 应用状态机
//! - 持有会话历史和当前显示的题目集合
//! - 根据表单校验和进行中的操作决定哪些动作可用
//! - 串联 生成 → 配图 → 写入历史 → 导出
//!
//! ### `app` - 无头驱动程序
//! - 管理浏览器资源
//! - 用配置代替表单输入跑完一次流程
//!
//! ## 层次关系
//!
//! ```text
//! app (浏览器 + 配置)
//!     ↓
//! session (状态机)
//!     ↓
//! workflow (history / export_flow)
//!     ↓
//! services (能力层：出题 / 配图 / 渲染 / PDF)
//!     ↓
//! clients + infrastructure (Gemini API / JsExecutor)
//! ```

pub mod app;
pub mod session;

pub use app::{App, BrowserSession};
pub use session::{Session, View};
