pub mod js_executor;
pub mod page_rasterizer;

pub use js_executor::JsExecutor;
pub use page_rasterizer::PageRasterizer;
