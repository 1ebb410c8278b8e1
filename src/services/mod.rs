pub mod image_service;
pub mod pdf_service;
pub mod problem_service;
pub mod render_service;

pub use image_service::{illustrate, ImageService, ImageSynthesizer};
pub use pdf_service::{PageLayout, PdfBuilder, Placement};
pub use problem_service::{ProblemGenerator, ProblemService};
pub use render_service::{render_results_html, Raster, Rasterizer, Region};
