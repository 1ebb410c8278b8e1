//! 结果页渲染 - 业务能力层
//!
//! 把题目集合渲染成结果页 HTML（题目区 + 答案区），
//! 并定义"把页面某个区域栅格化成图片"的能力

use std::future::Future;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, ImageReader};

use crate::error::{AppError, AppResult};
use crate::models::ProblemSet;

/// 结果页中可导出的区域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Problems,
    Answers,
}

impl Region {
    pub fn selector(self) -> &'static str {
        match self {
            Region::Problems => "#problems-container",
            Region::Answers => "#answers-container",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Region::Problems => "题目",
            Region::Answers => "答案",
        }
    }
}

/// 栅格化后的 PNG 图片
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub png: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl Raster {
    /// 从 PNG 字节构建，尺寸从图片头读取
    pub fn from_png(png: Vec<u8>) -> AppResult<Self> {
        let (width_px, height_px) = ImageReader::with_format(Cursor::new(&png), ImageFormat::Png)
            .into_dimensions()
            .map_err(|e| AppError::export(format!("无法读取截图尺寸: {}", e)))?;
        if width_px == 0 || height_px == 0 {
            return Err(AppError::export("截图尺寸为 0"));
        }
        Ok(Self {
            png,
            width_px,
            height_px,
        })
    }
}

/// 页面栅格化能力
///
/// 先 `load` 结果页，再对各区域 `snapshot`
pub trait Rasterizer: Send + Sync {
    fn load(&self, html: &str) -> impl Future<Output = AppResult<()>> + Send;

    fn snapshot(&self, region: Region) -> impl Future<Output = AppResult<Raster>> + Send;
}

const STYLE: &str = r#"
body { margin: 0; padding: 24px; background: #f3f4f6; font-family: "Noto Sans", "Noto Sans CJK SC", "Microsoft YaHei", sans-serif; color: #111827; }
.results { display: flex; flex-direction: column; gap: 32px; }
.panel { background: #ffffff; border: 1px solid #e5e7eb; border-radius: 12px; box-shadow: 0 10px 15px -3px rgba(0,0,0,0.1); padding: 24px; }
.panel h2 { font-size: 24px; font-weight: 700; margin: 0 0 16px 0; }
.panel ul { list-style: none; margin: 0; padding: 0; display: flex; flex-direction: column; gap: 24px; }
.panel li { background: #f3f4f6; border-radius: 8px; padding: 16px; }
.label { font-weight: 600; color: #4f46e5; margin: 0 0 8px 0; }
.text { color: #374151; white-space: pre-wrap; margin: 0; line-height: 1.5; }
.figure { display: block; max-width: 100%; max-height: 320px; margin: 12px auto 0 auto; border-radius: 6px; }
.pdf-export { box-shadow: none; border: none; border-radius: 0; }
"#;

/// 渲染结果页 HTML
///
/// `width_px` 是结果区域的 CSS 宽度，导出时会按同样的宽度重排
pub fn render_results_html(set: &ProblemSet, width_px: u32) -> String {
    let mut problems = String::new();
    let mut answers = String::new();

    for (i, problem) in set.iter().enumerate() {
        let index = i + 1;
        problems.push_str(&format!(
            "<li><p class=\"label\">Problem {}</p><p class=\"text\">{}</p>",
            index,
            escape_html(&problem.statement)
        ));
        if let Some(image) = &problem.image {
            problems.push_str(&format!(
                "<img class=\"figure\" alt=\"Problem {} illustration\" src=\"data:image/png;base64,{}\">",
                index,
                BASE64.encode(image)
            ));
        }
        problems.push_str("</li>");

        answers.push_str(&format!(
            "<li><p class=\"label\">Answer {}</p><p class=\"text\">{}</p></li>",
            index,
            escape_html(&problem.answer)
        ));
    }

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><style>{style}</style></head>\
         <body><section class=\"results\" style=\"width: {width}px\">\
         <div id=\"problems-container\" class=\"panel\"><h2>Generated Problems</h2><ul>{problems}</ul></div>\
         <div id=\"answers-container\" class=\"panel\"><h2>Answer Key</h2><ul>{answers}</ul></div>\
         </section></body></html>",
        style = STYLE,
        width = width_px,
        problems = problems,
        answers = answers,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Problem;

    fn sample_set() -> ProblemSet {
        ProblemSet::new(vec![
            Problem {
                statement: "If x < 3 and y > 2, what is x & y?".into(),
                answer: "x = 2".into(),
                image: None,
            },
            Problem {
                statement: "Find the hypotenuse.".into(),
                answer: "5".into(),
                image: Some(vec![1, 2, 3]),
            },
        ])
    }

    #[test]
    fn test_html_has_both_regions() {
        let html = render_results_html(&sample_set(), 640);
        assert!(html.contains("id=\"problems-container\""));
        assert!(html.contains("id=\"answers-container\""));
        assert!(html.contains("width: 640px"));
        assert!(html.contains("Problem 2"));
        assert!(html.contains("Answer 2"));
    }

    #[test]
    fn test_html_escapes_text() {
        let html = render_results_html(&sample_set(), 640);
        assert!(html.contains("x &lt; 3 and y &gt; 2, what is x &amp; y?"));
        assert!(!html.contains("x < 3"));
    }

    #[test]
    fn test_html_embeds_only_existing_images() {
        let html = render_results_html(&sample_set(), 640);
        assert_eq!(html.matches("<img").count(), 1);
        assert!(html.contains("src=\"data:image/png;base64,AQID\""));
    }

    #[test]
    fn test_raster_reads_png_dimensions() {
        let mut png = Vec::new();
        image::DynamicImage::new_rgb8(40, 90)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let raster = Raster::from_png(png).unwrap();
        assert_eq!((raster.width_px, raster.height_px), (40, 90));
    }

    #[test]
    fn test_raster_rejects_garbage() {
        assert!(Raster::from_png(b"not a png".to_vec()).unwrap_err().is_export());
    }
}
