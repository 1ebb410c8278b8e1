//! PDF 合成 - 业务能力层
//!
//! 每页放一张整宽截图。内容高度超过可打印高度时压缩到可打印高度，
//! 不做分页

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, RawImage, XObjectTransform,
};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::render_service::Raster;

/// 页面布局（单位：毫米）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
}

impl PageLayout {
    /// A4 纵向，15mm 页边距
    pub const A4_PORTRAIT: PageLayout = PageLayout {
        page_width_mm: 210.0,
        page_height_mm: 297.0,
        margin_mm: 15.0,
    };

    pub fn content_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_mm * 2.0
    }

    pub fn printable_height_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm * 2.0
    }

    /// 按内容宽度等比缩放截图，高度超出可打印高度时截断到可打印高度
    pub fn place(&self, width_px: u32, height_px: u32) -> Placement {
        let width_mm = self.content_width_mm();
        let natural_height = height_px as f32 * width_mm / width_px as f32;
        let printable = self.printable_height_mm();
        if natural_height > printable {
            Placement {
                width_mm,
                height_mm: printable,
                clamped: true,
            }
        } else {
            Placement {
                width_mm,
                height_mm: natural_height,
                clamped: false,
            }
        }
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::A4_PORTRAIT
    }
}

/// 截图在页面上的位置（左上角固定在页边距处）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width_mm: f32,
    pub height_mm: f32,
    /// 是否因超出页面而被压缩
    pub clamped: bool,
}

fn mm_to_pt(mm: f32) -> Pt {
    Pt(mm * 72.0 / 25.4)
}

/// 逐页构建 PDF 文档
pub struct PdfBuilder {
    doc: PdfDocument,
    layout: PageLayout,
    pages: Vec<PdfPage>,
}

impl PdfBuilder {
    pub fn new(title: &str, layout: PageLayout) -> Self {
        Self {
            doc: PdfDocument::new(title),
            layout,
            pages: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 新起一页，把截图放在页边距内
    pub fn add_image_page(&mut self, raster: &Raster) -> AppResult<Placement> {
        let placement = self.layout.place(raster.width_px, raster.height_px);

        let mut warnings = Vec::new();
        let image = RawImage::decode_from_bytes(&raster.png, &mut warnings)
            .map_err(|e| AppError::export(format!("无法解码截图: {}", e)))?;
        let image_id = self.doc.add_image(&image);

        // dpi = 72 时 1 像素 = 1pt，缩放系数即目标尺寸 / 像素尺寸
        let width_pt = mm_to_pt(placement.width_mm).0;
        let height_pt = mm_to_pt(placement.height_mm).0;
        let top_pt = mm_to_pt(self.layout.page_height_mm - self.layout.margin_mm).0;

        let transform = XObjectTransform {
            translate_x: Some(mm_to_pt(self.layout.margin_mm)),
            translate_y: Some(Pt(top_pt - height_pt)),
            scale_x: Some(width_pt / raster.width_px as f32),
            scale_y: Some(height_pt / raster.height_px as f32),
            dpi: Some(72.0),
            ..Default::default()
        };

        debug!(
            "第 {} 页: {}x{}px → {:.1}x{:.1}mm",
            self.pages.len() + 1,
            raster.width_px,
            raster.height_px,
            placement.width_mm,
            placement.height_mm
        );

        self.pages.push(PdfPage::new(
            Mm(self.layout.page_width_mm),
            Mm(self.layout.page_height_mm),
            vec![Op::UseXobject {
                id: image_id,
                transform,
            }],
        ));

        Ok(placement)
    }

    /// 输出 PDF 字节
    pub fn finish(mut self) -> Vec<u8> {
        let mut warnings = Vec::new();
        let pages = std::mem::take(&mut self.pages);
        self.doc
            .with_pages(pages)
            .save(&PdfSaveOptions::default(), &mut warnings)
    }
}
