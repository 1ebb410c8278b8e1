//! 基于浏览器页面的栅格化实现
//!
//! 导出时把区域复制一份挂到页面上（同样的 CSS 宽度，保证文字折行一致），
//! 以 2 倍像素密度截图后再移除副本

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::JsExecutor;
use crate::services::render_service::{Raster, Rasterizer, Region};

/// 截图的设备像素比
const SNAPSHOT_SCALE: f64 = 2.0;
/// 视口初始高度，截图时元素会被滚动到可见区域
const VIEWPORT_HEIGHT: u32 = 1024;
const CLONE_ID: &str = "pdf-export-clone";

pub struct PageRasterizer {
    executor: JsExecutor,
    view_width_px: u32,
}

impl PageRasterizer {
    pub fn new(executor: JsExecutor, view_width_px: u32) -> Self {
        Self {
            executor,
            view_width_px,
        }
    }

    /// 复制区域并挂到文档末尾，返回原区域的宽度
    fn clone_script(selector: &str) -> String {
        format!(
            r#"
            (() => {{
                const source = document.querySelector({selector:?});
                if (!source) {{
                    return null;
                }}
                const stale = document.getElementById({clone_id:?});
                if (stale) {{
                    stale.remove();
                }}
                const clone = source.cloneNode(true);
                clone.id = {clone_id:?};
                clone.classList.add('pdf-export');
                clone.style.position = 'absolute';
                clone.style.left = '0px';
                clone.style.top = (document.documentElement.scrollHeight + 100) + 'px';
                clone.style.width = source.offsetWidth + 'px';
                clone.style.boxSizing = 'border-box';
                document.body.appendChild(clone);
                return source.offsetWidth;
            }})()
            "#,
            selector = selector,
            clone_id = CLONE_ID,
        )
    }

    fn remove_script() -> String {
        format!(
            "(() => {{ const c = document.getElementById({:?}); if (c) {{ c.remove(); }} return true; }})()",
            CLONE_ID
        )
    }
}

impl Rasterizer for PageRasterizer {
    async fn load(&self, html: &str) -> AppResult<()> {
        self.executor
            .set_viewport(self.view_width_px + 48, VIEWPORT_HEIGHT, SNAPSHOT_SCALE)
            .await?;
        self.executor.set_content(html).await?;
        Ok(())
    }

    async fn snapshot(&self, region: Region) -> AppResult<Raster> {
        let width: Option<f64> = self
            .executor
            .eval_as(Self::clone_script(region.selector()))
            .await
            .map_err(AppError::into_export)?;
        let Some(width) = width else {
            return Err(AppError::export(format!("找不到要导出的{}内容", region.name())));
        };
        debug!("截取{}区域 (宽 {}px)", region.name(), width);

        let shot = self
            .executor
            .screenshot_element(&format!("#{}", CLONE_ID))
            .await;
        // 无论截图是否成功都移除副本
        self.executor
            .eval(Self::remove_script())
            .await
            .map_err(AppError::into_export)?;

        Raster::from_png(shot?)
    }
}
