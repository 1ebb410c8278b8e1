//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS / 加载内容 / 截图"的能力

use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::AppResult;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识 Problem / ProblemSet
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> AppResult<JsonValue> {
        let result = self.page.evaluate(js_code.into()).await?;
        let json_value = result.into_value()?;
        Ok(json_value)
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(&self, js_code: impl Into<String>) -> AppResult<T> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 设置视口宽高和设备像素比
    pub async fn set_viewport(&self, width: u32, height: u32, scale: f64) -> AppResult<()> {
        let params =
            SetDeviceMetricsOverrideParams::new(i64::from(width), i64::from(height), scale, false);
        self.page.execute(params).await?;
        Ok(())
    }

    /// 用 HTML 替换整个页面内容
    pub async fn set_content(&self, html: &str) -> AppResult<()> {
        self.page.set_content(html).await?;
        Ok(())
    }

    /// 对选择器匹配的第一个元素截 PNG 图
    pub async fn screenshot_element(&self, selector: &str) -> AppResult<Vec<u8>> {
        let element = self.page.find_element(selector).await?;
        let png = element.screenshot(CaptureScreenshotFormat::Png).await?;
        Ok(png)
    }
}
