pub mod connection;
pub mod headless;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

use anyhow::Result;
use chromiumoxide::{Browser, Page};

use crate::config::Config;

/// 配置了调试端口时连接已有浏览器，否则启动无头浏览器
pub async fn open_browser(config: &Config) -> Result<(Browser, Page)> {
    match config.browser_debug_port {
        Some(port) => connect_to_browser(port).await,
        None => launch_headless_browser(config.chrome_executable.as_deref()).await,
    }
}
