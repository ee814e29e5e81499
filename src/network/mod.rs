//! # 网络模块
//!
//! 这个模块包含渲染驱动能力接口及其默认实现：
//!
//! - 渲染驱动 trait：渲染页面、暴露内容、发现资源、抓取字节
//! - 基于 reqwest 的静态驱动（不执行脚本的页面）
//!
//! # 模块组织
//!
//! - `driver` - 渲染能力接口与 HTTP 驱动实现

pub mod driver;

// Re-export commonly used items for convenience
pub use driver::{DriverError, FetchResponse, HttpRenderDriver, RenderDriver, RenderedPage};
