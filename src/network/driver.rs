//! 渲染驱动能力接口
//!
//! 捕获管线不直接依赖任何具体浏览器引擎：它消费这里定义的两个
//! trait。一次捕获运行恰好使用一个渲染会话，会话不跨运行共享。
//!
//! 默认实现 `HttpRenderDriver` 基于 reqwest，适用于不需要脚本执行
//! 的页面：获取 HTML、按与浏览器端发现脚本相同的选择器集合收集
//! 资源引用、在已渲染会话上复用同一客户端抓取资源字节。

use std::time::Duration;

use thiserror::Error;

use crate::parsers::html::{discover_asset_references, html_to_dom};
use crate::utils::url::Url;

/// 渲染或抓取过程中来自驱动的错误
#[derive(Debug, Error)]
pub enum DriverError {
    /// 页面导航失败（超时、连接失败、非成功状态）
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// 驱动自身初始化失败
    #[error("failed to initialize render driver: {0}")]
    Initialization(String),
}

/// 资源抓取响应
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub bytes: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 一个已渲染完成的页面会话
///
/// `render` 返回时页面必须已经稳定（网络空闲）；`fetch` 在同一
/// 会话上执行，允许复用已缓存的响应。`Ok(None)` 表示没有得到
/// 任何响应，调用方将其视为该资源的失败。
pub trait RenderedPage {
    /// 渲染后的完整 HTML 文本
    fn content(&self) -> &str;

    /// 按文档顺序返回页面引用的资源（样式表、脚本、图片）
    fn discover_assets(&self) -> Vec<String>;

    /// 抓取一个资源的原始字节
    async fn fetch(&self, url: &Url) -> Result<Option<FetchResponse>, DriverError>;
}

/// 渲染驱动能力
pub trait RenderDriver {
    type Page: RenderedPage;

    /// 渲染一个页面，等待其稳定后返回会话
    async fn render(&self, url: &Url) -> Result<Self::Page, DriverError>;
}

/// 基于 reqwest 的静态渲染驱动
///
/// 不执行 JavaScript，因此「等待网络空闲」的契约平凡成立。
pub struct HttpRenderDriver {
    client: reqwest::Client,
}

impl HttpRenderDriver {
    pub fn new(timeout: Duration, user_agent: Option<&str>) -> Result<Self, DriverError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent.to_string());
        }
        let client = builder
            .build()
            .map_err(|error| DriverError::Initialization(error.to_string()))?;

        Ok(Self { client })
    }
}

impl RenderDriver for HttpRenderDriver {
    type Page = HttpRenderedPage;

    async fn render(&self, url: &Url) -> Result<HttpRenderedPage, DriverError> {
        let navigation_error = |reason: String| DriverError::Navigation {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|error| navigation_error(error.to_string()))?;

        if !response.status().is_success() {
            return Err(navigation_error(format!("HTTP status {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|error| navigation_error(error.to_string()))?;

        Ok(HttpRenderedPage {
            client: self.client.clone(),
            html,
        })
    }
}

/// HTTP 驱动渲染出的页面会话
pub struct HttpRenderedPage {
    client: reqwest::Client,
    html: String,
}

impl RenderedPage for HttpRenderedPage {
    fn content(&self) -> &str {
        &self.html
    }

    fn discover_assets(&self) -> Vec<String> {
        let dom = html_to_dom(self.html.as_bytes(), "utf-8".to_string());
        discover_asset_references(&dom.document)
    }

    async fn fetch(&self, url: &Url) -> Result<Option<FetchResponse>, DriverError> {
        let response = match self.client.get(url.as_str()).send().await {
            Ok(response) => response,
            // 传输层失败等价于「没有响应」，由调用方按单个资源失败处理
            Err(_) => return Ok(None),
        };

        let status = response.status().as_u16();
        let bytes = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(_) => return Ok(None),
        };

        Ok(Some(FetchResponse { status, bytes }))
    }
}
