//! 翻译模块统一错误处理

use thiserror::Error;

/// 翻译错误类型
///
/// 翻译失败与成功的空串译文是可区分的：前者是 `Err`，后者是
/// `Ok(String::new())`。
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误（缺少API密钥等）
    #[error("translation configuration error: {0}")]
    Config(String),

    /// 网络错误
    #[error("translation request failed: {0}")]
    Network(String),

    /// 翻译服务返回非成功状态
    #[error("translation service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    /// 响应体无法解析
    #[error("invalid translation response: {0}")]
    InvalidResponse(String),
}

/// 翻译操作的结果类型
pub type TranslationResult<T> = Result<T, TranslationError>;
