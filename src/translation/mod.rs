//! 翻译模块
//!
//! 提供捕获文档的内容本地化功能，采用清晰的模块化架构：
//!
//! - **collector**: 从DOM中收集可翻译单元（单一访问者，带标签变体分发）
//! - **orchestrator**: 按固定顺序编排逐单元翻译并写回文档
//! - **service**: 翻译能力接口与HTTP实现
//! - **error**: 错误处理
//!
//! 三类单元按固定顺序处理：meta → img alt → 可见文本，每类内部
//! 保持文档顺序。单个单元的失败只记录日志并保留原文，从不中止
//! 整个翻译过程。

pub mod collector;
pub mod error;
pub mod orchestrator;
pub mod service;

// Re-export commonly used items for convenience
pub use collector::{collect_translation_units, NodeLocator, TranslationUnit, UnitCategory};
pub use error::{TranslationError, TranslationResult};
pub use orchestrator::TranslationOrchestrator;
pub use service::{HttpTranslator, Translator, TranslatorConfig};
