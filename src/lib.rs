//! # Pagelith Library
//!
//! 一个用于把渲染后的网页捕获为离线自包含副本的工具库，所有资源
//! 解析为本地文件，并生成结构保真的翻译变体。
//!
//! ## 模块组织
//!
//! - `core` - 捕获管线和主要处理逻辑
//! - `assets` - 资源引用解析与获取
//! - `network` - 渲染驱动能力接口与HTTP实现
//! - `parsers` - HTML解析、资源发现、文档重写
//! - `snapshot` - 快照持久化与错误日志
//! - `translation` - 翻译编排（可用确定性桩替换）
//! - `utils` - 工具函数和实用程序

#![allow(async_fn_in_trait)]

pub mod assets;
pub mod core;
pub mod network;
pub mod parsers;
pub mod snapshot;
pub mod translation;
pub mod utils;

// Re-export commonly used items for convenience
pub use assets::*;
pub use core::*;
pub use network::*;
pub use parsers::*;
pub use snapshot::*;
pub use translation::*;
pub use utils::*;
