//! # 解析器模块
//!
//! 这个模块包含所有用于解析和改写捕获文档的功能：
//!
//! - HTML解析和DOM操作
//! - 资源引用发现
//! - 文档引用重写（指向本地副本）
//!
//! # 模块组织
//!
//! - `html` - HTML文档解析、DOM操作、资源发现、序列化
//! - `rewriter` - 把文档中的资源引用替换为本地相对路径

pub mod html;
pub mod rewriter;

// Re-export commonly used items for convenience
pub use html::{
    discover_asset_references, get_node_attr, get_node_name, html_to_dom, serialize_document,
    set_node_attr,
};
pub use rewriter::rewrite_document;
