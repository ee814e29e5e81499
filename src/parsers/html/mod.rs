//! HTML 解析与 DOM 操作
//!
//! - `dom` - 解析字节为 DOM、节点属性读写
//! - `discovery` - 按文档顺序发现资源引用
//! - `serializer` - DOM 序列化回字节

pub mod discovery;
pub mod dom;
pub mod serializer;

pub use discovery::discover_asset_references;
pub use dom::{get_node_attr, get_node_name, html_to_dom, set_node_attr};
pub use serializer::serialize_document;
