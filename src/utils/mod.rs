//! # 工具模块
//!
//! 这个模块包含各种工具函数和实用程序：
//!
//! - URL处理和解析工具
//! - 捕获目录命名
//!
//! # 模块组织
//!
//! - `url` - URL解析、相对路径处理、目录命名等工具函数

pub mod url;

// Re-export commonly used items for convenience
pub use url::{directory_name_for_url, is_data_url, resolve_url, url_hash, Url};
