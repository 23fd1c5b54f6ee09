//! # 工具模块
//!
//! - `url` - 数据URL创建与解析、相对地址解析、排除站点匹配

pub mod url;

// Re-export commonly used items for convenience
pub use url::{create_data_url, is_excluded_site, parse_data_url, resolve_url, Url};
