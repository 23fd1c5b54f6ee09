//! # 解析器模块
//!
//! - `html` - HTML文档解析、DOM操作与序列化
//! - `style` - 内联样式声明读取
//! - `vtt` - WebVTT 字幕解析与生成
//! - `srt` - SubRip 字幕解析

pub mod html;
pub mod srt;
pub mod style;
pub mod vtt;

// Re-export commonly used items for convenience
pub use html::{html_to_dom, serialize_document};
pub use srt::parse_srt;
pub use style::{parse_inline_style, InlineStyle};
pub use vtt::{format_vtt_time, parse_vtt, serialize_vtt};
