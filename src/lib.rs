//! # Ultra Translate
//!
//! 对实时 HTML 文档做增量、可逆的双语翻译，并为视频字幕提供双语呈现。
//!
//! ## 模块组织
//!
//! - `parsers` - HTML DOM 操作、内联样式读取、WebVTT/SRT 字幕解析
//! - `translation` - 页面翻译管道（收集、分批、分发、替换、恢复、变更监听）
//! - `subtitle` - 字幕引擎（轨道发现、字幕翻译、轨道与浮层呈现）
//! - `controller` - 控制消息与快捷键
//! - `env` - 类型安全的环境变量
//! - `utils` - 数据 URL 与地址工具

pub mod controller;
pub mod env;
pub mod parsers;
pub mod subtitle;
pub mod translation;
pub mod utils;

// Re-export commonly used items for convenience
pub use controller::{shortcut_command, ControlMessage, ControlReply, Controller, KeyEvent};
pub use parsers::*;
pub use utils::*;
