//! 引擎配置管理模块
//!
//! 提供配置文件、环境变量和默认值三层合并的引擎配置

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, EngineConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 批次处理相关
    pub const MAX_BATCH_CHARS: usize = 1000;
    pub const GOOGLE_BATCH_SIZE: usize = 30;
    pub const DEFAULT_BATCH_SIZE: usize = 50;
    pub const MAX_CONCURRENT_BATCHES: usize = 3;
    pub const WAVE_DELAY: Duration = Duration::from_millis(50);

    // 文本过滤相关
    pub const MIN_TEXT_LENGTH: usize = 2;
    pub const SEGMENT_THRESHOLD: usize = 100;

    // 变更监听
    pub const DEBOUNCE: Duration = Duration::from_millis(1500);
    pub const AUTO_TRANSLATE_DELAY: Duration = Duration::from_millis(2000);

    // 字幕
    pub const CUE_BATCH_SIZE: usize = 50;
    pub const CUE_BATCH_CHARS: usize = 5000;

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "http://localhost:1188/translate";
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    // 跳过的元素
    pub const SKIP_ELEMENTS: &[&str] = &[
        "script", "style", "noscript", "iframe", "object", "embed", "pre", "code", "kbd",
        "samp", "var", "math", "svg", "canvas", "textarea", "input", "select", "option",
    ];

    // 行内元素，决定双语容器的形态
    pub const INLINE_ELEMENTS: &[&str] = &[
        "span", "a", "strong", "em", "b", "i", "u", "mark", "abbr", "cite", "q",
    ];

    // 引擎生成的 DOM 标记
    pub const WRAPPER_CLASS: &str = "ultra-translate-wrapper";
    pub const ORIGINAL_CLASS: &str = "ultra-translate-original";
    pub const TRANSLATED_CLASS: &str = "ultra-translate-translated";
    pub const SEPARATOR_CLASS: &str = "ultra-translate-separator";
    pub const LOADING_CLASS: &str = "ultra-translate-loading";
    pub const SUBTITLE_OVERLAY_CLASS: &str = "ultra-translate-subtitle-overlay";
    pub const NO_TRANSLATE_CLASS: &str = "notranslate";
    pub const ORIGINAL_ATTRS_ATTR: &str = "data-ultra-original-attrs";
    pub const PROCESSED_VIDEO_ATTR: &str = "data-ultra-translate-processed";
    pub const INJECTED_TRACK_ATTR: &str = "data-ultra-translate-track";
    pub const SUPPRESSED_TRACK_ATTR: &str = "data-ultra-translate-suppressed";
    pub const SUBTITLE_ORIGINAL_CLASS: &str = "ultra-translate-subtitle-original";
    pub const SUBTITLE_TRANSLATED_CLASS: &str = "ultra-translate-subtitle-translated";

    /// 引擎自己生成、不能再次翻译的元素类名
    pub const SYSTEM_CLASSES: &[&str] = &[
        WRAPPER_CLASS,
        ORIGINAL_CLASS,
        TRANSLATED_CLASS,
        SEPARATOR_CLASS,
        LOADING_CLASS,
        SUBTITLE_OVERLAY_CLASS,
    ];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "ultra-translate.toml",
        ".ultra-translate.toml",
        "ultra-translate.json",
        "~/.config/ultra-translate/config.toml",
        "/etc/ultra-translate/config.toml",
    ];
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}

/// 加载配置，失败时退回默认值
pub fn load_engine_config() -> EngineConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.get_config().clone(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            EngineConfig::default()
        }
    }
}
