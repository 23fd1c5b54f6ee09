//! 翻译模块
//!
//! 增量、可逆的页面翻译管道：
//! - **pipeline**: 文本收集、可见性与过滤、分句、按上下文分批
//! - **core**: 分发、替换与恢复、会话状态、变更监听
//! - **storage**: 以节点身份为键的替换记录
//! - **config**: 引擎配置
//! - **settings**: 宿主下发的翻译设置
//! - **language**: 语言标签与书写方向
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use ultra_translate::html::html_to_dom;
//! use ultra_translate::translation::{ChannelBackend, EngineConfig, Settings, TranslationSession};
//!
//! # async fn example() {
//! let dom = html_to_dom(b"<p>Hello world</p>", "utf-8".to_string());
//! let (backend, _calls) = ChannelBackend::channel(8);
//! let session = TranslationSession::new(dom.document.clone(), backend, EngineConfig::default(), Settings::default());
//! let report = session.translate_page().await;
//! # let _ = report;
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

pub mod config;
pub mod core;
pub mod error;
pub mod language;
pub mod pipeline;
pub mod settings;
pub mod storage;

// ============================================================================
// 核心API导出
// ============================================================================

pub use config::{load_engine_config, ConfigManager, EngineConfig};
#[cfg(feature = "http")]
pub use core::HttpBackend;
pub use core::{
    watch, ChannelBackend, DispatchConfig, Dispatcher, MutationRecord, MutationWatcher, PassKind,
    PassReport, RestoreReport, SessionState, SubstitutionEngine, ToggleOutcome, TranslateRequest,
    TranslateResponse, TranslationBackend, TranslationSession,
};
pub use error::{TranslationError, TranslationResult};
pub use pipeline::{Batch, BatchLimits, ContextBatcher, TextCollector, TextFilter, TextUnit};
pub use settings::{BilingualMode, Settings, SubtitleMode};
pub use storage::{IdentityMap, IdentitySet, SubstitutionRecords};
