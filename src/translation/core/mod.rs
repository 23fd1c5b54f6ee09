//! 翻译系统核心模块
//!
//! 把管道各阶段串成完整的页面翻译流程：
//!
//! ```text
//! TranslationSession (session.rs)
//!     ├── TextCollector / ContextBatcher (pipeline/)
//!     ├── Dispatcher (dispatcher.rs)
//!     │       └── TranslationBackend: ChannelBackend | HttpBackend
//!     ├── SubstitutionEngine (engine.rs, attributes.rs)
//!     └── LoadingIndicator (indicator.rs)
//! MutationWatcher (watcher.rs) ──→ TranslationSession::translate_roots
//! ```

pub mod attributes;
pub mod dispatcher;
pub mod engine;
pub mod indicator;
pub mod session;
pub mod watcher;

pub use attributes::{apply_attribute_translation, restore_attributes};
#[cfg(feature = "http")]
pub use dispatcher::HttpBackend;
pub use dispatcher::{
    BackendCall, ChannelBackend, DispatchConfig, DispatchOutcome, DispatchStats, Dispatcher,
    TranslateRequest, TranslateResponse, TranslationBackend,
};
pub use engine::{has_substitutions, RenderOptions, RestoreReport, SkipReason, SubstitutionEngine};
pub use indicator::LoadingIndicator;
pub use session::{PassKind, PassReport, SessionState, ToggleOutcome, TranslationSession};
pub use watcher::{watch, MutationRecord, MutationWatcher, WatchStats, WatcherState};
