//! 字幕引擎模块
//!
//! - `cue`: 字幕条目、格式识别与当前字幕查找
//! - `source`: 字幕轨道发现与字幕加载
//! - `translate`: 字幕批量翻译
//! - `presenter`: 轨道模式与浮层模式的双语呈现
//! - `engine`: 按视频管理处理标记、呈现状态与清理

pub mod cue;
pub mod engine;
pub mod presenter;
pub mod source;
pub mod translate;

pub use cue::{find_active_cue, parse_captions, CaptionFormat, CueTiming, SubtitleCue, TranslatedCue};
pub use engine::{select_source_track, SubtitleEngine, VideoOutcome, VideoSubtitleState};
#[cfg(feature = "http")]
pub use source::HttpCaptionSource;
pub use source::{discover_tracks, load_cues, CaptionSource, MemoryCaptionSource, TrackInfo};
pub use presenter::{bilingual_vtt, OverlayPresenter, Presentation, TrackPresenter};
pub use translate::{CueTranslation, CueTranslator};
