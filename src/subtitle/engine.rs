//! 字幕引擎
//!
//! 每个视频只处理一次（以视频上的处理标记为准）：发现字幕轨道、加载字幕、批量翻译，
//! 再按双语模式注入轨道或浮层。清理时移除注入的元素、恢复原有轨道并清除处理标记。

use std::cell::RefCell;

use markup5ever_rcdom::Handle;

use super::cue::TranslatedCue;
use super::presenter::{OverlayPresenter, Presentation, TrackPresenter};
use super::source::{discover_tracks, load_cues, CaptionSource, TrackInfo};
use super::translate::CueTranslator;
use crate::html::{find_nodes, get_node_attr, set_node_attr};
use crate::translation::config::constants::PROCESSED_VIDEO_ATTR;
use crate::translation::config::EngineConfig;
use crate::translation::core::{DispatchConfig, Dispatcher, TranslationBackend};
use crate::translation::settings::{BilingualMode, Settings, SubtitleMode};
use crate::translation::storage::IdentityMap;

/// 单个视频的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum VideoOutcome {
    /// 字幕模式为关闭
    Disabled,
    AlreadyProcessed,
    NoSubtitles,
    /// 视频已有目标语言轨道，直接启用它
    TargetTrackActivated,
    /// 轨道没有可用字幕（抓取失败或内容为空）
    NoCues,
    /// 处理过程中视频被清理或字幕被关闭
    Cancelled,
    /// 视频不在文档中，无法插入浮层
    PresentationUnavailable,
    Presented {
        mode: BilingualMode,
        cues: usize,
        translated: usize,
    },
}

/// 视频的字幕状态
#[derive(Debug)]
pub struct VideoSubtitleState {
    pub has_subtitles: bool,
    pub tracks: Vec<TrackInfo>,
    pub target_language_available: bool,
    pub cues: Vec<TranslatedCue>,
    presentation: Option<Presentation>,
    /// 启用目标语言轨道前各轨道的默认状态
    previous_defaults: Vec<(Handle, bool)>,
}

impl VideoSubtitleState {
    fn empty(tracks: Vec<TrackInfo>) -> Self {
        Self {
            has_subtitles: !tracks.is_empty(),
            tracks,
            target_language_available: false,
            cues: Vec::new(),
            presentation: None,
            previous_defaults: Vec::new(),
        }
    }

    pub fn mode(&self) -> Option<BilingualMode> {
        self.presentation.as_ref().map(|presentation| match presentation {
            Presentation::Track(_) => BilingualMode::Track,
            Presentation::Overlay(_) => BilingualMode::Overlay,
        })
    }

    fn release(self) {
        if let Some(presentation) = self.presentation {
            presentation.cleanup();
        }
        for (element, was_default) in self.previous_defaults {
            set_node_attr(&element, "default", was_default.then(String::new));
        }
    }
}

/// 按模式选择作为翻译来源的轨道
///
/// `asr` 模式优先自动生成的字幕；否则优先默认轨道，再退回第一条。
pub fn select_source_track(tracks: &[TrackInfo], mode: SubtitleMode) -> Option<&TrackInfo> {
    let preferred = match mode {
        SubtitleMode::Asr => tracks.iter().find(|track| track.is_auto_generated()),
        _ => None,
    };
    preferred
        .or_else(|| tracks.iter().find(|track| track.is_default))
        .or_else(|| tracks.first())
}

/// 字幕引擎
pub struct SubtitleEngine<B, S> {
    dispatcher: Dispatcher<B>,
    source: S,
    translator: CueTranslator,
    settings: RefCell<Settings>,
    videos: RefCell<IdentityMap<VideoSubtitleState>>,
}

impl<B: TranslationBackend, S: CaptionSource> SubtitleEngine<B, S> {
    pub fn new(backend: B, source: S, config: &EngineConfig, settings: Settings) -> Self {
        Self {
            dispatcher: Dispatcher::new(backend, DispatchConfig::from_engine(config)),
            source,
            translator: CueTranslator::from_config(config),
            settings: RefCell::new(settings),
            videos: RefCell::new(IdentityMap::new()),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<B> {
        &self.dispatcher
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    /// 已经建立状态的视频数
    pub fn video_count(&self) -> usize {
        let mut videos = self.videos.borrow_mut();
        videos.prune();
        videos.len()
    }

    pub fn has_subtitles(&self, video: &Handle) -> bool {
        self.videos
            .borrow()
            .get(video)
            .is_some_and(|state| state.has_subtitles)
    }

    pub fn presentation_mode(&self, video: &Handle) -> Option<BilingualMode> {
        self.videos.borrow().get(video).and_then(VideoSubtitleState::mode)
    }

    pub fn translated_cues(&self, video: &Handle) -> Vec<TranslatedCue> {
        self.videos
            .borrow()
            .get(video)
            .map(|state| state.cues.clone())
            .unwrap_or_default()
    }

    /// 处理文档中的全部视频
    pub async fn process_all(&self, document: &Handle) -> Vec<VideoOutcome> {
        let mut outcomes = Vec::new();
        for video in find_nodes(document, vec!["video"]) {
            outcomes.push(self.process_video(&video).await);
        }
        outcomes
    }

    /// 处理单个视频
    pub async fn process_video(&self, video: &Handle) -> VideoOutcome {
        let settings = self.settings();
        if settings.subtitle_mode == SubtitleMode::Off {
            return VideoOutcome::Disabled;
        }
        if get_node_attr(video, PROCESSED_VIDEO_ATTR).is_some() {
            return VideoOutcome::AlreadyProcessed;
        }
        set_node_attr(video, PROCESSED_VIDEO_ATTR, Some("true".to_string()));

        let tracks = discover_tracks(video);
        if tracks.is_empty() {
            tracing::debug!("视频没有字幕轨道");
            self.videos
                .borrow_mut()
                .insert(video, VideoSubtitleState::empty(tracks));
            return VideoOutcome::NoSubtitles;
        }

        let target = &settings.target_language;
        if let Some(index) = tracks.iter().position(|track| track.matches_language(target)) {
            let mut state = VideoSubtitleState::empty(tracks);
            state.target_language_available = true;
            for (i, track) in state.tracks.iter().enumerate() {
                state.previous_defaults.push((track.element.clone(), track.is_default));
                let value = (i == index).then(String::new);
                set_node_attr(&track.element, "default", value);
            }
            tracing::info!("视频已有 {} 字幕轨道，直接启用", target);
            self.videos.borrow_mut().insert(video, state);
            return VideoOutcome::TargetTrackActivated;
        }

        let Some(source_track) = select_source_track(&tracks, settings.subtitle_mode) else {
            return VideoOutcome::NoSubtitles;
        };
        let cues = load_cues(&self.source, source_track).await;
        if cues.is_empty() {
            self.videos
                .borrow_mut()
                .insert(video, VideoSubtitleState::empty(tracks));
            return VideoOutcome::NoCues;
        }

        let translation = self
            .translator
            .translate(&self.dispatcher, &cues, &settings)
            .await;

        // 等待期间视频可能已被清理或字幕被关闭；清除标记以便重新开启后再次处理
        if get_node_attr(video, PROCESSED_VIDEO_ATTR).is_none()
            || self.settings.borrow().subtitle_mode == SubtitleMode::Off
        {
            set_node_attr(video, PROCESSED_VIDEO_ATTR, None);
            tracing::debug!("视频字幕处理已取消");
            return VideoOutcome::Cancelled;
        }

        let mode = self.settings.borrow().bilingual_mode;
        let presentation = match mode {
            BilingualMode::Track => Presentation::Track(TrackPresenter::attach(
                video,
                &tracks,
                &translation.cues,
                target,
            )),
            BilingualMode::Overlay => {
                match OverlayPresenter::attach(video, translation.cues.clone()) {
                    Some(overlay) => Presentation::Overlay(overlay),
                    None => {
                        self.videos
                            .borrow_mut()
                            .insert(video, VideoSubtitleState::empty(tracks));
                        return VideoOutcome::PresentationUnavailable;
                    }
                }
            }
        };

        let outcome = VideoOutcome::Presented {
            mode,
            cues: translation.cues.len(),
            translated: translation.translated_count(),
        };
        tracing::info!("视频字幕处理完成: {:?}", outcome);

        let mut state = VideoSubtitleState::empty(tracks);
        state.cues = translation.cues;
        state.presentation = Some(presentation);
        self.videos.borrow_mut().insert(video, state);
        outcome
    }

    /// 播放时间变化，返回浮层是否被改写
    pub fn on_time_update(&self, video: &Handle, time: f64) -> bool {
        self.videos
            .borrow_mut()
            .get_mut(video)
            .and_then(|state| state.presentation.as_mut())
            .is_some_and(|presentation| presentation.on_time_update(time))
    }

    /// 清理视频：移除注入元素、恢复原有轨道并清除处理标记
    pub fn cleanup(&self, video: &Handle) -> bool {
        let state = self.videos.borrow_mut().remove(video);
        let processed = get_node_attr(video, PROCESSED_VIDEO_ATTR).is_some();
        set_node_attr(video, PROCESSED_VIDEO_ATTR, None);
        match state {
            Some(state) => {
                state.release();
                true
            }
            None => processed,
        }
    }

    /// 清理所有视频
    pub fn disable_all(&self) -> usize {
        let drained = self.videos.borrow_mut().drain();
        let count = drained.len();
        for (video, state) in drained {
            state.release();
            set_node_attr(&video, PROCESSED_VIDEO_ATTR, None);
        }
        if count > 0 {
            tracing::info!("已清理 {} 个视频的字幕", count);
        }
        count
    }

    /// 更新字幕设置
    ///
    /// 关闭字幕时清理全部视频；双语模式变化时也清理，以便按新模式重新处理。
    pub fn update_settings(&self, settings: Settings) {
        let previous = self.settings.replace(settings);
        let current = self.settings.borrow();
        if current.subtitle_mode == SubtitleMode::Off
            || current.bilingual_mode != previous.bilingual_mode
            || current.target_language != previous.target_language
        {
            drop(current);
            self.disable_all();
        }
    }
}
