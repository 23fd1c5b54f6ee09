//! 双语字幕呈现
//!
//! - `TrackPresenter`：把双语字幕序列化为 WebVTT 数据 URL，作为新的 `<track>` 注入并强制启用，
//!   同时压下视频原有的字幕轨道
//! - `OverlayPresenter`：在视频之后插入一个不拦截指针事件的浮层，随播放时间切换显示的字幕

use markup5ever_rcdom::Handle;

use super::cue::{find_active_cue, TranslatedCue};
use super::source::TrackInfo;
use crate::html::{append_child, create_element, insert_after, remove_node, set_node_attr, set_text_content};
use crate::parsers::vtt::serialize_vtt;
use crate::translation::config::constants::{
    INJECTED_TRACK_ATTR, SUBTITLE_ORIGINAL_CLASS, SUBTITLE_OVERLAY_CLASS, SUBTITLE_TRANSLATED_CLASS,
    SUPPRESSED_TRACK_ATTR,
};
use crate::utils::create_data_url;

const OVERLAY_STYLE: &str = "position: absolute; left: 0; right: 0; bottom: 10%; \
     text-align: center; pointer-events: none; z-index: 2147483647";

/// 生成双语 WebVTT 内容：每条字幕译文在上、原文在下
pub fn bilingual_vtt(cues: &[TranslatedCue]) -> String {
    let cues: Vec<_> = cues.iter().map(|cue| cue.to_cue(cue.bilingual_text())).collect();
    serialize_vtt(&cues)
}

/// 轨道模式
#[derive(Debug)]
pub struct TrackPresenter {
    track: Handle,
    /// 被压下的原有轨道及其是否原本为默认轨道
    suppressed: Vec<(Handle, bool)>,
    data_url: String,
}

impl TrackPresenter {
    /// 注入双语轨道
    pub fn attach(
        video: &Handle,
        existing: &[TrackInfo],
        cues: &[TranslatedCue],
        target_language: &str,
    ) -> Self {
        let data_url = create_data_url("text/vtt", "utf-8", bilingual_vtt(cues).as_bytes());
        let label = format!("{} (Ultra Translate)", target_language);

        let mut suppressed = Vec::with_capacity(existing.len());
        for info in existing {
            if info.is_default {
                set_node_attr(&info.element, "default", None);
            }
            set_node_attr(&info.element, SUPPRESSED_TRACK_ATTR, Some(String::new()));
            suppressed.push((info.element.clone(), info.is_default));
        }

        let track = create_element(
            "track",
            &[
                ("kind", "subtitles"),
                ("label", label.as_str()),
                ("srclang", target_language),
                ("src", data_url.as_str()),
                ("default", ""),
                (INJECTED_TRACK_ATTR, ""),
            ],
        );
        append_child(video, &track);
        tracing::debug!("注入双语字幕轨道: {} 条字幕, {} 条原轨道被压下", cues.len(), suppressed.len());

        Self {
            track,
            suppressed,
            data_url,
        }
    }

    pub fn track(&self) -> &Handle {
        &self.track
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// 移除注入的轨道并恢复原有轨道
    pub fn cleanup(self) {
        remove_node(&self.track);
        for (element, was_default) in self.suppressed {
            set_node_attr(&element, SUPPRESSED_TRACK_ATTR, None);
            if was_default {
                set_node_attr(&element, "default", Some(String::new()));
            }
        }
    }
}

/// 浮层模式
#[derive(Debug)]
pub struct OverlayPresenter {
    cues: Vec<TranslatedCue>,
    overlay: Handle,
    original: Handle,
    translated: Handle,
    active: Option<usize>,
    writes: usize,
}

impl OverlayPresenter {
    /// 在视频之后插入浮层；视频没有父节点时返回 `None`
    pub fn attach(video: &Handle, cues: Vec<TranslatedCue>) -> Option<Self> {
        let overlay = create_element(
            "div",
            &[("class", SUBTITLE_OVERLAY_CLASS), ("style", OVERLAY_STYLE)],
        );
        let original = create_element("div", &[("class", SUBTITLE_ORIGINAL_CLASS)]);
        let translated = create_element("div", &[("class", SUBTITLE_TRANSLATED_CLASS)]);
        append_child(&overlay, &original);
        append_child(&overlay, &translated);

        if !insert_after(video, &overlay) {
            tracing::debug!("视频没有父节点，无法插入字幕浮层");
            return None;
        }

        Some(Self {
            cues,
            overlay,
            original,
            translated,
            active: None,
            writes: 0,
        })
    }

    pub fn element(&self) -> &Handle {
        &self.overlay
    }

    pub fn active_cue(&self) -> Option<usize> {
        self.active
    }

    /// 浮层内容被改写的次数
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// 播放时间变化；只有当前字幕切换时才改写浮层，返回是否改写
    pub fn update(&mut self, time: f64) -> bool {
        let active = find_active_cue(&self.cues, time);
        if active == self.active {
            return false;
        }
        self.active = active;

        match active.map(|index| &self.cues[index]) {
            Some(cue) => {
                set_text_content(&self.original, &cue.original_text);
                set_text_content(&self.translated, &cue.text);
            }
            None => {
                set_text_content(&self.original, "");
                set_text_content(&self.translated, "");
            }
        }
        self.writes += 1;
        true
    }

    pub fn cleanup(self) {
        remove_node(&self.overlay);
    }
}

/// 当前视频使用的呈现方式
#[derive(Debug)]
pub enum Presentation {
    Track(TrackPresenter),
    Overlay(OverlayPresenter),
}

impl Presentation {
    pub fn on_time_update(&mut self, time: f64) -> bool {
        match self {
            // 轨道模式由播放器自行切换
            Presentation::Track(_) => false,
            Presentation::Overlay(overlay) => overlay.update(time),
        }
    }

    pub fn cleanup(self) {
        match self {
            Presentation::Track(track) => track.cleanup(),
            Presentation::Overlay(overlay) => overlay.cleanup(),
        }
    }
}
