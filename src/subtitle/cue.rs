//! 字幕条目与格式识别

use serde::{Deserialize, Serialize};

use crate::parsers::srt::parse_srt;
use crate::parsers::vtt::{parse_vtt, VTT_HEADER};

/// 一条字幕
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleCue {
    /// 开始时间（秒）
    pub start_time: f64,
    /// 结束时间（秒），不小于开始时间
    pub end_time: f64,
    pub text: String,
}

impl SubtitleCue {
    pub fn new(start_time: f64, end_time: f64, text: impl Into<String>) -> Self {
        Self {
            start_time,
            end_time,
            text: text.into(),
        }
    }

    pub fn contains(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }
}

/// 翻译后的字幕，与输入一一对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedCue {
    pub start_time: f64,
    pub end_time: f64,
    /// 译文；翻译失败时与原文相同
    pub text: String,
    pub original_text: String,
}

impl TranslatedCue {
    /// 以原文作为译文
    pub fn untranslated(cue: &SubtitleCue) -> Self {
        Self {
            start_time: cue.start_time,
            end_time: cue.end_time,
            text: cue.text.clone(),
            original_text: cue.text.clone(),
        }
    }

    pub fn is_translated(&self) -> bool {
        self.text != self.original_text
    }

    /// 双语文本：译文在上、原文在下，两者相同时只保留一行
    pub fn bilingual_text(&self) -> String {
        if self.is_translated() {
            format!("{}\n{}", self.text, self.original_text)
        } else {
            self.text.clone()
        }
    }

    pub fn to_cue(&self, text: String) -> SubtitleCue {
        SubtitleCue {
            start_time: self.start_time,
            end_time: self.end_time,
            text,
        }
    }
}

/// 字幕格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionFormat {
    Vtt,
    Srt,
}

impl CaptionFormat {
    /// 按内容识别格式：有 `WEBVTT` 文件头的是 WebVTT，其余按 SRT 处理
    pub fn sniff(content: &str) -> Self {
        if content
            .trim_start_matches('\u{feff}')
            .trim_start()
            .starts_with(VTT_HEADER)
        {
            CaptionFormat::Vtt
        } else {
            CaptionFormat::Srt
        }
    }

    pub fn parse(self, content: &str) -> Vec<SubtitleCue> {
        match self {
            CaptionFormat::Vtt => parse_vtt(content),
            CaptionFormat::Srt => parse_srt(content),
        }
    }
}

/// 识别格式并解析
pub fn parse_captions(content: &str) -> Vec<SubtitleCue> {
    let format = CaptionFormat::sniff(content);
    let cues = format.parse(content);
    tracing::debug!("解析 {:?} 字幕: {} 条", format, cues.len());
    cues
}

/// 查找包含 `time` 的字幕下标
///
/// 要求字幕按开始时间排序；多条重叠时返回仍在显示的、最后开始的一条。
/// 较早开始的长字幕可能跨过后面的短字幕，所以从已开始的字幕中向前查找。
pub fn find_active_cue<T: CueTiming>(cues: &[T], time: f64) -> Option<usize> {
    let started = cues.partition_point(|cue| cue.start() <= time);
    cues[..started].iter().rposition(|cue| time <= cue.end())
}

/// 带时间区间的条目
pub trait CueTiming {
    fn start(&self) -> f64;
    fn end(&self) -> f64;
}

impl CueTiming for SubtitleCue {
    fn start(&self) -> f64 {
        self.start_time
    }
    fn end(&self) -> f64 {
        self.end_time
    }
}

impl CueTiming for TranslatedCue {
    fn start(&self) -> f64 {
        self.start_time
    }
    fn end(&self) -> f64 {
        self.end_time
    }
}
