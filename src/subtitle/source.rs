//! 字幕来源
//!
//! 优先使用字幕轨道上已经加载的条目；没有时抓取轨道的外部资源，再按内容识别格式解析。

use std::collections::HashMap;
use std::future::Future;

use markup5ever_rcdom::Handle;

use super::cue::{parse_captions, SubtitleCue};
use crate::html::{find_elements, get_node_attr, get_node_name, has_class};
use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::language::primary_subtag;
use crate::translation::storage::IdentityMap;
use crate::utils::{parse_data_url, Url};

/// 字幕来源
pub trait CaptionSource {
    /// 轨道上已经加载好的字幕
    fn loaded_cues(&self, _track: &Handle) -> Option<Vec<SubtitleCue>> {
        None
    }

    /// 抓取字幕资源的原始内容
    fn fetch(&self, url: &str) -> impl Future<Output = TranslationResult<String>>;
}

/// `<track>` 元素的描述
#[derive(Debug, Clone)]
pub struct TrackInfo {
    pub element: Handle,
    pub kind: String,
    pub srclang: Option<String>,
    pub label: Option<String>,
    pub src: Option<String>,
    pub is_default: bool,
}

impl TrackInfo {
    pub fn from_element(element: &Handle) -> Self {
        Self {
            element: element.clone(),
            kind: get_node_attr(element, "kind")
                .map(|kind| kind.trim().to_ascii_lowercase())
                .filter(|kind| !kind.is_empty())
                .unwrap_or_else(|| "subtitles".to_string()),
            srclang: get_node_attr(element, "srclang").filter(|lang| !lang.trim().is_empty()),
            label: get_node_attr(element, "label"),
            src: get_node_attr(element, "src").filter(|src| !src.trim().is_empty()),
            is_default: get_node_attr(element, "default").is_some(),
        }
    }

    /// 字幕类轨道（排除 descriptions、chapters、metadata）
    pub fn is_caption(&self) -> bool {
        matches!(self.kind.as_str(), "subtitles" | "captions")
    }

    /// 轨道语言与目标语言的主子标签相同
    pub fn matches_language(&self, target: &str) -> bool {
        self.srclang
            .as_deref()
            .is_some_and(|lang| primary_subtag(lang) == primary_subtag(target))
    }

    /// 自动生成的字幕
    pub fn is_auto_generated(&self) -> bool {
        self.kind == "captions"
            || self
                .label
                .as_deref()
                .is_some_and(|label| label.to_lowercase().contains("auto"))
    }
}

/// 视频元素下的字幕轨道（不含引擎注入的轨道）
pub fn discover_tracks(video: &Handle) -> Vec<TrackInfo> {
    find_elements(video, |element| {
        get_node_name(element) == Some("track")
            && get_node_attr(element, constants::INJECTED_TRACK_ATTR).is_none()
            && !has_class(element, constants::NO_TRANSLATE_CLASS)
    })
    .iter()
    .map(TrackInfo::from_element)
    .filter(TrackInfo::is_caption)
    .collect()
}

/// 加载轨道的字幕条目；抓取失败视为没有字幕
pub async fn load_cues<S: CaptionSource>(source: &S, track: &TrackInfo) -> Vec<SubtitleCue> {
    if let Some(cues) = source.loaded_cues(&track.element) {
        if !cues.is_empty() {
            return cues;
        }
    }

    let Some(src) = &track.src else {
        tracing::debug!("字幕轨道没有 src，跳过");
        return Vec::new();
    };

    match source.fetch(src).await {
        Ok(content) => parse_captions(&content),
        Err(e) => {
            let e = e.with_context(format!("字幕轨道 {}", src));
            tracing::warn!(category = ?e.category(), "字幕抓取失败: {}", e);
            Vec::new()
        }
    }
}

/// 内存中的字幕来源
///
/// 宿主可以把已经解码的字幕挂在轨道上，或按地址预置字幕内容。
#[derive(Default)]
pub struct MemoryCaptionSource {
    loaded: IdentityMap<Vec<SubtitleCue>>,
    payloads: HashMap<String, String>,
}

impl MemoryCaptionSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_cues(&mut self, track: &Handle, cues: Vec<SubtitleCue>) {
        self.loaded.insert(track, cues);
    }

    pub fn insert_payload(&mut self, url: impl Into<String>, content: impl Into<String>) {
        self.payloads.insert(url.into(), content.into());
    }
}

impl CaptionSource for MemoryCaptionSource {
    fn loaded_cues(&self, track: &Handle) -> Option<Vec<SubtitleCue>> {
        self.loaded.get(track).cloned()
    }

    async fn fetch(&self, url: &str) -> TranslationResult<String> {
        if let Some((_, data)) = parse_data_url(url) {
            return Ok(String::from_utf8_lossy(&data).into_owned());
        }
        self.payloads
            .get(url)
            .cloned()
            .ok_or_else(|| TranslationError::FetchError(format!("没有预置的字幕内容: {}", url)))
    }
}

/// 通过 HTTP 抓取字幕，相对地址按页面地址解析
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpCaptionSource {
    client: reqwest::Client,
    base_url: Option<Url>,
}

#[cfg(feature = "http")]
impl HttpCaptionSource {
    pub fn new(base_url: Option<Url>, timeout: std::time::Duration) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ultra-translate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, base_url })
    }
}

#[cfg(feature = "http")]
impl CaptionSource for HttpCaptionSource {
    async fn fetch(&self, url: &str) -> TranslationResult<String> {
        if let Some((_, data)) = parse_data_url(url) {
            return Ok(String::from_utf8_lossy(&data).into_owned());
        }

        let resolved = crate::utils::resolve_url(self.base_url.as_ref(), url)?;
        let response = self
            .client
            .get(resolved.as_str())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| TranslationError::FetchError(format!("{}: {}", resolved, e)))?;
        response
            .text()
            .await
            .map_err(|e| TranslationError::FetchError(format!("{}: {}", resolved, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{find_nodes, html_to_dom};

    #[test]
    fn discovers_caption_tracks_only() {
        let dom = html_to_dom(
            b"<html><body><video>\
              <track kind=\"subtitles\" srclang=\"en-US\" label=\"English\" src=\"en.vtt\" default>\
              <track kind=\"chapters\" srclang=\"en\" src=\"chapters.vtt\">\
              <track srclang=\"fr\" label=\"French (auto-generated)\" src=\"fr.vtt\">\
              </video></body></html>",
            "utf-8".to_string(),
        );
        let video = find_nodes(&dom.document, vec!["video"]).remove(0);
        let tracks = discover_tracks(&video);

        assert_eq!(tracks.len(), 2);
        assert!(tracks[0].is_default);
        assert!(tracks[0].matches_language("en"));
        assert!(!tracks[0].is_auto_generated());
        assert_eq!(tracks[1].kind, "subtitles");
        assert!(tracks[1].is_auto_generated());
    }

    #[tokio::test]
    async fn loaded_cues_win_over_fetching() {
        let dom = html_to_dom(
            b"<html><body><video><track src=\"missing.vtt\"></video></body></html>",
            "utf-8".to_string(),
        );
        let video = find_nodes(&dom.document, vec!["video"]).remove(0);
        let track = discover_tracks(&video).remove(0);

        let mut source = MemoryCaptionSource::new();
        assert!(load_cues(&source, &track).await.is_empty());

        source.attach_cues(&track.element, vec![SubtitleCue::new(0.0, 1.0, "Hi")]);
        assert_eq!(load_cues(&source, &track).await.len(), 1);
    }

    #[tokio::test]
    async fn data_urls_are_decoded_without_network() {
        let source = MemoryCaptionSource::new();
        let url = crate::utils::create_data_url("text/vtt", "utf-8", b"WEBVTT\n\n00:01.000 --> 00:02.000\nHi\n");
        let content = source.fetch(&url).await.unwrap();
        assert!(content.starts_with("WEBVTT"));
    }
}
