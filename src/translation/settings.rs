//! 外部设置对象
//!
//! 设置由宿主持有并通过控制消息下发，引擎只读。字段名沿用宿主存储使用的 camelCase。

use serde::{Deserialize, Serialize};

use crate::translation::error::{TranslationError, TranslationResult};

/// 字幕处理模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleMode {
    #[default]
    Off,
    Translate,
    /// 优先使用自动生成的字幕轨道
    Asr,
}

/// 双语字幕呈现方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BilingualMode {
    Track,
    #[default]
    Overlay,
}

/// 翻译设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub translation_api: String,
    pub target_language: String,
    pub interface_language: String,
    pub preserve_original: bool,
    pub auto_translate: bool,
    /// 按行分隔的站点片段，命中当前 URL 的页面不自动翻译
    pub excluded_sites: String,
    pub subtitle_mode: SubtitleMode,
    pub bilingual_mode: BilingualMode,
    pub translate_tooltips: bool,
    pub translate_placeholders: bool,
    /// 波次间隔（毫秒），覆盖引擎默认值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation_delay: Option<u64>,
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            translation_api: "google".to_string(),
            target_language: "zh-CN".to_string(),
            interface_language: "en".to_string(),
            preserve_original: true,
            auto_translate: false,
            excluded_sites: String::new(),
            subtitle_mode: SubtitleMode::Off,
            bilingual_mode: BilingualMode::Overlay,
            translate_tooltips: true,
            translate_placeholders: true,
            translation_delay: None,
            debug_mode: false,
        }
    }
}

impl Settings {
    /// 从宿主下发的 JSON 解码
    pub fn from_json(json: &str) -> TranslationResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> TranslationResult<()> {
        if self.target_language.trim().is_empty() {
            return Err(TranslationError::InvalidInput("目标语言不能为空".to_string()));
        }
        Ok(())
    }

    /// 目标语言的两字母前缀（小写）
    pub fn target_prefix(&self) -> String {
        self.target_language
            .to_lowercase()
            .chars()
            .take(2)
            .collect()
    }

    /// 非空的排除站点片段
    pub fn excluded_patterns(&self) -> impl Iterator<Item = &str> {
        self.excluded_sites
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings = Settings::from_json(r#"{"targetLanguage":"ja"}"#).unwrap();
        assert_eq!(settings.target_language, "ja");
        assert_eq!(settings.translation_api, "google");
        assert!(settings.preserve_original);
        assert!(settings.translate_tooltips);
        assert_eq!(settings.subtitle_mode, SubtitleMode::Off);
    }

    #[test]
    fn camel_case_fields_and_modes_decode() {
        let settings = Settings::from_json(
            r#"{"preserveOriginal":false,"subtitleMode":"asr","bilingualMode":"track","translationDelay":10}"#,
        )
        .unwrap();
        assert!(!settings.preserve_original);
        assert_eq!(settings.subtitle_mode, SubtitleMode::Asr);
        assert_eq!(settings.bilingual_mode, BilingualMode::Track);
        assert_eq!(settings.translation_delay, Some(10));
    }

    #[test]
    fn blank_target_is_rejected() {
        assert!(Settings::from_json(r#"{"targetLanguage":"  "}"#).is_err());
    }

    #[test]
    fn excluded_patterns_skip_blank_lines() {
        let settings = Settings {
            excluded_sites: "example.com\n\n  intranet \n".to_string(),
            ..Settings::default()
        };
        let patterns: Vec<&str> = settings.excluded_patterns().collect();
        assert_eq!(patterns, vec!["example.com", "intranet"]);
    }
}
