//! 控制消息与快捷键
//!
//! 宿主通过 JSON 控制消息驱动页面翻译会话和字幕引擎。两者共享同一个翻译后端。

use std::rc::Rc;

use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::subtitle::{CaptionSource, SubtitleEngine, VideoOutcome};
use crate::translation::config::EngineConfig;
use crate::translation::core::{
    watch, MutationRecord, PassReport, RestoreReport, ToggleOutcome, TranslationBackend,
    TranslationSession, WatchStats,
};
use crate::translation::error::TranslationResult;
use crate::translation::settings::Settings;

/// 控制消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    /// 立即翻译整页，可同时携带新设置
    TranslatePage {
        #[serde(default)]
        settings: Option<Settings>,
    },
    StopTranslation,
    UpdateSettings {
        settings: Settings,
    },
    ToggleTranslation,
    RestoreOriginal,
    UpdateVideoSettings {
        settings: Settings,
    },
    /// 切换原文显示（快捷键）
    ToggleOriginal,
}

impl ControlMessage {
    pub fn from_json(json: &str) -> TranslationResult<Self> {
        let message: ControlMessage = serde_json::from_str(json)?;
        match &message {
            ControlMessage::TranslatePage {
                settings: Some(settings),
            }
            | ControlMessage::UpdateSettings { settings }
            | ControlMessage::UpdateVideoSettings { settings } => settings.validate()?,
            _ => {}
        }
        Ok(message)
    }
}

/// 控制消息的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum ControlReply {
    /// `None` 表示已有翻译过程在运行
    Translated(Option<PassReport>),
    Stopped { was_running: bool },
    SettingsUpdated,
    Toggled(ToggleOutcome),
    Restored(RestoreReport),
    VideosProcessed(Vec<VideoOutcome>),
    OriginalToggled { elements: usize },
}

/// 按键事件
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyEvent {
    pub key: String,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub shift_key: bool,
    pub meta_key: bool,
}

impl KeyEvent {
    pub fn alt(key: &str) -> Self {
        Self {
            key: key.to_string(),
            alt_key: true,
            ..Self::default()
        }
    }
}

/// 快捷键映射：Alt+T 切换翻译，Alt+O 切换原文显示
pub fn shortcut_command(event: &KeyEvent) -> Option<ControlMessage> {
    if !event.alt_key || event.ctrl_key || event.meta_key {
        return None;
    }
    match event.key.to_ascii_lowercase().as_str() {
        "t" => Some(ControlMessage::ToggleTranslation),
        "o" => Some(ControlMessage::ToggleOriginal),
        _ => None,
    }
}

/// 页面控制器
pub struct Controller<B, S> {
    session: TranslationSession<Rc<B>>,
    subtitles: SubtitleEngine<Rc<B>, S>,
}

impl<B: TranslationBackend, S: CaptionSource> Controller<B, S> {
    pub fn new(
        document: Handle,
        backend: B,
        source: S,
        config: EngineConfig,
        settings: Settings,
    ) -> Self {
        let backend = Rc::new(backend);
        let subtitles = SubtitleEngine::new(backend.clone(), source, &config, settings.clone());
        let session = TranslationSession::new(document, backend, config, settings);
        Self { session, subtitles }
    }

    /// 设置当前页面地址，用于排除站点匹配
    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.session = self.session.with_page_url(url);
        self
    }

    pub fn session(&self) -> &TranslationSession<Rc<B>> {
        &self.session
    }

    pub fn subtitles(&self) -> &SubtitleEngine<Rc<B>, S> {
        &self.subtitles
    }

    /// 页面加载完成：按设置自动翻译并处理视频字幕
    pub async fn on_page_load(&self) -> Option<PassReport> {
        let videos = self.subtitles.process_all(self.session.document()).await;
        tracing::debug!("页面加载时处理视频: {} 个", videos.len());
        self.session.auto_translate().await
    }

    /// 监听页面变更，直到发送端关闭
    pub async fn watch(&self, receiver: mpsc::UnboundedReceiver<Vec<MutationRecord>>) -> WatchStats {
        watch(&self.session, receiver).await
    }

    /// 处理 JSON 控制消息
    pub async fn handle_json(&self, json: &str) -> TranslationResult<ControlReply> {
        let message = ControlMessage::from_json(json)?;
        Ok(self.handle(message).await)
    }

    /// 处理按键；不是快捷键时返回 `None`
    pub async fn handle_key(&self, event: &KeyEvent) -> Option<ControlReply> {
        let command = shortcut_command(event)?;
        Some(self.handle(command).await)
    }

    pub async fn handle(&self, message: ControlMessage) -> ControlReply {
        tracing::debug!("收到控制消息: {:?}", message);
        match message {
            ControlMessage::TranslatePage { settings } => {
                if let Some(settings) = settings {
                    self.session.update_settings(settings);
                }
                ControlReply::Translated(self.session.translate_page().await)
            }
            ControlMessage::StopTranslation => ControlReply::Stopped {
                was_running: self.session.stop(),
            },
            ControlMessage::UpdateSettings { settings } => {
                self.session.update_settings(settings.clone());
                self.subtitles.update_settings(settings);
                ControlReply::SettingsUpdated
            }
            ControlMessage::ToggleTranslation => ControlReply::Toggled(self.session.toggle().await),
            ControlMessage::RestoreOriginal => ControlReply::Restored(self.session.restore()),
            ControlMessage::UpdateVideoSettings { settings } => {
                self.subtitles.update_settings(settings);
                let outcomes = self.subtitles.process_all(self.session.document()).await;
                ControlReply::VideosProcessed(outcomes)
            }
            ControlMessage::ToggleOriginal => ControlReply::OriginalToggled {
                elements: self.session.toggle_original_visibility(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_messages_by_action() {
        let message = ControlMessage::from_json(r#"{"action":"stopTranslation"}"#).unwrap();
        assert_eq!(message, ControlMessage::StopTranslation);

        let message = ControlMessage::from_json(r#"{"action":"translatePage"}"#).unwrap();
        assert_eq!(message, ControlMessage::TranslatePage { settings: None });

        let message = ControlMessage::from_json(
            r#"{"action":"updateVideoSettings","settings":{"subtitleMode":"translate"}}"#,
        )
        .unwrap();
        let ControlMessage::UpdateVideoSettings { settings } = message else {
            panic!("unexpected message");
        };
        assert_eq!(settings.target_language, "zh-CN");
    }

    #[test]
    fn rejects_unknown_actions_and_invalid_settings() {
        assert!(ControlMessage::from_json(r#"{"action":"selfDestruct"}"#).is_err());
        assert!(ControlMessage::from_json(
            r#"{"action":"updateSettings","settings":{"targetLanguage":" "}}"#
        )
        .is_err());
    }

    #[test]
    fn maps_alt_shortcuts() {
        assert_eq!(
            shortcut_command(&KeyEvent::alt("T")),
            Some(ControlMessage::ToggleTranslation)
        );
        assert_eq!(
            shortcut_command(&KeyEvent::alt("o")),
            Some(ControlMessage::ToggleOriginal)
        );
        assert_eq!(shortcut_command(&KeyEvent::alt("x")), None);

        let plain = KeyEvent {
            key: "t".to_string(),
            ..KeyEvent::default()
        };
        assert_eq!(shortcut_command(&plain), None);

        let with_ctrl = KeyEvent {
            ctrl_key: true,
            ..KeyEvent::alt("t")
        };
        assert_eq!(shortcut_command(&with_ctrl), None);
    }
}
