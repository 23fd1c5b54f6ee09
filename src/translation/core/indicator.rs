//! 翻译进度指示器
//!
//! 翻译过程中在 `<body>` 末尾插入一个带本地化标题和百分比的提示框。

use markup5ever_rcdom::Handle;

use crate::html::{append_child, create_element, create_text, remove_node, set_node_attr, set_text_content};
use crate::translation::config::constants::LOADING_CLASS;

/// 界面语言 → 提示文字
const LOADING_TEXTS: &[(&str, &str)] = &[
    ("en", "Translating..."),
    ("zh-CN", "正在翻译..."),
    ("zh-TW", "正在翻譯..."),
    ("ja", "翻訳中..."),
    ("ko", "번역 중..."),
    ("es", "Traduciendo..."),
    ("fr", "Traduction..."),
    ("de", "Übersetzen..."),
    ("ru", "Перевод..."),
    ("ar", "جارٍ الترجمة..."),
];

/// 按界面语言取提示文字，未知语言使用英文
pub fn loading_text(interface_language: &str) -> &'static str {
    LOADING_TEXTS
        .iter()
        .find(|(lang, _)| *lang == interface_language)
        .or_else(|| LOADING_TEXTS.first())
        .map(|(_, text)| *text)
        .unwrap_or("Translating...")
}

/// 进度百分比（四舍五入）
pub fn percent(current: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    ((current.min(total) as f64 / total as f64) * 100.0).round() as usize
}

struct Parts {
    root: Handle,
    progress: Handle,
    fill: Handle,
}

/// 进度指示器
#[derive(Default)]
pub struct LoadingIndicator {
    parts: Option<Parts>,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.parts.is_some()
    }

    pub fn element(&self) -> Option<&Handle> {
        self.parts.as_ref().map(|parts| &parts.root)
    }

    /// 插入指示器，已经存在时不做任何事
    pub fn show(&mut self, body: &Handle, interface_language: &str) {
        if self.parts.is_some() {
            return;
        }

        let root = create_element("div", &[("class", LOADING_CLASS)]);
        let content = create_element("div", &[("class", "ultra-translate-loading-content")]);
        let spinner = create_element("div", &[("class", "ultra-translate-spinner")]);
        let text = create_element("div", &[("class", "ultra-translate-loading-text")]);
        let title = create_element("span", &[("class", "ultra-translate-loading-title")]);
        append_child(&title, &create_text(loading_text(interface_language)));
        let progress = create_element("span", &[("class", "ultra-translate-loading-progress")]);
        append_child(&progress, &create_text("0%"));
        let bar = create_element("div", &[("class", "ultra-translate-loading-bar")]);
        let fill = create_element(
            "div",
            &[("class", "ultra-translate-loading-bar-fill"), ("style", "width: 0%")],
        );

        append_child(&text, &title);
        append_child(&text, &progress);
        append_child(&bar, &fill);
        append_child(&content, &spinner);
        append_child(&content, &text);
        append_child(&content, &bar);
        append_child(&root, &content);
        append_child(body, &root);

        self.parts = Some(Parts { root, progress, fill });
    }

    /// 更新进度
    pub fn update(&self, current: usize, total: usize) {
        let Some(parts) = &self.parts else {
            return;
        };
        let value = percent(current, total);
        set_text_content(&parts.progress, &format!("{}%", value));
        set_node_attr(&parts.fill, "style", Some(format!("width: {}%", value)));
    }

    /// 移除指示器
    pub fn remove(&mut self) {
        if let Some(parts) = self.parts.take() {
            remove_node(&parts.root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{find_elements, get_node_attr, has_class, text_content};

    #[test]
    fn localized_titles_fall_back_to_english() {
        assert_eq!(loading_text("zh-CN"), "正在翻译...");
        assert_eq!(loading_text("de"), "Übersetzen...");
        assert_eq!(loading_text("pt-BR"), "Translating...");
    }

    #[test]
    fn shows_updates_and_removes() {
        let body = create_element("body", &[]);
        let mut indicator = LoadingIndicator::new();
        indicator.show(&body, "ja");
        indicator.show(&body, "ja");
        assert_eq!(body.children.borrow().len(), 1);
        assert!(text_content(&body).contains("翻訳中..."));

        indicator.update(1, 3);
        let progress = find_elements(&body, |e| has_class(e, "ultra-translate-loading-progress"));
        assert_eq!(text_content(&progress[0]), "33%");
        let fill = find_elements(&body, |e| has_class(e, "ultra-translate-loading-bar-fill"));
        assert_eq!(get_node_attr(&fill[0], "style").as_deref(), Some("width: 33%"));

        indicator.remove();
        assert!(!indicator.is_visible());
        assert!(body.children.borrow().is_empty());
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 3), 100);
    }
}
