//! DOM 替换引擎
//!
//! 把文本节点替换为双语容器（保留原文模式）或单个译文元素（替换模式），
//! 并以替换后的节点为键记录原文，保证之后可以逐字节恢复。
//!
//! ## 保留原文模式
//!
//! ```text
//! <span|div class="ultra-translate-wrapper ultra-translate-inline|block" role="group">
//!   <span class="ultra-translate-original" aria-hidden="true" translate="no">原文</span>
//!   <span class="ultra-translate-separator"> | </span>      仅行内上下文
//!   <span class="ultra-translate-translated" lang="..">译文</span>
//! </span|div>
//! ```
//!
//! ## 替换模式
//!
//! ```text
//! <span class="ultra-translate-translated" title="原文" lang=".." data-original-lang="..">译文</span>
//! ```

use markup5ever_rcdom::Handle;

use super::attributes::restore_attributes;
use crate::html::{
    append_child, create_element, create_text, find_elements, get_node_attr, get_node_name,
    get_parent_element, get_text, has_class, replace_node, set_node_attr,
};
use crate::parsers::style::parse_inline_style;
use crate::translation::config::constants;
use crate::translation::language::{detect_language, is_rtl};
use crate::translation::pipeline::TextUnit;
use crate::translation::settings::Settings;
use crate::translation::storage::SubstitutionRecords;

/// 渲染参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub preserve_original: bool,
    pub target_language: String,
    /// 文档声明的语言，用于源语言推测的兜底
    pub document_lang: Option<String>,
}

impl RenderOptions {
    pub fn from_settings(settings: &Settings, document_lang: Option<String>) -> Self {
        Self {
            preserve_original: settings.preserve_original,
            target_language: settings.target_language.clone(),
            document_lang,
        }
    }
}

/// 没有发生替换的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 译文为空
    EmptyTranslation,
    /// 译文与原文相同
    Unchanged,
    /// 文本节点已经不在文档中
    Detached,
    /// 节点已经处理过
    AlreadyTranslated,
}

/// 恢复结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// 恢复为文本节点的替换数
    pub texts: usize,
    /// 恢复了属性的元素数
    pub attributes: usize,
}

/// 替换引擎
#[derive(Default)]
pub struct SubstitutionEngine {
    records: SubstitutionRecords,
}

impl SubstitutionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &SubstitutionRecords {
        &self.records
    }

    /// 用译文替换一个文本片段，成功时返回替换后的节点
    pub fn apply(
        &mut self,
        unit: &TextUnit,
        translation: &str,
        options: &RenderOptions,
    ) -> Result<Handle, SkipReason> {
        let translation = translation.trim();
        if translation.is_empty() {
            return Err(SkipReason::EmptyTranslation);
        }
        if translation == unit.text {
            return Err(SkipReason::Unchanged);
        }
        if self.records.is_translated(&unit.node) {
            return Err(SkipReason::AlreadyTranslated);
        }
        // 父元素在等待译文期间可能已经变化，以当前状态为准
        let Some(parent) = get_parent_element(&unit.node) else {
            return Err(SkipReason::Detached);
        };
        let original = get_text(&unit.node).unwrap_or_else(|| unit.text.clone());

        let source_lang = detect_language(&original, options.document_lang.as_deref());
        let inline = get_node_name(&parent)
            .is_some_and(|tag| constants::INLINE_ELEMENTS.contains(&tag));

        let replacement = if options.preserve_original {
            build_wrapper(&original, translation, &source_lang, options, inline)
        } else {
            build_translated(&original, translation, &source_lang, options)
        };

        if !replace_node(&unit.node, &replacement) {
            return Err(SkipReason::Detached);
        }

        self.records.record_original(&replacement, original);
        self.records.mark_translated(&unit.node);
        Ok(replacement)
    }

    /// 恢复 `root` 下的所有替换与属性
    ///
    /// 恢复后会清空整个文档的已处理集合，而不只是 `root` 之下的部分。
    pub fn restore(&mut self, root: &Handle) -> RestoreReport {
        let mut report = RestoreReport::default();

        for element in find_elements(root, is_substitution) {
            let Some(original) = self.records.original_of(&element).map(str::to_string) else {
                continue;
            };
            if replace_node(&element, &create_text(&original)) {
                self.records.take_original(&element);
                report.texts += 1;
            }
        }

        report.attributes = restore_attributes(root);
        self.records.clear_marks();
        self.records.prune();

        tracing::info!(
            "已恢复 {} 处文本替换和 {} 个元素的属性",
            report.texts,
            report.attributes
        );
        report
    }

    /// 切换保留原文模式下原文的显示，返回受影响的元素数
    pub fn toggle_original_visibility(&self, root: &Handle) -> usize {
        let originals = find_elements(root, |e| has_class(e, constants::ORIGINAL_CLASS));
        for element in &originals {
            let hidden = get_node_attr(element, "style")
                .map(|style| {
                    parse_inline_style(&style)
                        .get("display")
                        .is_some_and(|value| value.iter().any(|v| v.is_keyword("none")))
                })
                .unwrap_or(false);
            let style = if hidden { None } else { Some("display: none".to_string()) };
            set_node_attr(element, "style", style);
        }
        originals.len()
    }
}

/// 是否为引擎生成的替换节点
pub fn is_substitution(element: &Handle) -> bool {
    has_class(element, constants::WRAPPER_CLASS) || has_class(element, constants::TRANSLATED_CLASS)
}

/// `root` 下是否存在替换节点
pub fn has_substitutions(root: &Handle) -> bool {
    !find_elements(root, is_substitution).is_empty()
}

fn build_wrapper(
    original: &str,
    translation: &str,
    source_lang: &str,
    options: &RenderOptions,
    inline: bool,
) -> Handle {
    let layout_class = if inline {
        "ultra-translate-inline"
    } else {
        "ultra-translate-block"
    };
    let class = format!("{} {}", constants::WRAPPER_CLASS, layout_class);
    let wrapper = create_element(
        if inline { "span" } else { "div" },
        &[
            ("class", class.as_str()),
            ("role", "group"),
            ("aria-label", "Translation"),
        ],
    );

    let original_span = create_element(
        "span",
        &[
            ("class", constants::ORIGINAL_CLASS),
            ("title", "Original text"),
            ("lang", source_lang),
            ("aria-hidden", "true"),
            ("translate", "no"),
        ],
    );
    append_child(&original_span, &create_text(original));
    append_child(&wrapper, &original_span);

    if inline {
        let separator = create_element(
            "span",
            &[("class", constants::SEPARATOR_CLASS), ("aria-hidden", "true")],
        );
        append_child(&separator, &create_text(" | "));
        append_child(&wrapper, &separator);
    }

    let mut attrs = vec![
        ("class", constants::TRANSLATED_CLASS),
        ("title", "Translated text"),
        ("lang", options.target_language.as_str()),
        ("aria-live", "polite"),
    ];
    if is_rtl(&options.target_language) {
        attrs.push(("dir", "rtl"));
    }
    let translated_span = create_element("span", &attrs);
    append_child(&translated_span, &create_text(translation));
    append_child(&wrapper, &translated_span);

    wrapper
}

fn build_translated(
    original: &str,
    translation: &str,
    source_lang: &str,
    options: &RenderOptions,
) -> Handle {
    let mut attrs = vec![
        ("class", constants::TRANSLATED_CLASS),
        ("title", original),
        ("lang", options.target_language.as_str()),
        ("data-original-lang", source_lang),
    ];
    if is_rtl(&options.target_language) {
        attrs.push(("dir", "rtl"));
    }
    let span = create_element("span", &attrs);
    append_child(&span, &create_text(translation));
    span
}
