//! 文本过滤器模块
//!
//! 判断文本片段和元素是否可以翻译：文本层面的长度、符号、URL/邮箱检查，
//! 以及元素层面的标签黑名单、可编辑区域和退出翻译标记。

use std::collections::HashMap;
use std::sync::OnceLock;

use markup5ever_rcdom::Handle;
use regex::Regex;

use crate::html::{ancestors, get_node_attr, get_node_name, has_class, is_element};
use crate::translation::config::constants;

/// 正则表达式缓存
#[derive(Default)]
struct RegexCache {
    symbols_regex: OnceLock<Regex>,
    url_or_email_regex: OnceLock<Regex>,
}

/// 过滤原因
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum FilterReason {
    AlreadyTranslated,
    NoOwner,
    SkippedTag,
    Editable,
    OptedOut,
    Hidden,
    TooShort,
    PureSymbols,
    UrlOrEmail,
}

/// 文本过滤器
pub struct TextFilter {
    min_text_length: usize,
    regex_cache: RegexCache,
}

impl Default for TextFilter {
    fn default() -> Self {
        Self::new(constants::MIN_TEXT_LENGTH)
    }
}

impl TextFilter {
    /// 创建新的文本过滤器
    pub fn new(min_text_length: usize) -> Self {
        Self {
            min_text_length,
            regex_cache: RegexCache::default(),
        }
    }

    /// 判断文本是否需要翻译
    pub fn should_translate(&self, text: &str) -> bool {
        self.check(text).is_none()
    }

    /// 返回拒绝原因，可翻译时为 `None`
    pub fn check(&self, text: &str) -> Option<FilterReason> {
        let trimmed = text.trim();

        if trimmed.chars().count() < self.min_text_length {
            return Some(FilterReason::TooShort);
        }

        if self.is_pure_symbols_or_numbers(trimmed) {
            return Some(FilterReason::PureSymbols);
        }

        if self.is_url_or_email(trimmed) {
            return Some(FilterReason::UrlOrEmail);
        }

        None
    }

    /// 纯数字、标点或符号
    pub fn is_pure_symbols_or_numbers(&self, text: &str) -> bool {
        let symbols_regex = self.regex_cache.symbols_regex.get_or_init(|| {
            Regex::new(r"^[\p{N}\p{P}\p{S}\s]+$").unwrap_or_else(|_| Regex::new(r"").unwrap())
        });
        symbols_regex.is_match(text)
    }

    /// 以 URL、`www.` 或邮箱地址开头
    pub fn is_url_or_email(&self, text: &str) -> bool {
        let url_regex = self.regex_cache.url_or_email_regex.get_or_init(|| {
            Regex::new(r"^(https?://|www\.|[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})")
                .unwrap_or_else(|_| Regex::new(r"").unwrap())
        });
        url_regex.is_match(text)
    }
}

/// 标签是否在跳过列表中
pub fn is_skipped_tag(tag: &str) -> bool {
    constants::SKIP_ELEMENTS.contains(&tag)
}

/// 元素自身声明为可编辑
pub fn is_editable(element: &Handle) -> bool {
    match get_node_attr(element, "contenteditable") {
        Some(value) => {
            let value = value.trim().to_ascii_lowercase();
            value.is_empty() || value == "true" || value == "plaintext-only"
        }
        None => false,
    }
}

/// 元素自身带有退出翻译或辅助技术隐藏的标记，或是引擎生成的元素
pub fn is_opted_out(element: &Handle) -> bool {
    if !is_element(element) {
        return false;
    }
    if get_node_attr(element, "aria-hidden").is_some_and(|v| v.trim() == "true") {
        return true;
    }
    if get_node_attr(element, "translate").is_some_and(|v| v.trim().eq_ignore_ascii_case("no")) {
        return true;
    }
    if has_class(element, constants::NO_TRANSLATE_CLASS) {
        return true;
    }
    is_system_element(element)
}

/// 引擎生成的元素
pub fn is_system_element(element: &Handle) -> bool {
    constants::SYSTEM_CLASSES
        .iter()
        .any(|class| has_class(element, class))
}

/// 对某个元素及其祖先链做一次结构检查，供扫描起点使用
pub fn structural_rejection(element: &Handle) -> Option<FilterReason> {
    std::iter::once(element.clone())
        .chain(ancestors(element))
        .filter(is_element)
        .find_map(|node| {
            if get_node_name(&node).is_some_and(is_skipped_tag) {
                Some(FilterReason::SkippedTag)
            } else if is_editable(&node) {
                Some(FilterReason::Editable)
            } else if is_opted_out(&node) {
                Some(FilterReason::OptedOut)
            } else {
                None
            }
        })
}

/// 文本过滤统计
#[derive(Debug, Clone, Default)]
pub struct FilterStats {
    pub total_texts: usize,
    pub translatable_texts: usize,
    pub filtered_out: usize,
    pub by_reason: HashMap<FilterReason, usize>,
}

impl FilterStats {
    /// 记录过滤结果
    pub fn record_filter(&mut self, reason: Option<FilterReason>) {
        self.total_texts += 1;

        match reason {
            None => self.translatable_texts += 1,
            Some(reason) => {
                self.filtered_out += 1;
                *self.by_reason.entry(reason).or_insert(0) += 1;
            }
        }
    }

    pub fn count(&self, reason: FilterReason) -> usize {
        self.by_reason.get(&reason).copied().unwrap_or(0)
    }
}
