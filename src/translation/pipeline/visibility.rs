//! 元素可见性判断
//!
//! rcdom 树没有布局信息，默认实现根据 `hidden` 属性、浏览器默认隐藏的元素以及
//! 内联样式推断可见性。拥有真实布局的宿主可以实现 [`VisibilityProbe`] 替换它。

use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::html::{get_node_attr, get_node_name, get_parent_element};
use crate::parsers::style::parse_inline_style;

/// 浏览器默认不渲染的元素
const UNRENDERED_ELEMENTS: &[&str] = &[
    "head", "title", "meta", "link", "base", "template", "script", "style", "datalist",
];

/// 元素自身可见性探针（不考虑祖先）
pub trait VisibilityProbe {
    fn is_hidden(&self, element: &Handle) -> bool;
}

/// 基于属性与内联样式的默认探针
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStyleProbe;

impl VisibilityProbe for InlineStyleProbe {
    fn is_hidden(&self, element: &Handle) -> bool {
        if get_node_name(element).is_some_and(|name| UNRENDERED_ELEMENTS.contains(&name)) {
            return true;
        }
        if get_node_attr(element, "hidden").is_some() {
            return true;
        }
        get_node_attr(element, "style")
            .map(|style| parse_inline_style(&style).hides_element())
            .unwrap_or(false)
    }
}

/// 单次扫描内的可见性缓存
///
/// 以元素身份为键，只在一次扫描期间有效，新的扫描必须使用新的缓存。
#[derive(Debug, Default)]
pub struct VisibilityCache {
    entries: HashMap<usize, bool>,
}

impl VisibilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 元素及其所有祖先都未被隐藏
    pub fn is_visible(&mut self, element: &Handle, probe: &dyn VisibilityProbe) -> bool {
        let key = Rc::as_ptr(element) as usize;
        if let Some(visible) = self.entries.get(&key) {
            return *visible;
        }

        let visible = !probe.is_hidden(element)
            && match get_parent_element(element) {
                Some(parent) => self.is_visible(&parent, probe),
                None => true,
            };

        self.entries.insert(key, visible);
        visible
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
