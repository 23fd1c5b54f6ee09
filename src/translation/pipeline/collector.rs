//! 文本收集器模块
//!
//! 以文档顺序惰性产出可翻译的文本片段，同时收集需要翻译的属性和表单控件文本。

use std::collections::BTreeMap;

use markup5ever_rcdom::{Handle, NodeData};
use serde::{Deserialize, Serialize};

use super::filters::{
    is_editable, is_opted_out, is_skipped_tag, structural_rejection, FilterReason, FilterStats,
    TextFilter,
};
use super::visibility::{VisibilityCache, VisibilityProbe};
use crate::html::{get_node_attr, get_parent_element, text_content};
use crate::translation::config::constants;
use crate::translation::settings::Settings;
use crate::translation::storage::SubstitutionRecords;

/// 一个可翻译的文本片段
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// 文本节点
    pub node: Handle,
    /// 去除首尾空白后的文本
    pub text: String,
    /// 拥有该文本节点的元素
    pub owner: Handle,
    /// 分句器识别出的句子数，未分析时为 1
    pub sentence_count: usize,
}

impl TextUnit {
    /// 获取文本字符数
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_multi_sentence(&self) -> bool {
        self.sentence_count > 1
    }
}

/// 可翻译文本片段的惰性序列
///
/// 序列只能消费一次；可见性缓存随序列创建，随序列丢弃。
pub struct TextUnits<'a> {
    stack: Vec<Handle>,
    filter: &'a TextFilter,
    probe: &'a dyn VisibilityProbe,
    records: &'a SubstitutionRecords,
    visibility: VisibilityCache,
    stats: FilterStats,
}

impl<'a> TextUnits<'a> {
    pub fn new(
        root: &Handle,
        filter: &'a TextFilter,
        probe: &'a dyn VisibilityProbe,
        records: &'a SubstitutionRecords,
    ) -> Self {
        let mut stats = FilterStats::default();
        let start_element = match &root.data {
            NodeData::Element { .. } => Some(root.clone()),
            _ => get_parent_element(root),
        };
        let stack = match start_element.as_ref().and_then(structural_rejection) {
            Some(reason) => {
                tracing::debug!("扫描起点被排除: {:?}", reason);
                stats.record_filter(Some(reason));
                Vec::new()
            }
            None => vec![root.clone()],
        };

        Self {
            stack,
            filter,
            probe,
            records,
            visibility: VisibilityCache::new(),
            stats,
        }
    }

    /// 当前为止的过滤统计
    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    fn push_children(&mut self, node: &Handle) {
        for child in node.children.borrow().iter().rev() {
            self.stack.push(child.clone());
        }
    }

    fn evaluate_text(&mut self, node: &Handle, raw: &str) -> Result<TextUnit, FilterReason> {
        if self.records.is_translated(node) {
            return Err(FilterReason::AlreadyTranslated);
        }
        let owner = get_parent_element(node).ok_or(FilterReason::NoOwner)?;
        if !self.visibility.is_visible(&owner, self.probe) {
            return Err(FilterReason::Hidden);
        }
        if let Some(reason) = self.filter.check(raw) {
            return Err(reason);
        }

        Ok(TextUnit {
            node: node.clone(),
            text: raw.trim().to_string(),
            owner,
            sentence_count: 1,
        })
    }
}

impl<'a> Iterator for TextUnits<'a> {
    type Item = TextUnit;

    fn next(&mut self) -> Option<TextUnit> {
        while let Some(node) = self.stack.pop() {
            match &node.data {
                NodeData::Element { name, .. } => {
                    // 整棵子树继承这些排除条件
                    let tag = name.local.as_ref();
                    if is_skipped_tag(tag) || is_editable(&node) || is_opted_out(&node) {
                        continue;
                    }
                    self.push_children(&node);
                }
                NodeData::Text { contents } => {
                    let raw = contents.borrow().to_string();
                    if raw.trim().is_empty() {
                        continue;
                    }
                    match self.evaluate_text(&node, &raw) {
                        Ok(unit) => {
                            self.stats.record_filter(None);
                            return Some(unit);
                        }
                        Err(reason) => self.stats.record_filter(Some(reason)),
                    }
                }
                NodeData::Document => self.push_children(&node),
                _ => {}
            }
        }
        None
    }
}

/// 属性翻译的目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeTarget {
    /// 元素属性
    Attribute(String),
    /// 元素的文本内容（如 `<option>`）
    Text,
}

impl AttributeTarget {
    /// 原始属性记录中使用的键
    pub fn record_key(&self) -> &str {
        match self {
            AttributeTarget::Attribute(name) => name,
            AttributeTarget::Text => "#text",
        }
    }
}

/// 一个需要翻译的属性或表单控件文本
#[derive(Debug, Clone)]
pub struct AttributeUnit {
    pub element: Handle,
    pub target: AttributeTarget,
    pub text: String,
}

impl AttributeUnit {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 文本收集器
pub struct TextCollector<'a> {
    filter: &'a TextFilter,
    probe: &'a dyn VisibilityProbe,
}

impl<'a> TextCollector<'a> {
    pub fn new(filter: &'a TextFilter, probe: &'a dyn VisibilityProbe) -> Self {
        Self { filter, probe }
    }

    /// 以 `root` 为根的文本片段序列
    pub fn text_units(&self, root: &Handle, records: &'a SubstitutionRecords) -> TextUnits<'a> {
        TextUnits::new(root, self.filter, self.probe, records)
    }

    /// 收集属性与表单控件文本
    ///
    /// 当前值仍是上次写入的译文的属性不会再次收集。
    pub fn attribute_units(&self, root: &Handle, settings: &Settings) -> Vec<AttributeUnit> {
        let mut units = Vec::new();
        if structural_rejection_for_attributes(root) {
            return units;
        }

        let mut stack = vec![root.clone()];
        while let Some(node) = stack.pop() {
            let NodeData::Element { name, .. } = &node.data else {
                if matches!(node.data, NodeData::Document) {
                    stack.extend(node.children.borrow().iter().rev().cloned());
                }
                continue;
            };
            let tag = name.local.as_ref();
            if matches!(tag, "script" | "style" | "noscript" | "template") || is_opted_out(&node) {
                continue;
            }

            let records = read_attribute_records(&node);
            let mut push = |target: AttributeTarget, text: String| {
                // 当前值仍是自己写入的译文时跳过；宿主改过的值需要重新翻译
                let own_translation = records
                    .get(target.record_key())
                    .is_some_and(|record| record.translated == text.trim());
                if own_translation {
                    return;
                }
                if self.filter.should_translate(&text) {
                    units.push(AttributeUnit {
                        element: node.clone(),
                        target,
                        text: text.trim().to_string(),
                    });
                }
            };

            if settings.translate_tooltips {
                if let Some(title) = get_node_attr(&node, "title") {
                    push(AttributeTarget::Attribute("title".to_string()), title);
                }
            }
            if settings.translate_placeholders {
                if let Some(placeholder) = get_node_attr(&node, "placeholder") {
                    push(
                        AttributeTarget::Attribute("placeholder".to_string()),
                        placeholder,
                    );
                }
            }
            if let Some(alt) = get_node_attr(&node, "alt") {
                push(AttributeTarget::Attribute("alt".to_string()), alt);
            }
            if tag == "input" && is_button_input(&node) {
                if let Some(value) = get_node_attr(&node, "value") {
                    push(AttributeTarget::Attribute("value".to_string()), value);
                }
            }
            if tag == "option" {
                push(AttributeTarget::Text, text_content(&node));
            }

            stack.extend(node.children.borrow().iter().rev().cloned());
        }

        units
    }
}

fn structural_rejection_for_attributes(root: &Handle) -> bool {
    let start = match &root.data {
        NodeData::Element { .. } => Some(root.clone()),
        _ => get_parent_element(root),
    };
    start
        .and_then(|element| structural_rejection(&element))
        .is_some_and(|reason| reason == FilterReason::OptedOut)
}

fn is_button_input(element: &Handle) -> bool {
    get_node_attr(element, "type")
        .map(|kind| kind.trim().to_ascii_lowercase())
        .is_some_and(|kind| matches!(kind.as_str(), "button" | "submit" | "reset"))
}

/// 单个属性的翻译记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// 第一次翻译前的值
    pub original: String,
    /// 最近一次写入的译文
    pub translated: String,
}

/// 元素上的属性翻译记录，键为属性名或 `AttributeTarget::Text` 的键
pub type AttributeRecords = BTreeMap<String, AttributeRecord>;

/// 读取元素上的属性翻译记录；记录损坏时视为没有记录
pub fn read_attribute_records(element: &Handle) -> AttributeRecords {
    get_node_attr(element, constants::ORIGINAL_ATTRS_ATTR)
        .and_then(|json| match serde_json::from_str(&json) {
            Ok(records) => Some(records),
            Err(e) => {
                tracing::warn!("原始属性记录无法解析，已忽略: {}", e);
                None
            }
        })
        .unwrap_or_default()
}
