//! 批次管理模块
//!
//! 先按结构上下文分组，再在组内按条数和字符数上限切分批次。

use std::collections::HashMap;

use markup5ever_rcdom::Handle;

use super::collector::TextUnit;
use super::segmenter::SentenceSegmenter;
use crate::html::{get_classes, get_node_attr, get_node_name, get_parent_element};
use crate::translation::config::EngineConfig;

/// 批次上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    pub max_units: usize,
    pub max_chars: usize,
}

impl BatchLimits {
    pub fn new(max_units: usize, max_chars: usize) -> Self {
        Self {
            max_units: max_units.max(1),
            max_chars: max_chars.max(1),
        }
    }

    /// 页面文本批次：不同 API 家族的条数上限不同
    pub fn for_api(api: &str, config: &EngineConfig) -> Self {
        Self::new(config.batch_size_for(api), config.max_batch_chars)
    }

    /// 字幕批次
    pub fn for_cues(config: &EngineConfig) -> Self {
        Self::new(config.cue_batch_size, config.cue_batch_chars)
    }
}

/// 按上限切分有序序列
///
/// 当前批次已满，或加入下一项会超出字符上限且当前批次非空时，开启新批次。
/// 单个超长项独占一个批次。
pub fn chunk_by_limits<T, F>(items: impl IntoIterator<Item = T>, limits: BatchLimits, len_of: F) -> Vec<Vec<T>>
where
    F: Fn(&T) -> usize,
{
    let mut chunks = Vec::new();
    let mut current: Vec<T> = Vec::new();
    let mut current_chars = 0;

    for item in items {
        let len = len_of(&item);
        if current.len() >= limits.max_units
            || (current_chars + len > limits.max_chars && !current.is_empty())
        {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }
        current_chars += len;
        current.push(item);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// 结构上下文键：`父元素标签>标签#id.首个class`
pub fn context_key(owner: &Handle) -> String {
    let Some(tag) = get_node_name(owner) else {
        return "none".to_string();
    };
    let parent_tag = get_parent_element(owner)
        .and_then(|parent| get_node_name(&parent).map(str::to_string))
        .unwrap_or_default();
    let id = get_node_attr(owner, "id")
        .filter(|id| !id.trim().is_empty())
        .map(|id| format!("#{}", id.trim()))
        .unwrap_or_default();
    let class = get_classes(owner)
        .into_iter()
        .next()
        .map(|class| format!(".{}", class))
        .unwrap_or_default();

    format!("{}>{}{}{}", parent_tag, tag, id, class)
}

/// 共享同一结构上下文的文本片段
#[derive(Debug, Clone)]
pub struct ContextGroup {
    pub key: String,
    pub units: Vec<TextUnit>,
}

/// 按上下文分组，组的顺序为首次出现的顺序
pub fn group_by_context(units: impl IntoIterator<Item = TextUnit>) -> Vec<ContextGroup> {
    let mut groups: Vec<ContextGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for unit in units {
        let key = context_key(&unit.owner);
        match index.get(&key) {
            Some(&position) => groups[position].units.push(unit),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(ContextGroup {
                    key,
                    units: vec![unit],
                });
            }
        }
    }

    groups
}

/// 一次请求发送的文本批次
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: usize,
    pub context: String,
    pub units: Vec<TextUnit>,
    pub char_count: usize,
}

impl Batch {
    /// 请求中的文本，顺序与 `units` 一致
    pub fn texts(&self) -> Vec<String> {
        self.units.iter().map(|unit| unit.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 批次摘要
    pub fn summary(&self) -> String {
        format!(
            "Batch[{}] 上下文: {}, 文本数: {}, 字符数: {}",
            self.id,
            self.context,
            self.units.len(),
            self.char_count
        )
    }
}

/// 上下文批次器
pub struct ContextBatcher {
    limits: BatchLimits,
    segmenter: Option<SentenceSegmenter>,
    segment_threshold: usize,
}

impl ContextBatcher {
    pub fn new(limits: BatchLimits) -> Self {
        Self {
            limits,
            segmenter: None,
            segment_threshold: usize::MAX,
        }
    }

    /// 对超过阈值的长文本启用分句标记
    pub fn with_segmenter(mut self, segmenter: SentenceSegmenter, threshold: usize) -> Self {
        self.segmenter = Some(segmenter);
        self.segment_threshold = threshold;
        self
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// 创建批次
    pub fn create_batches(&self, units: impl IntoIterator<Item = TextUnit>) -> Vec<Batch> {
        let mut batches = Vec::new();

        for group in group_by_context(units) {
            let units = group.units.into_iter().map(|unit| self.mark_sentences(unit));
            for chunk in chunk_by_limits(units, self.limits, TextUnit::char_count) {
                let char_count = chunk.iter().map(TextUnit::char_count).sum();
                batches.push(Batch {
                    id: batches.len(),
                    context: group.key.clone(),
                    units: chunk,
                    char_count,
                });
            }
        }

        tracing::debug!("创建了 {} 个批次", batches.len());
        batches
    }

    fn mark_sentences(&self, mut unit: TextUnit) -> TextUnit {
        if let Some(segmenter) = &self.segmenter {
            if unit.char_count() > self.segment_threshold {
                unit.sentence_count = segmenter.segment(&unit.text).len().max(1);
                if unit.is_multi_sentence() {
                    tracing::trace!("多句文本片段: {} 句", unit.sentence_count);
                }
            }
        }
        unit
    }
}
