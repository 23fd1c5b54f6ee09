//! 替换记录
//!
//! 保存被替换节点的原文以及已处理节点集合，二者都不持有 DOM 节点。

use markup5ever_rcdom::Handle;

use super::identity::{IdentityMap, IdentitySet};

/// 替换引擎持有的全部可逆状态
#[derive(Default)]
pub struct SubstitutionRecords {
    /// 替换节点 → 替换前的原始文本
    originals: IdentityMap<String>,
    /// 已经处理过的节点
    marks: IdentitySet,
}

impl SubstitutionRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以替换后的节点为键记录原文
    pub fn record_original(&mut self, replacement: &Handle, original: String) {
        self.originals.insert(replacement, original);
    }

    pub fn original_of(&self, replacement: &Handle) -> Option<&str> {
        self.originals.get(replacement).map(String::as_str)
    }

    pub fn take_original(&mut self, replacement: &Handle) -> Option<String> {
        self.originals.remove(replacement)
    }

    pub fn mark_translated(&mut self, node: &Handle) -> bool {
        self.marks.insert(node)
    }

    pub fn is_translated(&self, node: &Handle) -> bool {
        self.marks.contains(node)
    }

    /// 清空已处理集合（作用于整个文档）
    pub fn clear_marks(&mut self) {
        self.marks.clear();
    }

    pub fn original_count(&self) -> usize {
        self.originals.len()
    }

    pub fn mark_count(&self) -> usize {
        self.marks.len()
    }

    pub fn prune(&mut self) -> usize {
        self.originals.prune()
    }
}
