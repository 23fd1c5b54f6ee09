//! 以节点身份为键的非持有映射
//!
//! 键是 `Rc` 指针地址，值旁边保存一个 `Weak`。只要 `Weak` 还在，分配块就不会被
//! 释放，因此地址不会被新节点复用；节点本身被丢弃后条目变为不可达，并在下一次
//! 清理时移除。

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use markup5ever_rcdom::{Handle, Node};

/// 触发惰性清理的条目数阈值
const PRUNE_THRESHOLD: usize = 256;

fn identity_of(node: &Handle) -> usize {
    Rc::as_ptr(node) as usize
}

struct Entry<V> {
    node: Weak<Node>,
    value: V,
}

/// 节点身份 → 值
pub struct IdentityMap<V> {
    entries: HashMap<usize, Entry<V>>,
    prune_at: usize,
}

impl<V> Default for IdentityMap<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            prune_at: PRUNE_THRESHOLD,
        }
    }
}

impl<V> IdentityMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: &Handle, value: V) -> Option<V> {
        if self.entries.len() >= self.prune_at {
            self.prune();
            self.prune_at = (self.entries.len() * 2).max(PRUNE_THRESHOLD);
        }
        self.entries
            .insert(
                identity_of(node),
                Entry {
                    node: Rc::downgrade(node),
                    value,
                },
            )
            .map(|entry| entry.value)
    }

    pub fn get(&self, node: &Handle) -> Option<&V> {
        self.entries
            .get(&identity_of(node))
            .filter(|entry| entry.node.strong_count() > 0)
            .map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, node: &Handle) -> Option<&mut V> {
        self.entries
            .get_mut(&identity_of(node))
            .filter(|entry| entry.node.strong_count() > 0)
            .map(|entry| &mut entry.value)
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.get(node).is_some()
    }

    pub fn remove(&mut self, node: &Handle) -> Option<V> {
        self.entries
            .remove(&identity_of(node))
            .map(|entry| entry.value)
    }

    /// 移除所有节点已被丢弃的条目
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.node.strong_count() > 0);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// 存活条目数
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.node.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 遍历仍然存活的节点及其值
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &V)> {
        self.entries
            .values()
            .filter_map(|entry| entry.node.upgrade().map(|node| (node, &entry.value)))
    }

    /// 取出全部存活条目
    pub fn drain(&mut self) -> Vec<(Handle, V)> {
        self.entries
            .drain()
            .filter_map(|(_, entry)| entry.node.upgrade().map(|node| (node, entry.value)))
            .collect()
    }
}

/// 节点身份集合
#[derive(Default)]
pub struct IdentitySet {
    inner: IdentityMap<()>,
}

impl IdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回是否为新插入
    pub fn insert(&mut self, node: &Handle) -> bool {
        self.inner.insert(node, ()).is_none()
    }

    pub fn contains(&self, node: &Handle) -> bool {
        self.inner.contains(node)
    }

    pub fn remove(&mut self, node: &Handle) -> bool {
        self.inner.remove(node).is_some()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
