//! 文档变更监听
//!
//! 宿主把观察到的 DOM 变更以 [`MutationRecord`] 的形式送进通道。监听器在
//! 空闲/等待两个状态之间切换：出现可能带来新文本的变更后进入等待状态，
//! 每次新的变更都会把截止时间向后推；安静期结束后只对新增内容运行一次增量翻译。
//! 截止时间到达时如果已有翻译过程在运行，这一轮直接丢弃。

use std::rc::Rc;
use std::time::Duration;

use markup5ever_rcdom::Handle;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use super::dispatcher::TranslationBackend;
use super::session::{PassKind, TranslationSession};
use crate::html::{get_node_attr, get_parent_element, is_attached_to, is_element, is_text, text_content};
use crate::translation::pipeline::filters::is_system_element;

/// 会带来可翻译内容的属性
pub const WATCHED_ATTRIBUTES: &[&str] = &["title", "placeholder", "alt", "value"];

/// 一条 DOM 变更记录
#[derive(Debug, Clone)]
pub enum MutationRecord {
    /// 子节点增加
    ChildList { target: Handle, added: Vec<Handle> },
    /// 属性变化
    Attributes { target: Handle, name: String },
}

/// 监听器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Pending { deadline: Instant },
}

/// 监听统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub records_seen: usize,
    pub passes: usize,
    pub skipped: usize,
}

/// 变更去抖与新增内容收集
pub struct MutationWatcher {
    debounce: Duration,
    state: WatcherState,
    roots: Vec<Handle>,
}

impl MutationWatcher {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            state: WatcherState::Idle,
            roots: Vec::new(),
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, WatcherState::Pending { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            WatcherState::Pending { deadline } => Some(deadline),
            WatcherState::Idle => None,
        }
    }

    /// 处理一组变更记录，返回其中是否有相关变更
    pub fn observe(&mut self, records: impl IntoIterator<Item = MutationRecord>, now: Instant) -> bool {
        let mut relevant = false;

        for record in records {
            match record {
                MutationRecord::ChildList { target, added } => {
                    for node in added {
                        if let Some(root) = added_root(&target, &node) {
                            self.roots.push(root);
                            relevant = true;
                        }
                    }
                }
                MutationRecord::Attributes { target, name } => {
                    if WATCHED_ATTRIBUTES.contains(&name.as_str()) && !is_system_element(&target) {
                        self.roots.push(target);
                        relevant = true;
                    }
                }
            }
        }

        if relevant {
            self.state = WatcherState::Pending {
                deadline: now + self.debounce,
            };
        }
        relevant
    }

    /// 取出等待处理的根节点并回到空闲状态
    ///
    /// 已脱离文档的节点和被其他根节点包含的节点会被去掉。
    pub fn take_roots(&mut self, document: &Handle) -> Vec<Handle> {
        self.state = WatcherState::Idle;
        let mut roots: Vec<Handle> = Vec::new();
        for root in self.roots.drain(..) {
            if !is_attached_to(&root, document) || roots.iter().any(|r| Rc::ptr_eq(r, &root)) {
                continue;
            }
            roots.push(root);
        }

        let nested: Vec<bool> = roots
            .iter()
            .map(|root| {
                roots
                    .iter()
                    .any(|other| !Rc::ptr_eq(other, root) && is_attached_to(root, other))
            })
            .collect();
        roots
            .into_iter()
            .zip(nested)
            .filter_map(|(root, nested)| (!nested).then_some(root))
            .collect()
    }
}

/// 新增节点对应的扫描根，不相关时为 `None`
fn added_root(target: &Handle, node: &Handle) -> Option<Handle> {
    if is_text(node) {
        if text_content(node).trim().is_empty() {
            return None;
        }
        return get_parent_element(node)
            .or_else(|| is_element(target).then(|| target.clone()));
    }
    if is_element(node) && !is_system_element(node) {
        if !text_content(node).trim().is_empty() || has_watched_attribute(node) {
            return Some(node.clone());
        }
    }
    None
}

fn has_watched_attribute(element: &Handle) -> bool {
    WATCHED_ATTRIBUTES
        .iter()
        .any(|name| get_node_attr(element, name).is_some())
}

/// 运行监听循环，直到发送端全部关闭
pub async fn watch<B: TranslationBackend>(
    session: &TranslationSession<B>,
    mut receiver: mpsc::UnboundedReceiver<Vec<MutationRecord>>,
) -> WatchStats {
    let mut watcher = MutationWatcher::new(session.config().debounce());
    let mut stats = WatchStats::default();

    loop {
        let deadline = watcher.deadline().unwrap_or_else(Instant::now);
        tokio::select! {
            received = receiver.recv() => {
                let Some(records) = received else {
                    break;
                };
                stats.records_seen += records.len();
                watcher.observe(records, Instant::now());
            }
            _ = sleep_until(deadline), if watcher.is_pending() => {
                let roots = watcher.take_roots(session.document());
                if !session.settings().auto_translate {
                    tracing::debug!("未开启自动翻译，忽略页面变更");
                    continue;
                }
                if roots.is_empty() {
                    continue;
                }
                match session.translate_roots(&roots, PassKind::Incremental).await {
                    Some(report) => {
                        stats.passes += 1;
                        tracing::debug!("增量翻译完成: 替换 {} 处", report.substituted);
                    }
                    None => {
                        stats.skipped += 1;
                        tracing::debug!("翻译正在进行，丢弃本轮变更");
                    }
                }
            }
        }
    }

    stats
}
