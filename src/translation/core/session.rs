//! 翻译会话
//!
//! 会话持有一次页面生命周期内的全部可变状态：当前设置、替换记录、进度指示器
//! 以及显式的空闲/运行状态机。所有方法都只需要 `&self`，可以在同一线程的多个
//! 任务之间共享（例如变更监听任务与控制消息处理）。
//!
//! 同一时刻只允许一个翻译过程运行；运行期间发起的新过程会被直接丢弃，不排队。

use std::cell::{Cell, RefCell};
use std::time::Instant;

use markup5ever_rcdom::Handle;

use super::attributes::apply_attribute_translation;
use super::dispatcher::{DispatchConfig, Dispatcher, TranslationBackend};
use super::engine::{has_substitutions, RenderOptions, RestoreReport, SubstitutionEngine};
use super::indicator::LoadingIndicator;
use crate::html::{get_body, get_document_lang};
use crate::translation::config::EngineConfig;
use crate::translation::pipeline::{
    chunk_by_limits, AttributeUnit, Batch, BatchLimits, ContextBatcher, InlineStyleProbe,
    SentenceSegmenter, TextCollector, TextFilter, TextUnit, VisibilityProbe,
};
use crate::translation::settings::Settings;
use crate::utils::is_excluded_site;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// 正在运行第 `generation` 次翻译过程
    Running { generation: u64 },
}

/// 翻译过程的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// 整页翻译，显示进度指示器
    Page,
    /// 变更监听触发的增量翻译
    Incremental,
}

/// 一次翻译过程的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// 收集到的文本片段数
    pub units: usize,
    /// 收集到的属性数
    pub attributes: usize,
    /// 发出的批次数
    pub batches: usize,
    /// 实际替换的文本片段和属性数
    pub substituted: usize,
    /// 失败的批次数
    pub failed_batches: usize,
    /// 过程是否被停止
    pub stopped: bool,
}

/// 切换翻译的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Restored(RestoreReport),
    /// 运行了一次翻译；`None` 表示已有过程在运行而被跳过
    Translated(Option<PassReport>),
}

enum Job {
    Text(Batch),
    Attributes(Vec<AttributeUnit>),
}

impl Job {
    fn texts(&self) -> Vec<String> {
        match self {
            Job::Text(batch) => batch.texts(),
            Job::Attributes(units) => units.iter().map(|unit| unit.text.clone()).collect(),
        }
    }
}

/// 运行状态守卫：离开作用域时把属于自己的运行状态复位为空闲
struct RunGuard<'a, B: TranslationBackend> {
    session: &'a TranslationSession<B>,
    generation: u64,
}

impl<B: TranslationBackend> Drop for RunGuard<'_, B> {
    fn drop(&mut self) {
        if self.session.is_current(self.generation) {
            self.session.state.set(SessionState::Idle);
            self.session.indicator.borrow_mut().remove();
        }
    }
}

/// 翻译会话
pub struct TranslationSession<B> {
    document: Handle,
    page_url: Option<String>,
    config: EngineConfig,
    settings: RefCell<Settings>,
    dispatcher: Dispatcher<B>,
    engine: RefCell<SubstitutionEngine>,
    indicator: RefCell<LoadingIndicator>,
    state: Cell<SessionState>,
    generation: Cell<u64>,
    filter: TextFilter,
    probe: Box<dyn VisibilityProbe>,
}

impl<B: TranslationBackend> TranslationSession<B> {
    pub fn new(document: Handle, backend: B, config: EngineConfig, settings: Settings) -> Self {
        let dispatcher = Dispatcher::new(backend, DispatchConfig::from_engine(&config));
        let filter = TextFilter::new(config.min_text_length);
        Self {
            document,
            page_url: None,
            config,
            settings: RefCell::new(settings),
            dispatcher,
            engine: RefCell::new(SubstitutionEngine::new()),
            indicator: RefCell::new(LoadingIndicator::new()),
            state: Cell::new(SessionState::Idle),
            generation: Cell::new(0),
            filter,
            probe: Box::new(InlineStyleProbe),
        }
    }

    /// 设置当前页面地址，用于排除站点匹配
    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }

    /// 使用宿主提供的可见性探针
    pub fn with_probe(mut self, probe: Box<dyn VisibilityProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn document(&self) -> &Handle {
        &self.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher<B> {
        &self.dispatcher
    }

    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn update_settings(&self, settings: Settings) {
        tracing::debug!("设置已更新: 目标语言 {}", settings.target_language);
        *self.settings.borrow_mut() = settings;
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state.get(), SessionState::Running { .. })
    }

    pub fn indicator_visible(&self) -> bool {
        self.indicator.borrow().is_visible()
    }

    /// 已替换的文本片段数
    pub fn substitution_count(&self) -> usize {
        self.engine.borrow().records().original_count()
    }

    /// 节点是否已经处理过
    pub fn is_translated(&self, node: &Handle) -> bool {
        self.engine.borrow().records().is_translated(node)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state.get() == SessionState::Running { generation }
    }

    fn begin(&self) -> Option<RunGuard<'_, B>> {
        if self.is_running() {
            return None;
        }
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.state.set(SessionState::Running { generation });
        Some(RunGuard {
            session: self,
            generation,
        })
    }

    /// 翻译的根节点：`<body>`，不存在时为整个文档
    pub fn body(&self) -> Handle {
        get_body(&self.document).unwrap_or_else(|| self.document.clone())
    }

    /// 页面是否应该翻译
    ///
    /// 文档语言已是目标语言，或页面地址命中排除列表时返回 `false`。
    pub fn should_translate_page(&self) -> bool {
        let settings = self.settings.borrow();
        let target = settings.target_prefix();

        if let Some(lang) = get_document_lang(&self.document) {
            if !target.is_empty() && lang.to_lowercase().starts_with(&target) {
                tracing::info!("页面语言 {} 已是目标语言，跳过翻译", lang);
                return false;
            }
        }

        if let Some(url) = &self.page_url {
            if is_excluded_site(url, settings.excluded_patterns()) {
                tracing::info!("页面 {} 在排除列表中，跳过翻译", url);
                return false;
            }
        }

        true
    }

    /// 开启自动翻译时，等待固定延迟后翻译整页
    pub async fn auto_translate(&self) -> Option<PassReport> {
        if !self.settings.borrow().auto_translate || !self.should_translate_page() {
            return None;
        }
        tokio::time::sleep(self.config.auto_translate_delay()).await;
        self.translate_page().await
    }

    /// 翻译整页；已有过程运行时返回 `None`
    pub async fn translate_page(&self) -> Option<PassReport> {
        let body = self.body();
        self.translate_roots(&[body], PassKind::Page).await
    }

    /// 只翻译给定根节点下的内容
    pub async fn translate_roots(&self, roots: &[Handle], kind: PassKind) -> Option<PassReport> {
        let Some(guard) = self.begin() else {
            tracing::info!("翻译正在进行中，跳过本次请求");
            return None;
        };
        let report = self.run_pass(roots, kind, guard.generation).await;
        drop(guard);
        Some(report)
    }

    async fn run_pass(&self, roots: &[Handle], kind: PassKind, generation: u64) -> PassReport {
        let start_time = Instant::now();
        let settings = self.settings();
        let document_lang = get_document_lang(&self.document);
        let mut report = PassReport::default();

        if kind == PassKind::Page {
            self.indicator
                .borrow_mut()
                .show(&self.body(), &settings.interface_language);
        }

        let (units, attribute_units) = self.collect(roots, &settings);
        report.units = units.len();
        report.attributes = attribute_units.len();

        let jobs = self.plan_jobs(units, attribute_units, &settings, document_lang.as_deref());
        report.batches = jobs.len();
        let total = jobs.len();

        let options = RenderOptions::from_settings(&settings, document_lang);
        let wave_width = self.dispatcher.config().wave_width.max(1);
        let wave_delay = self.dispatcher.config().wave_delay_for(&settings);
        let mut completed = 0;
        let mut jobs = jobs.into_iter().peekable();

        while jobs.peek().is_some() {
            if !self.is_current(generation) {
                tracing::info!("翻译已停止，剩余 {} 个批次不再发送", total - completed);
                report.stopped = true;
                break;
            }

            let wave: Vec<Job> = jobs.by_ref().take(wave_width).collect();
            let outcomes = self
                .dispatcher
                .dispatch_wave(wave.iter().map(Job::texts).collect(), &settings)
                .await;

            // 同一波次内按发出顺序应用
            for (job, outcome) in wave.iter().zip(outcomes) {
                if outcome.failed {
                    report.failed_batches += 1;
                }
                let applied = self.apply_job(job, &outcome.translations, &options);
                report.substituted += applied;
                completed += 1;

                if settings.debug_mode {
                    tracing::info!("批次 {}/{} 完成: 替换 {} 处", completed, total, applied);
                } else {
                    tracing::debug!("批次 {}/{} 完成: 替换 {} 处", completed, total, applied);
                }
                self.indicator.borrow().update(completed, total);
            }

            tokio::time::sleep(wave_delay).await;
        }

        tracing::info!(
            "翻译完成: {} 个片段, {} 个属性, {} 个批次, 替换 {} 处, 失败批次 {}, 耗时 {:?}",
            report.units,
            report.attributes,
            report.batches,
            report.substituted,
            report.failed_batches,
            start_time.elapsed()
        );
        report
    }

    fn collect(&self, roots: &[Handle], settings: &Settings) -> (Vec<TextUnit>, Vec<AttributeUnit>) {
        let engine = self.engine.borrow();
        let collector = TextCollector::new(&self.filter, self.probe.as_ref());
        let mut units = Vec::new();
        let mut attributes = Vec::new();

        for root in roots {
            let mut sequence = collector.text_units(root, engine.records());
            units.extend(sequence.by_ref());
            tracing::debug!(
                "过滤统计: 共 {} 个文本, 可翻译 {} 个",
                sequence.stats().total_texts,
                sequence.stats().translatable_texts
            );
            attributes.extend(collector.attribute_units(root, settings));
        }

        (units, attributes)
    }

    fn plan_jobs(
        &self,
        units: Vec<TextUnit>,
        attribute_units: Vec<AttributeUnit>,
        settings: &Settings,
        document_lang: Option<&str>,
    ) -> Vec<Job> {
        let limits = BatchLimits::for_api(&settings.translation_api, &self.config);
        let mut batcher = ContextBatcher::new(limits);
        if self.config.segmentation_enabled {
            batcher = batcher.with_segmenter(
                SentenceSegmenter::for_language(document_lang),
                self.config.segment_threshold,
            );
        }

        let mut jobs: Vec<Job> = batcher.create_batches(units).into_iter().map(Job::Text).collect();
        jobs.extend(
            chunk_by_limits(attribute_units, limits, AttributeUnit::char_count)
                .into_iter()
                .map(Job::Attributes),
        );
        jobs
    }

    fn apply_job(&self, job: &Job, translations: &[String], options: &RenderOptions) -> usize {
        match job {
            Job::Text(batch) => {
                let mut engine = self.engine.borrow_mut();
                batch
                    .units
                    .iter()
                    .zip(translations)
                    .filter(|(unit, translation)| engine.apply(unit, translation, options).is_ok())
                    .count()
            }
            Job::Attributes(units) => units
                .iter()
                .zip(translations)
                .filter(|(unit, translation)| apply_attribute_translation(unit, translation))
                .count(),
        }
    }

    /// 停止翻译
    ///
    /// 只翻转运行状态并移除指示器；已经发出的波次会正常完成并应用，之后不再发出新的波次。
    pub fn stop(&self) -> bool {
        let was_running = self.is_running();
        self.state.set(SessionState::Idle);
        self.indicator.borrow_mut().remove();
        if was_running {
            tracing::info!("翻译已停止");
        }
        was_running
    }

    /// 恢复整页原文
    pub fn restore(&self) -> RestoreReport {
        let body = self.body();
        self.restore_subtree(&body)
    }

    /// 恢复子树原文；已处理集合会被整体清空
    pub fn restore_subtree(&self, root: &Handle) -> RestoreReport {
        self.engine.borrow_mut().restore(root)
    }

    /// 页面中存在译文时恢复原文，否则翻译整页
    pub async fn toggle(&self) -> ToggleOutcome {
        if has_substitutions(&self.document) {
            ToggleOutcome::Restored(self.restore())
        } else {
            ToggleOutcome::Translated(self.translate_page().await)
        }
    }

    /// 切换原文的显示
    pub fn toggle_original_visibility(&self) -> usize {
        self.engine
            .borrow()
            .toggle_original_visibility(&self.document)
    }
}
