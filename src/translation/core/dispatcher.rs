//! 翻译分发器
//!
//! 通过请求/响应契约把批次文本交给翻译后端，并把结果按位置对齐回批次。
//! 单个批次失败（传输错误、格式错误、超时）只会让该批次得到空译文，不会影响
//! 同一波次的其他批次。

use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::translation::config::EngineConfig;
use crate::translation::error::{ErrorSeverity, TranslationError, TranslationResult};
use crate::translation::settings::Settings;

/// 翻译请求：`{texts, settings}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub texts: Vec<String>,
    pub settings: Settings,
}

/// 翻译响应：`{translations}`，与请求文本按位置对齐
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub translations: Vec<String>,
}

/// 翻译后端
///
/// `Ok(None)` 表示后端没有给出响应，等价于"全部保留原文"。
pub trait TranslationBackend {
    fn translate(
        &self,
        request: TranslateRequest,
    ) -> impl Future<Output = TranslationResult<Option<TranslateResponse>>>;
}

impl<B: TranslationBackend> TranslationBackend for Rc<B> {
    fn translate(
        &self,
        request: TranslateRequest,
    ) -> impl Future<Output = TranslationResult<Option<TranslateResponse>>> {
        (**self).translate(request)
    }
}

// ============================================================================
// 消息通道后端
// ============================================================================

/// 通道上传递的一次翻译调用
#[derive(Debug)]
pub struct BackendCall {
    pub request: TranslateRequest,
    pub reply: oneshot::Sender<TranslationResult<Option<TranslateResponse>>>,
}

/// 基于消息传递的后端，实际翻译由通道另一端的服务完成
#[derive(Debug, Clone)]
pub struct ChannelBackend {
    sender: mpsc::Sender<BackendCall>,
}

impl ChannelBackend {
    pub fn new(sender: mpsc::Sender<BackendCall>) -> Self {
        Self { sender }
    }

    /// 创建后端以及服务端使用的接收端
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<BackendCall>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self::new(sender), receiver)
    }
}

impl TranslationBackend for ChannelBackend {
    async fn translate(
        &self,
        request: TranslateRequest,
    ) -> TranslationResult<Option<TranslateResponse>> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(BackendCall { request, reply })
            .await
            .map_err(|_| TranslationError::BackendUnavailable)?;
        // 服务端丢弃回复通道视为没有响应
        response.await.unwrap_or(Ok(None))
    }
}

// ============================================================================
// HTTP 后端
// ============================================================================

/// 通过 HTTP POST JSON 访问翻译服务
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

#[cfg(feature = "http")]
impl HttpBackend {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ultra-translate/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &EngineConfig) -> TranslationResult<Self> {
        Self::new(config.api_url.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(feature = "http")]
impl TranslationBackend for HttpBackend {
    async fn translate(
        &self,
        request: TranslateRequest,
    ) -> TranslationResult<Option<TranslateResponse>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        let parsed: TranslateResponse = serde_json::from_str(&body)
            .map_err(|e| TranslationError::BackendError(format!("响应格式无效: {}", e)))?;
        Ok(Some(parsed))
    }
}

// ============================================================================
// 分发器
// ============================================================================

/// 分发参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// 每个波次同时发出的批次数
    pub wave_width: usize,
    /// 波次之间的固定间隔
    pub wave_delay: Duration,
    /// 单次请求超时
    pub request_timeout: Duration,
}

impl DispatchConfig {
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self {
            wave_width: config.max_concurrent_batches.max(1),
            wave_delay: config.wave_delay(),
            request_timeout: config.request_timeout(),
        }
    }

    /// 设置中的 `translationDelay` 覆盖波次间隔
    pub fn wave_delay_for(&self, settings: &Settings) -> Duration {
        settings
            .translation_delay
            .map(Duration::from_millis)
            .unwrap_or(self.wave_delay)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from_engine(&EngineConfig::default())
    }
}

/// 单个批次的分发结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// 与请求文本等长，空字符串表示保留原文
    pub translations: Vec<String>,
    /// 批次是否失败
    pub failed: bool,
}

impl DispatchOutcome {
    fn empty(len: usize, failed: bool) -> Self {
        Self {
            translations: vec![String::new(); len],
            failed,
        }
    }

    /// 非空译文的数量
    pub fn translated_count(&self) -> usize {
        self.translations.iter().filter(|t| !t.is_empty()).count()
    }
}

/// 分发统计
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub requests_sent: AtomicUsize,
    pub requests_failed: AtomicUsize,
    pub empty_responses: AtomicUsize,
    pub texts_sent: AtomicUsize,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            empty_responses: self.empty_responses.load(Ordering::Relaxed),
            texts_sent: self.texts_sent.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.requests_sent.store(0, Ordering::Relaxed);
        self.requests_failed.store(0, Ordering::Relaxed);
        self.empty_responses.store(0, Ordering::Relaxed);
        self.texts_sent.store(0, Ordering::Relaxed);
    }
}

/// 统计快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStatsSnapshot {
    pub requests_sent: usize,
    pub requests_failed: usize,
    pub empty_responses: usize,
    pub texts_sent: usize,
}

/// 翻译分发器
pub struct Dispatcher<B> {
    backend: B,
    config: DispatchConfig,
    stats: DispatchStats,
}

impl<B: TranslationBackend> Dispatcher<B> {
    pub fn new(backend: B, config: DispatchConfig) -> Self {
        Self {
            backend,
            config,
            stats: DispatchStats::default(),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// 分发一个批次
    ///
    /// 永不失败：任何错误都变成等长的空译文并标记 `failed`。
    pub async fn dispatch(&self, texts: Vec<String>, settings: &Settings) -> DispatchOutcome {
        let len = texts.len();
        if len == 0 {
            return DispatchOutcome::empty(0, false);
        }

        self.stats.requests_sent.fetch_add(1, Ordering::Relaxed);
        self.stats.texts_sent.fetch_add(len, Ordering::Relaxed);

        let request = TranslateRequest {
            texts,
            settings: settings.clone(),
        };
        let result = tokio::time::timeout(self.config.request_timeout, self.backend.translate(request))
            .await
            .map_err(TranslationError::from)
            .and_then(|inner| inner);

        match result {
            Ok(Some(response)) => {
                let mut translations = response.translations;
                if translations.len() != len {
                    tracing::debug!("译文数量 {} 与请求数量 {} 不一致，按位置对齐", translations.len(), len);
                }
                translations.resize(len, String::new());
                DispatchOutcome {
                    translations,
                    failed: false,
                }
            }
            Ok(None) => {
                self.stats.empty_responses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("翻译服务没有返回译文，保留 {} 条原文", len);
                DispatchOutcome::empty(len, false)
            }
            Err(e) => {
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                if e.severity() >= ErrorSeverity::Error {
                    tracing::error!(category = ?e.category(), "批次翻译失败，保留原文: {}", e);
                } else {
                    tracing::warn!(
                        category = ?e.category(),
                        retryable = e.is_retryable(),
                        "批次翻译失败，保留原文: {}",
                        e
                    );
                }
                DispatchOutcome::empty(len, true)
            }
        }
    }

    /// 同时分发一个波次的批次，结果按发出顺序返回
    pub async fn dispatch_wave(
        &self,
        batches: Vec<Vec<String>>,
        settings: &Settings,
    ) -> Vec<DispatchOutcome> {
        join_all(batches.into_iter().map(|texts| self.dispatch(texts, settings))).await
    }
}
