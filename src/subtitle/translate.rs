//! 字幕批量翻译
//!
//! 字幕按条数和字符数分批发送，失败的批次退回原文。输出与输入逐条对应，
//! 数量、顺序和时间都不变。

use super::cue::{SubtitleCue, TranslatedCue};
use crate::translation::config::EngineConfig;
use crate::translation::core::{Dispatcher, TranslationBackend};
use crate::translation::pipeline::{chunk_by_limits, BatchLimits};
use crate::translation::settings::Settings;

/// 字幕翻译结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CueTranslation {
    pub cues: Vec<TranslatedCue>,
    pub batches: usize,
    pub failed_batches: usize,
}

impl CueTranslation {
    pub fn translated_count(&self) -> usize {
        self.cues.iter().filter(|cue| cue.is_translated()).count()
    }
}

/// 字幕翻译器
#[derive(Debug, Clone, Copy)]
pub struct CueTranslator {
    limits: BatchLimits,
}

impl CueTranslator {
    pub fn new(limits: BatchLimits) -> Self {
        Self { limits }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(BatchLimits::for_cues(config))
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// 翻译字幕列表
    pub async fn translate<B: TranslationBackend>(
        &self,
        dispatcher: &Dispatcher<B>,
        cues: &[SubtitleCue],
        settings: &Settings,
    ) -> CueTranslation {
        let mut result = CueTranslation {
            cues: cues.iter().map(TranslatedCue::untranslated).collect(),
            ..CueTranslation::default()
        };

        let batches = chunk_by_limits(0..cues.len(), self.limits, |&index| {
            cues[index].text.chars().count()
        });
        result.batches = batches.len();

        let wave_width = dispatcher.config().wave_width.max(1);
        for wave in batches.chunks(wave_width) {
            let requests = wave
                .iter()
                .map(|batch| batch.iter().map(|&index| cues[index].text.clone()).collect())
                .collect();
            let outcomes = dispatcher.dispatch_wave(requests, settings).await;

            for (batch, outcome) in wave.iter().zip(outcomes) {
                if outcome.failed {
                    result.failed_batches += 1;
                }
                for (&index, translation) in batch.iter().zip(outcome.translations) {
                    let translation = translation.trim();
                    if !translation.is_empty() {
                        result.cues[index].text = translation.to_string();
                    }
                }
            }
        }

        tracing::info!(
            "字幕翻译完成: {} 条, {} 个批次, 失败 {} 个",
            result.cues.len(),
            result.batches,
            result.failed_batches
        );
        result
    }
}
