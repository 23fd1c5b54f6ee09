//! 分句器
//!
//! 按页面语言选择断句规则，把长文本切分成句子。切分结果目前只用于标记
//! 多句片段，不会拆分批次中的文本单元。

use crate::translation::language::primary_subtag;

/// 默认断句语言
pub const DEFAULT_LOCALE: &str = "en";

/// 支持的断句语言
const SUPPORTED_LOCALES: &[&str] = &[
    "en", "fr", "de", "es", "it", "pt", "nl", "sv", "da", "no", "fi", "pl", "cs", "ru", "uk",
    "tr", "vi", "id", "zh", "ja", "ko",
];

/// 以句号结尾但不是句子结束的常见缩写
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "fig", "no",
    "inc", "ltd", "co",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rules {
    /// 句末标点后必须有空白
    Spaced,
    /// 全角句末标点直接断句
    Cjk,
}

/// 句子切分器
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    locale: String,
    rules: Rules,
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::for_language(None)
    }
}

impl SentenceSegmenter {
    /// 按页面语言创建，不支持的语言退回默认语言
    pub fn for_language(lang: Option<&str>) -> Self {
        let primary = lang.map(primary_subtag).unwrap_or_default();
        let locale = if SUPPORTED_LOCALES.contains(&primary.as_str()) {
            primary
        } else {
            DEFAULT_LOCALE.to_string()
        };
        let rules = match locale.as_str() {
            "zh" | "ja" => Rules::Cjk,
            _ => Rules::Spaced,
        };
        Self { locale, rules }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// 把文本切分成句子
    pub fn segment(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while index < chars.len() {
            let c = chars[index];
            let full_width = matches!(c, '。' | '！' | '？' | '．');
            let half_width = matches!(c, '.' | '!' | '?' | '…');

            if !full_width && !half_width {
                index += 1;
                continue;
            }

            // 吞掉连续的句末标点和收尾引号/括号
            let mut end = index + 1;
            while end < chars.len()
                && matches!(
                    chars[end],
                    '.' | '!' | '?' | '…' | '。' | '！' | '？' | '"' | '\'' | '”' | '’' | ')' | '」' | '』'
                )
            {
                end += 1;
            }

            let boundary = if full_width {
                true
            } else {
                let followed_by_space = end >= chars.len() || chars[end].is_whitespace();
                let cjk_context =
                    self.rules == Rules::Cjk && end < chars.len() && !chars[end].is_ascii();
                (followed_by_space || cjk_context)
                    && !(c == '.' && self.is_abbreviation(&chars[start..index]))
            };

            if boundary {
                push_sentence(&mut sentences, &chars[start..end]);
                start = end;
            }
            index = end;
        }

        push_sentence(&mut sentences, &chars[start..]);
        sentences
    }

    fn is_abbreviation(&self, before: &[char]) -> bool {
        let word: String = before
            .iter()
            .rev()
            .take_while(|c| !c.is_whitespace())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let word = word.trim_start_matches(['(', '"', '\'']);
        if word.chars().count() == 1 && word.chars().all(|c| c.is_uppercase()) {
            // 姓名首字母
            return true;
        }
        let lower = word.to_lowercase();
        ABBREVIATIONS.contains(&lower.as_str())
    }
}

fn push_sentence(sentences: &mut Vec<String>, chars: &[char]) {
    let sentence: String = chars.iter().collect();
    let sentence = sentence.trim();
    if !sentence.is_empty() {
        sentences.push(sentence.to_string());
    }
}
