//! 语言相关的启发式判断
//!
//! 只按 Unicode 区段粗略判断书写系统，不是真正的语种识别。

/// 从右到左书写的语言
const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur", "yi", "ji", "iw", "ku", "ps", "sd", "ug", "dv"];

/// 判断语言标签是否为从右到左书写
pub fn is_rtl(lang: &str) -> bool {
    let primary = primary_subtag(lang);
    RTL_LANGUAGES.iter().any(|rtl| *rtl == primary)
}

/// 语言标签的主子标签（小写）
pub fn primary_subtag(lang: &str) -> String {
    lang.split(['-', '_'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// 按字符区段推测文本的源语言
///
/// 命中 CJK、假名、谚文、阿拉伯、西里尔、希伯来区段时返回对应语言，
/// 否则退回文档声明的语言前缀，再退回 `en`。
pub fn detect_language(text: &str, document_lang: Option<&str>) -> String {
    for c in text.chars() {
        let code = c as u32;
        let detected = match code {
            0x3040..=0x309F | 0x30A0..=0x30FF => Some("ja"),
            0x4E00..=0x9FFF | 0x3400..=0x4DBF => Some("zh"),
            0xAC00..=0xD7AF | 0x1100..=0x11FF => Some("ko"),
            0x0600..=0x06FF | 0x0750..=0x077F => Some("ar"),
            0x0400..=0x04FF => Some("ru"),
            0x0590..=0x05FF => Some("he"),
            _ => None,
        };
        if let Some(lang) = detected {
            // 日文常混用汉字，出现假名即视为日文
            if lang == "zh" && text.chars().any(is_kana) {
                return "ja".to_string();
            }
            return lang.to_string();
        }
    }

    document_lang
        .map(primary_subtag)
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| "en".to_string())
}

fn is_kana(c: char) -> bool {
    matches!(c as u32, 0x3040..=0x309F | 0x30A0..=0x30FF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_scripts() {
        assert_eq!(detect_language("你好世界", None), "zh");
        assert_eq!(detect_language("こんにちは", None), "ja");
        assert_eq!(detect_language("東京へようこそ", None), "ja");
        assert_eq!(detect_language("안녕하세요", None), "ko");
        assert_eq!(detect_language("مرحبا", None), "ar");
        assert_eq!(detect_language("Привет", None), "ru");
        assert_eq!(detect_language("שלום", None), "he");
    }

    #[test]
    fn falls_back_to_document_language_then_english() {
        assert_eq!(detect_language("Bonjour", Some("fr-FR")), "fr");
        assert_eq!(detect_language("Hello", None), "en");
        assert_eq!(detect_language("Hello", Some("")), "en");
    }

    #[test]
    fn rtl_detection_uses_primary_subtag() {
        assert!(is_rtl("ar"));
        assert!(is_rtl("he-IL"));
        assert!(is_rtl("fa_IR"));
        assert!(!is_rtl("zh-CN"));
        assert!(!is_rtl("en"));
    }
}
