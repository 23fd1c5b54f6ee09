//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，所有变量统一使用 `ULTRA_TRANSLATE_` 前缀

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    /// 仅当变量被显式设置时返回值
    fn get_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "ULTRA_TRANSLATE_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "ULTRA_TRANSLATE_TARGET_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language for translation (e.g. zh-CN, ja, en)";

        fn parse(value: &str) -> EnvResult<String> {
            let lang = value.trim();
            let primary = lang.split('-').next().unwrap_or_default();
            if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Language tag must start with a 2 or 3 letter code".to_string(),
                });
            }
            Ok(lang.to_string())
        }
    }

    /// 翻译 API 标识
    pub struct Api;
    impl EnvVar<String> for Api {
        const NAME: &'static str = "ULTRA_TRANSLATE_API";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation API family (google, deepl, microsoft, ...)";

        fn parse(value: &str) -> EnvResult<String> {
            let api = value.trim().to_lowercase();
            if api.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API identifier cannot be empty".to_string(),
                });
            }
            Ok(api)
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "ULTRA_TRANSLATE_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation backend endpoint URL";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("http://localhost:1188/translate".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 每批最大字符数
    pub struct MaxBatchChars;
    impl EnvVar<usize> for MaxBatchChars {
        const NAME: &'static str = "ULTRA_TRANSLATE_MAX_BATCH_CHARS";
        const DEFAULT: Option<usize> = Some(1000);
        const DESCRIPTION: &'static str = "Maximum cumulative characters per text batch";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 50, 50000)
        }
    }

    /// 每一波并发批次数
    pub struct MaxConcurrentBatches;
    impl EnvVar<usize> for MaxConcurrentBatches {
        const NAME: &'static str = "ULTRA_TRANSLATE_MAX_CONCURRENT_BATCHES";
        const DEFAULT: Option<usize> = Some(3);
        const DESCRIPTION: &'static str = "Batches dispatched concurrently in one wave";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 32)
        }
    }

    /// 波次间隔
    pub struct WaveDelay;
    impl EnvVar<Duration> for WaveDelay {
        const NAME: &'static str = "ULTRA_TRANSLATE_WAVE_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(50));
        const DESCRIPTION: &'static str = "Pause after each dispatch wave in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 10_000)
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "ULTRA_TRANSLATE_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Backend request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 || seconds > 300 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be between 1 and 300 seconds".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }
}

/// 变更监听相关环境变量
pub mod watcher {
    use super::*;

    /// 去抖时间
    pub struct Debounce;
    impl EnvVar<Duration> for Debounce {
        const NAME: &'static str = "ULTRA_TRANSLATE_DEBOUNCE_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(1500));
        const DESCRIPTION: &'static str = "Quiet period before translating mutated content";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 100, 60_000)
        }
    }

    /// 自动翻译延迟
    pub struct AutoTranslateDelay;
    impl EnvVar<Duration> for AutoTranslateDelay {
        const NAME: &'static str = "ULTRA_TRANSLATE_AUTO_DELAY_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(2000));
        const DESCRIPTION: &'static str = "Delay before the automatic first pass";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_millis(value, Self::NAME, 0, 60_000)
        }
    }
}

/// 字幕相关环境变量
pub mod subtitle {
    use super::*;

    /// 每批字幕条数
    pub struct CueBatchSize;
    impl EnvVar<usize> for CueBatchSize {
        const NAME: &'static str = "ULTRA_TRANSLATE_CUE_BATCH_SIZE";
        const DEFAULT: Option<usize> = Some(50);
        const DESCRIPTION: &'static str = "Maximum cues per translation batch";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 500)
        }
    }

    /// 每批字幕字符数
    pub struct CueBatchChars;
    impl EnvVar<usize> for CueBatchChars {
        const NAME: &'static str = "ULTRA_TRANSLATE_CUE_BATCH_CHARS";
        const DEFAULT: Option<usize> = Some(5000);
        const DESCRIPTION: &'static str = "Maximum cumulative characters per cue batch";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 100, 100_000)
        }
    }
}

/// 辅助函数
fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

fn parse_millis(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<Duration> {
    let millis: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid number of milliseconds".to_string(),
    })?;

    if millis < min || millis > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {}ms must be between {}ms and {}ms", millis, min, max),
        });
    }

    Ok(Duration::from_millis(millis))
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));

    docs.push_str("\n## Translation Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        translation::TargetLang::NAME,
        translation::TargetLang::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        translation::Api::NAME,
        translation::Api::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {}\n",
        translation::ApiUrl::NAME,
        translation::ApiUrl::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::MaxBatchChars::NAME,
        translation::MaxBatchChars::DESCRIPTION,
        translation::MaxBatchChars::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::MaxConcurrentBatches::NAME,
        translation::MaxConcurrentBatches::DESCRIPTION,
        translation::MaxConcurrentBatches::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::WaveDelay::NAME,
        translation::WaveDelay::DESCRIPTION,
        translation::WaveDelay::DEFAULT
    ));

    docs.push_str("\n## Watcher Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        watcher::Debounce::NAME,
        watcher::Debounce::DESCRIPTION,
        watcher::Debounce::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        watcher::AutoTranslateDelay::NAME,
        watcher::AutoTranslateDelay::DESCRIPTION,
        watcher::AutoTranslateDelay::DEFAULT
    ));

    docs.push_str("\n## Subtitle Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        subtitle::CueBatchSize::NAME,
        subtitle::CueBatchSize::DESCRIPTION,
        subtitle::CueBatchSize::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        subtitle::CueBatchChars::NAME,
        subtitle::CueBatchChars::DESCRIPTION,
        subtitle::CueBatchChars::DEFAULT
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(core::LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn test_target_lang_validation() {
        assert_eq!(translation::TargetLang::parse("zh-CN").unwrap(), "zh-CN");
        assert_eq!(translation::TargetLang::parse(" ja ").unwrap(), "ja");
        assert!(translation::TargetLang::parse("x").is_err());
        assert!(translation::TargetLang::parse("12").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(translation::ApiUrl::parse("http://localhost:1188").is_ok());
        assert!(translation::ApiUrl::parse("https://api.example.com").is_ok());
        assert!(translation::ApiUrl::parse("ftp://example.com").is_err());
    }

    #[test]
    fn test_numeric_validation() {
        assert_eq!(translation::MaxConcurrentBatches::parse("3").unwrap(), 3);
        assert!(translation::MaxConcurrentBatches::parse("0").is_err());
        assert!(translation::MaxConcurrentBatches::parse("many").is_err());

        assert_eq!(
            watcher::Debounce::parse("1500").unwrap(),
            Duration::from_millis(1500)
        );
        assert!(watcher::Debounce::parse("5").is_err());
    }

    #[test]
    fn test_env_docs_mention_every_prefix() {
        let docs = generate_env_docs();
        assert!(docs.contains("ULTRA_TRANSLATE_DEBOUNCE_MS"));
        assert!(docs.contains("ULTRA_TRANSLATE_CUE_BATCH_SIZE"));
    }
}
