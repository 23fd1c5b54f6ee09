//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 引擎配置
///
/// 这些值是引擎自身的常量，与外部拥有的 [`Settings`](crate::translation::Settings) 区分开。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    // 后端
    pub api_url: String,
    pub request_timeout_secs: u64,

    // 批次配置
    pub max_batch_chars: usize,
    pub google_batch_size: usize,
    pub default_batch_size: usize,
    pub max_concurrent_batches: usize,
    pub wave_delay_ms: u64,

    // 过滤与分句
    pub min_text_length: usize,
    pub segment_threshold: usize,
    pub segmentation_enabled: bool,

    // 变更监听
    pub debounce_ms: u64,
    pub auto_translate_delay_ms: u64,

    // 字幕
    pub cue_batch_size: usize,
    pub cue_batch_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            max_batch_chars: constants::MAX_BATCH_CHARS,
            google_batch_size: constants::GOOGLE_BATCH_SIZE,
            default_batch_size: constants::DEFAULT_BATCH_SIZE,
            max_concurrent_batches: constants::MAX_CONCURRENT_BATCHES,
            wave_delay_ms: constants::WAVE_DELAY.as_millis() as u64,

            min_text_length: constants::MIN_TEXT_LENGTH,
            segment_threshold: constants::SEGMENT_THRESHOLD,
            segmentation_enabled: true,

            debounce_ms: constants::DEBOUNCE.as_millis() as u64,
            auto_translate_delay_ms: constants::AUTO_TRANSLATE_DELAY.as_millis() as u64,

            cue_batch_size: constants::CUE_BATCH_SIZE,
            cue_batch_chars: constants::CUE_BATCH_CHARS,
        }
    }
}

impl EngineConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.max_batch_chars == 0 {
            return Err(TranslationError::ConfigError("批次字符上限不能为0".to_string()));
        }

        if self.google_batch_size == 0 || self.default_batch_size == 0 {
            return Err(TranslationError::ConfigError("批次大小不能为0".to_string()));
        }

        if self.max_concurrent_batches == 0 {
            return Err(TranslationError::ConfigError("最大并发数不能为0".to_string()));
        }

        if self.cue_batch_size == 0 || self.cue_batch_chars == 0 {
            return Err(TranslationError::ConfigError("字幕批次上限不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖（使用类型安全环境变量系统）
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{subtitle, translation, watcher, EnvVar};

        if let Some(result) = translation::ApiUrl::get_set() {
            match result {
                Ok(api_url) => {
                    self.api_url = api_url;
                    tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
                }
                Err(e) => tracing::warn!("忽略无效的环境变量: {}", e),
            }
        }

        if let Some(Ok(timeout)) = translation::RequestTimeout::get_set() {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Some(Ok(chars)) = translation::MaxBatchChars::get_set() {
            self.max_batch_chars = chars;
        }

        if let Some(Ok(width)) = translation::MaxConcurrentBatches::get_set() {
            self.max_concurrent_batches = width;
        }

        if let Some(Ok(delay)) = translation::WaveDelay::get_set() {
            self.wave_delay_ms = delay.as_millis() as u64;
        }

        if let Some(Ok(debounce)) = watcher::Debounce::get_set() {
            self.debounce_ms = debounce.as_millis() as u64;
        }

        if let Some(Ok(delay)) = watcher::AutoTranslateDelay::get_set() {
            self.auto_translate_delay_ms = delay.as_millis() as u64;
        }

        if let Some(Ok(size)) = subtitle::CueBatchSize::get_set() {
            self.cue_batch_size = size;
        }

        if let Some(Ok(chars)) = subtitle::CueBatchChars::get_set() {
            self.cue_batch_chars = chars;
        }
    }

    /// 按翻译 API 家族选择批次大小
    pub fn batch_size_for(&self, api: &str) -> usize {
        if api.eq_ignore_ascii_case("google") {
            self.google_batch_size
        } else {
            self.default_batch_size
        }
    }

    pub fn wave_delay(&self) -> Duration {
        Duration::from_millis(self.wave_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn auto_translate_delay(&self) -> Duration {
        Duration::from_millis(self.auto_translate_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: EngineConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded_path = shellexpand::tilde(path);
        let mut config = Self::load_from_file(&expanded_path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> TranslationResult<EngineConfig> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(EngineConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        Self::parse_config(path, &content)
    }

    /// 按扩展名解析配置内容，`.toml` 以外的一律视为 JSON
    fn parse_config(path: &str, content: &str) -> TranslationResult<EngineConfig> {
        if path.ends_with(".toml") {
            toml::from_str(content)
                .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = EngineConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.max_batch_chars, 1000);
        assert_eq!(config.batch_size_for("google"), 30);
        assert_eq!(config.batch_size_for("deepl"), 50);
        assert_eq!(config.max_concurrent_batches, 3);
        assert_eq!(config.debounce(), Duration::from_millis(1500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config =
            ConfigManager::parse_config("x.toml", "max_batch_chars = 400\ncue_batch_size = 10\n")
                .unwrap();
        assert_eq!(config.max_batch_chars, 400);
        assert_eq!(config.cue_batch_size, 10);
        assert_eq!(config.default_batch_size, 50);
    }

    #[test]
    fn json_config_is_accepted() {
        let config =
            ConfigManager::parse_config("x.json", r#"{"debounce_ms": 200}"#).unwrap();
        assert_eq!(config.debounce_ms, 200);
    }

    #[test]
    fn zero_sizes_fail_validation() {
        let config = EngineConfig {
            max_concurrent_batches: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TranslationError::ConfigError(_))
        ));
    }

    #[test]
    fn example_config_round_trips_through_toml() {
        let text = toml::to_string_pretty(&EngineConfig::default()).unwrap();
        let parsed: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.cue_batch_chars, 5000);
    }
}
