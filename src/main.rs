//! 命令行主程序入口

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use ultra_translate::env::{core::LogLevel, generate_env_docs, EnvVar};
use ultra_translate::html::html_to_dom;
use ultra_translate::serialize_document;
use ultra_translate::subtitle::{bilingual_vtt, parse_captions, CueTranslator};
use ultra_translate::translation::{
    ConfigManager, DispatchConfig, Dispatcher, EngineConfig, HttpBackend, Settings,
    TranslationError, TranslationResult, TranslationSession,
};
use ultra_translate::vtt::serialize_vtt;

#[derive(Parser, Debug)]
#[command(name = "ultra-translate", version, about)]
struct Cli {
    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Engine configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Translate a saved HTML page
    Page {
        input: PathBuf,
        /// Translation endpoint, defaults to the configured api_url
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Target language
        #[arg(short, long, default_value = "zh-CN")]
        target: String,
        /// Replace the original text instead of showing both
        #[arg(long)]
        replace: bool,
        /// Page URL, used for excluded-site matching
        #[arg(long)]
        url: Option<String>,
        /// Newline-separated excluded site fragments
        #[arg(long, default_value = "")]
        excluded_sites: String,
    },
    /// Translate a WebVTT or SRT caption file into WebVTT
    Captions {
        input: PathBuf,
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(short, long, default_value = "zh-CN")]
        target: String,
        /// Keep the original line under each translated cue
        #[arg(long)]
        bilingual: bool,
    },
    /// Write an example configuration file
    InitConfig {
        #[arg(default_value = "ultra-translate.toml")]
        path: String,
    },
    /// Print the supported environment variables
    EnvDocs,
}

fn init_logging(level: Option<&str>) {
    let level = level
        .map(str::to_string)
        .unwrap_or_else(|| LogLevel::get().unwrap_or_else(|_| "info".to_string()));
    let level = level.parse::<tracing::Level>().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&str>) -> TranslationResult<EngineConfig> {
    let manager = match path {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };
    Ok(manager.into_config())
}

fn backend(config: &EngineConfig, endpoint: Option<String>) -> TranslationResult<HttpBackend> {
    let endpoint = endpoint.unwrap_or_else(|| config.api_url.clone());
    HttpBackend::new(endpoint, config.request_timeout())
}

fn write_output(out: Option<PathBuf>, data: &[u8]) -> TranslationResult<()> {
    match out {
        Some(path) => fs::write(&path, data)?,
        None => io::stdout().write_all(data)?,
    }
    Ok(())
}

async fn run(command: Command, config: EngineConfig) -> TranslationResult<()> {
    match command {
        Command::Page {
            input,
            endpoint,
            out,
            target,
            replace,
            url,
            excluded_sites,
        } => {
            let data = fs::read(&input)?;
            let dom = html_to_dom(&data, "utf-8".to_string());
            let settings = Settings {
                target_language: target,
                preserve_original: !replace,
                excluded_sites,
                ..Settings::default()
            };
            settings.validate()?;

            let backend = backend(&config, endpoint)?;
            let mut session = TranslationSession::new(dom.document.clone(), backend, config, settings);
            if let Some(url) = url {
                session = session.with_page_url(url);
            }

            if session.should_translate_page() {
                if let Some(report) = session.translate_page().await {
                    tracing::info!(
                        "页面翻译完成: {} 个片段, {} 个批次, 替换 {} 处, 失败 {} 个批次",
                        report.units,
                        report.batches,
                        report.substituted,
                        report.failed_batches
                    );
                }
            }

            let html = serialize_document(&dom, "utf-8")?;
            write_output(out, &html)
        }
        Command::Captions {
            input,
            endpoint,
            out,
            target,
            bilingual,
        } => {
            let content = fs::read_to_string(&input)?;
            let cues = parse_captions(&content);
            if cues.is_empty() {
                return Err(TranslationError::ParseError(format!(
                    "没有可用的字幕: {}",
                    input.display()
                )));
            }

            let settings = Settings {
                target_language: target,
                ..Settings::default()
            };
            let translator = CueTranslator::from_config(&config);
            let dispatcher = Dispatcher::new(backend(&config, endpoint)?, DispatchConfig::from_engine(&config));
            let result = translator.translate(&dispatcher, &cues, &settings).await;

            let vtt = if bilingual {
                bilingual_vtt(&result.cues)
            } else {
                let cues: Vec<_> = result.cues.iter().map(|cue| cue.to_cue(cue.text.clone())).collect();
                serialize_vtt(&cues)
            };
            write_output(out, vtt.as_bytes())
        }
        Command::InitConfig { path } => {
            ConfigManager::generate_example_config(&path)?;
            tracing::info!("已生成示例配置文件: {}", path);
            Ok(())
        }
        Command::EnvDocs => write_output(None, generate_env_docs().as_bytes()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let config = match &cli.command {
        Command::InitConfig { .. } | Command::EnvDocs => EngineConfig::default(),
        _ => match load_config(cli.config.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
    };

    // 会话只在单线程上运行
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli.command, config)) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
