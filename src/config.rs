//! 配置管理模块
//!
//! 提供CLI参数解析和服务配置管理功能

// 标准库导入
use std::path::PathBuf;

// 第三方crate导入
use clap::Parser;

// 本地模块导入
use crate::api_constants::{script_config, service_config, timing_config};

/// 翻译服务配置结构体
///
/// 汇集HTTP监听、词表存储、浏览器会话和输入时序的全部可调参数。
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use urdu_translation_service::config::ServiceConfig;
///
/// let config = ServiceConfig::new()
///     .with_port(8080)
///     .with_headless(true)
///     .with_typing_delays(0, 0);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// 监听地址
    host: String,
    /// 监听端口
    port: u16,
    /// 词表存储文件路径
    mapping_path: PathBuf,
    /// 是否以无头模式启动浏览器
    headless: bool,
    /// 词间输入停顿（毫秒）
    inter_word_delay_ms: u64,
    /// 字符间输入停顿（毫秒）
    inter_char_delay_ms: u64,
    /// 目标文字占比阈值（0.0为宽松的"出现即命中"策略）
    script_match_threshold: f32,
    /// 单个词条的最大翻译尝试次数
    max_attempts: usize,
    /// 显式指定的浏览器可执行文件（跳过自动发现）
    browser_executable: Option<PathBuf>,
    /// 托管浏览器缓存目录（默认位于系统临时目录下）
    browser_cache_dir: Option<PathBuf>,
}

impl ServiceConfig {
    /// 创建具有默认值的配置实例
    pub fn new() -> Self {
        Self {
            host: service_config::DEFAULT_HOST.to_string(),
            port: service_config::DEFAULT_PORT,
            mapping_path: PathBuf::from(service_config::DEFAULT_MAPPING_FILE),
            headless: true,
            inter_word_delay_ms: timing_config::DEFAULT_INTER_WORD_DELAY_MS,
            inter_char_delay_ms: timing_config::DEFAULT_INTER_CHAR_DELAY_MS,
            script_match_threshold: script_config::DEFAULT_SCRIPT_MATCH_THRESHOLD,
            max_attempts: service_config::MAX_TRANSLATE_ATTEMPTS,
            browser_executable: None,
            browser_cache_dir: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn mapping_path(&self) -> &PathBuf {
        &self.mapping_path
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    pub fn inter_word_delay_ms(&self) -> u64 {
        self.inter_word_delay_ms
    }

    pub fn inter_char_delay_ms(&self) -> u64 {
        self.inter_char_delay_ms
    }

    pub fn script_match_threshold(&self) -> f32 {
        self.script_match_threshold
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn browser_executable(&self) -> Option<&PathBuf> {
        self.browser_executable.as_ref()
    }

    /// 托管浏览器缓存目录，未指定时使用系统临时目录下的固定位置
    pub fn browser_cache_dir(&self) -> PathBuf {
        self.browser_cache_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(crate::api_constants::browser_locate_config::MANAGED_CACHE_DIR)
        })
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_mapping_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.mapping_path = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// 设置输入时序；两个值都为0表示"以驱动允许的最快速度输入"
    pub fn with_typing_delays(mut self, inter_word_ms: u64, inter_char_ms: u64) -> Self {
        self.inter_word_delay_ms = inter_word_ms;
        self.inter_char_delay_ms = inter_char_ms;
        self
    }

    pub fn with_script_match_threshold(mut self, threshold: f32) -> Self {
        self.script_match_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_browser_executable<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.browser_executable = Some(path.into());
        self
    }

    pub fn with_browser_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.browser_cache_dir = Some(dir.into());
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI参数结构
#[derive(Parser)]
#[command(author, version, about = "英语→乌尔都语混合翻译服务 - 词表替换 + 浏览器自动化回退", long_about = None)]
pub struct Cli {
    /// 监听地址
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// 监听端口 (未指定时依次尝试环境变量PORT和默认值5000)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// 词表存储文件路径
    #[arg(short, long, value_name = "FILE", default_value = "mapping.json")]
    pub mapping_file: PathBuf,

    /// 以有头模式启动浏览器 (调试用)
    #[arg(long)]
    pub headed: bool,

    /// 词间输入停顿（毫秒）
    #[arg(long, default_value = "120")]
    pub inter_word_delay: u64,

    /// 字符间输入停顿（毫秒，0表示全速输入）
    #[arg(long, default_value = "45")]
    pub inter_char_delay: u64,

    /// 目标文字占比阈值 (0.0为宽松策略)
    #[arg(long, default_value = "0.0")]
    pub script_threshold: f32,

    /// 显式指定浏览器可执行文件路径
    #[arg(long, value_name = "FILE")]
    pub browser: Option<PathBuf>,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// 解析最终监听端口：命令行 > 环境变量PORT > 默认值
    pub fn resolve_port(&self) -> u16 {
        if let Some(port) = self.port {
            return port;
        }
        if let Ok(raw) = std::env::var("PORT") {
            if let Ok(port) = raw.parse::<u16>() {
                return port;
            }
        }
        service_config::DEFAULT_PORT
    }

    /// 由CLI参数构建服务配置
    pub fn to_service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::new()
            .with_host(&self.host)
            .with_port(self.resolve_port())
            .with_mapping_path(&self.mapping_file)
            .with_headless(!self.headed)
            .with_typing_delays(self.inter_word_delay, self.inter_char_delay)
            .with_script_match_threshold(self.script_threshold);

        if let Some(browser) = &self.browser {
            config = config.with_browser_executable(browser);
        }

        config
    }
}
