//! 浏览器隐匿启动配置模块
//!
//! 产出一份抑制自动化痕迹的固定启动配置：无头开关、容器环境下关闭
//! 沙箱、关闭GPU渲染、固定窗口尺寸、抑制自动化控制标记、按宿主系统
//! 选择真实浏览器User-Agent、设置与源语言一致的Accept-Language。
//!
//! 连接建立后还会注册两段文档级注入脚本（每会话一次，先于所有页面
//! 加载执行）：清除navigator.webdriver标记、覆盖语言列表。

// 标准库导入
use std::path::Path;

// 第三方crate导入
use chromiumoxide::browser::BrowserConfig;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use tracing::debug;

// 本地模块导入
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::translation_error;

/// 固定窗口尺寸
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 900;

/// 抑制自动化痕迹的启动参数
const STEALTH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--no-sandbox",
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-dev-shm-usage",
    "--disable-infobars",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-extensions",
    "--mute-audio",
    "--accept-lang=en-US,en",
];

/// 清除navigator.webdriver自动化标记
const CLEAR_WEBDRIVER_FLAG_JS: &str =
    "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// 覆盖浏览器上报的语言列表，与Accept-Language保持一致
const OVERRIDE_LANGUAGES_JS: &str =
    "Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });";

/// 隐匿启动配置
#[derive(Debug, Clone)]
pub struct StealthProfile {
    headless: bool,
}

impl StealthProfile {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            headless: config.is_headless(),
        }
    }

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// 构建浏览器启动配置
    pub fn browser_config(&self, executable: &Path) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable.to_path_buf())
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .args(STEALTH_ARGS.iter().copied())
            .arg(format!("--user-agent={}", user_agent_for_host()));

        if !self.headless {
            builder = builder.with_head();
        }

        builder
            .build()
            .map_err(|e| translation_error!(launch, format!("启动配置构建失败: {}", e)))
    }

    /// 注册每会话一次的文档级注入脚本
    ///
    /// 通过Page.addScriptToEvaluateOnNewDocument注册，后续每次页面
    /// 加载前都会先执行，无需按页重复注入。
    pub async fn apply_session_overrides(&self, page: &Page) -> Result<()> {
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            CLEAR_WEBDRIVER_FLAG_JS,
        ))
        .await
        .map_err(|e| translation_error!(launch, format!("webdriver标记注入失败: {}", e)))?;

        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(
            OVERRIDE_LANGUAGES_JS,
        ))
        .await
        .map_err(|e| translation_error!(launch, format!("语言列表注入失败: {}", e)))?;

        debug!("🕶️  会话级隐匿脚本注册完成");
        Ok(())
    }
}

/// 按宿主系统选择真实浏览器User-Agent
fn user_agent_for_host() -> &'static str {
    if cfg!(target_os = "windows") {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
    } else if cfg!(target_os = "macos") {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
    } else {
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
    }
}
