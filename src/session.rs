//! 自动化浏览器会话模块
//!
//! 全进程只存在一个会话实例，由翻译门面独占持有。生命周期从首次翻译
//! 请求开始，到显式关闭或不可恢复的环境故障结束。
//!
//! 状态机: Uninitialized → Launching → Ready → (Navigating ⇄ Ready) → Closed
//! Launching在驱动/启动错误时转入Failed（致命，向门面的首个调用方传播）。

// 标准库导入
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// 第三方crate导入
use chromiumoxide::browser::Browser;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::{remote_config, selector_config, timing_config};
use crate::error::Result;
use crate::stealth::StealthProfile;
use crate::translation_error;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Launching,
    Ready,
    Navigating,
    /// 远程交互连续失败后标记为降级，门面会丢弃并在下次请求时重建
    Degraded,
    Failed,
    Closed,
}

/// 自动化浏览器会话
pub struct AutomatedSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    state: SessionState,
    /// 当前是否已停留在翻译页面上
    on_translation_page: bool,
    alive: Arc<AtomicBool>,
}

impl AutomatedSession {
    /// 启动浏览器并建立CDP连接
    pub async fn launch(profile: &StealthProfile, executable: &Path) -> Result<Self> {
        info!(
            "🚀 启动浏览器会话 (headless: {}): {}",
            profile.is_headless(),
            executable.display()
        );

        let config = profile.browser_config(executable)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| translation_error!(launch, e))?;

        // 事件处理循环结束即代表浏览器断开
        let alive = Arc::new(AtomicBool::new(true));
        let alive_for_handler = alive.clone();
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            warn!("⚠️  浏览器事件循环结束，连接已断开");
            alive_for_handler.store(false, Ordering::Relaxed);
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| translation_error!(launch, e))?;

        profile.apply_session_overrides(&page).await?;

        info!("✅ 浏览器会话就绪");
        Ok(Self {
            browser,
            page,
            handler_task,
            state: SessionState::Ready,
            on_translation_page: false,
            alive,
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    pub fn on_translation_page(&self) -> bool {
        self.on_translation_page
    }

    /// 标记会话降级；持有者应当丢弃并重建
    pub fn mark_degraded(&mut self) {
        self.state = SessionState::Degraded;
    }

    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    /// 导航到翻译页面
    ///
    /// 加载页面后在有界超时内等待任一已知输入框选择器出现，再等待固定
    /// 时长让页面脚本完成初始化，最后尽力关闭Cookie/同意弹窗。
    /// 导航超时是可重试错误，不是致命错误。
    pub async fn navigate_to_translator(&mut self) -> Result<()> {
        let url = remote_config::TRANSLATE_PAGE_URL;
        self.state = SessionState::Navigating;
        self.on_translation_page = false;

        debug!("🧭 导航到翻译页面: {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| translation_error!(navigation, url, e))?;

        self.wait_for_any_element(
            selector_config::INPUT_SELECTORS,
            Duration::from_secs(timing_config::NAVIGATION_TIMEOUT_SECS),
        )
        .await
        .map_err(|_| {
            translation_error!(navigation, url, "等待输入框出现超时")
        })?;

        // 等待页面脚本初始化
        tokio::time::sleep(Duration::from_millis(timing_config::PAGE_SETTLE_MS)).await;

        self.dismiss_consent_popups().await;

        self.state = SessionState::Ready;
        self.on_translation_page = true;
        debug!("✅ 翻译页面就绪");
        Ok(())
    }

    /// 在有界超时内轮询等待任一候选选择器解析成功
    pub(crate) async fn wait_for_any_element(
        &self,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<Element> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            for selector in selectors {
                if let Ok(element) = self.page.find_element(*selector).await {
                    return Ok(element);
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(translation_error!(element, "候选选择器均未解析"));
            }
            tokio::time::sleep(Duration::from_millis(
                timing_config::ELEMENT_POLL_INTERVAL_MS,
            ))
            .await;
        }
    }

    /// 尽力关闭Cookie/同意弹窗，所有失败都被忽略
    async fn dismiss_consent_popups(&self) {
        for selector in selector_config::CONSENT_SELECTORS {
            if let Ok(element) = self.page.find_element(*selector).await {
                if element.click().await.is_ok() {
                    debug!("🍪 已关闭弹窗: {}", selector);
                    tokio::time::sleep(Duration::from_millis(
                        timing_config::POPUP_DISMISS_PAUSE_MS,
                    ))
                    .await;
                    break;
                }
            }
        }
    }

    /// 关闭会话并释放浏览器进程
    ///
    /// 先尝试优雅关闭，再等待子进程退出，最后终止事件处理任务。
    pub async fn close(mut self) {
        self.state = SessionState::Closed;
        self.alive.store(false, Ordering::Relaxed);

        if let Err(e) = self.browser.close().await {
            debug!("浏览器优雅关闭失败: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("等待浏览器进程退出失败: {}", e);
        }
        self.handler_task.abort();

        info!("👋 浏览器会话已关闭");
    }
}
