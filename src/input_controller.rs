//! 翻译输入控制模块
//!
//! 此模块负责：
//! - 按优先级依次尝试候选选择器定位输入框（第一个可交互者生效）
//! - 通过全选+删除按键序列清空已有内容，并以直接清空value作为后备
//! - 逐词、逐字符地发送文本，在词间与字符间插入可配置的停顿，
//!   模拟人工输入以降低反自动化阻力

// 标准库导入
use std::time::Duration;

// 第三方crate导入
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType,
};
use chromiumoxide::{Element, Page};
use tracing::debug;

// 本地模块导入
use crate::api_constants::{selector_config, timing_config};
use crate::error::Result;
use crate::session::AutomatedSession;
use crate::translation_error;

/// Ctrl/⌘修饰键位掩码（CDP Input域定义: Alt=1, Ctrl=2, Meta=4, Shift=8）
fn select_all_modifier() -> i64 {
    if cfg!(target_os = "macos") {
        4
    } else {
        2
    }
}

/// 直接清空输入框内容的后备脚本
const CLEAR_VALUE_JS: &str =
    "function() { this.value = ''; this.dispatchEvent(new Event('input', { bubbles: true })); }";

/// 输入时序策略
///
/// 两个停顿都为零是合法配置，含义是"以驱动允许的最快速度输入"，
/// 测试中注入零停顿即可获得确定性行为。
#[derive(Debug, Clone, Copy)]
pub struct TypingPolicy {
    /// 词间停顿
    pub inter_word_delay: Duration,
    /// 词内字符间停顿
    pub inter_char_delay: Duration,
}

impl TypingPolicy {
    pub fn from_millis(inter_word_ms: u64, inter_char_ms: u64) -> Self {
        Self {
            inter_word_delay: Duration::from_millis(inter_word_ms),
            inter_char_delay: Duration::from_millis(inter_char_ms),
        }
    }

    /// 默认的拟人停顿
    pub fn humanized() -> Self {
        Self::from_millis(
            timing_config::DEFAULT_INTER_WORD_DELAY_MS,
            timing_config::DEFAULT_INTER_CHAR_DELAY_MS,
        )
    }

    /// 全速输入（无停顿）
    pub fn instant() -> Self {
        Self::from_millis(0, 0)
    }
}

/// 翻译输入控制器
#[derive(Debug, Clone)]
pub struct InputController {
    policy: TypingPolicy,
}

impl InputController {
    pub fn new(policy: TypingPolicy) -> Self {
        Self { policy }
    }

    /// 向翻译页面提交文本
    ///
    /// 提交完成后等待固定时长，让远端渲染出译文。
    pub async fn submit(&self, session: &AutomatedSession, text: &str) -> Result<()> {
        let element = self.locate_input(session).await?;
        self.clear_input(session.page(), &element).await?;
        self.type_like_human(session.page(), text).await?;

        tokio::time::sleep(Duration::from_millis(timing_config::RESULT_SETTLE_MS)).await;
        Ok(())
    }

    /// 软恢复动作：点击页面空白处后重新聚焦输入框
    pub async fn refocus(&self, session: &AutomatedSession) -> Result<()> {
        if let Ok(body) = session.page().find_element("body").await {
            let _ = body.click().await;
        }
        self.locate_input(session).await.map(|_| ())
    }

    /// 按优先级定位第一个可交互的输入框
    async fn locate_input(&self, session: &AutomatedSession) -> Result<Element> {
        for selector in selector_config::INPUT_SELECTORS {
            match session.page().find_element(*selector).await {
                Ok(element) => {
                    // 点击成功即认为可交互，同时完成聚焦
                    if element.click().await.is_ok() {
                        debug!("⌨️  输入框命中: {}", selector);
                        return Ok(element);
                    }
                }
                Err(_) => continue,
            }
        }
        Err(translation_error!(element, "输入框"))
    }

    /// 清空输入框：全选+删除按键序列，再以直接清空value兜底
    async fn clear_input(&self, page: &Page, element: &Element) -> Result<()> {
        self.press_select_all(page).await?;
        self.press_delete(page).await?;

        // 后备：部分输入组件不响应合成按键
        if let Err(e) = element.call_js_fn(CLEAR_VALUE_JS, false).await {
            debug!("value清空后备动作失败（忽略）: {}", e);
        }
        Ok(())
    }

    /// 逐字符发送文本
    ///
    /// 空格视为词边界，使用词间停顿；其余字符使用字符间停顿。
    async fn type_like_human(&self, page: &Page, text: &str) -> Result<()> {
        for c in text.chars() {
            self.dispatch_char(page, c).await?;

            let delay = if c == ' ' {
                self.policy.inter_word_delay
            } else {
                self.policy.inter_char_delay
            };
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    /// 通过CDP按键事件发送单个字符
    async fn dispatch_char(&self, page: &Page, c: char) -> Result<()> {
        let key_down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .text(c.to_string())
            .build()
            .map_err(|e| translation_error!(automation, e))?;
        page.execute(key_down)
            .await
            .map_err(|e| translation_error!(automation, format!("keyDown失败: {}", e)))?;

        let key_up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .build()
            .map_err(|e| translation_error!(automation, e))?;
        page.execute(key_up)
            .await
            .map_err(|e| translation_error!(automation, format!("keyUp失败: {}", e)))?;

        Ok(())
    }

    /// 发送全选按键组合
    async fn press_select_all(&self, page: &Page) -> Result<()> {
        let modifier = select_all_modifier();

        let key_down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::RawKeyDown)
            .modifiers(modifier)
            .key("a")
            .code("KeyA")
            .windows_virtual_key_code(65)
            .build()
            .map_err(|e| translation_error!(automation, e))?;
        page.execute(key_down)
            .await
            .map_err(|e| translation_error!(automation, format!("全选keyDown失败: {}", e)))?;

        let key_up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .modifiers(modifier)
            .key("a")
            .code("KeyA")
            .build()
            .map_err(|e| translation_error!(automation, e))?;
        page.execute(key_up)
            .await
            .map_err(|e| translation_error!(automation, format!("全选keyUp失败: {}", e)))?;

        Ok(())
    }

    /// 发送删除键
    async fn press_delete(&self, page: &Page) -> Result<()> {
        let key_down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::RawKeyDown)
            .key("Delete")
            .code("Delete")
            .windows_virtual_key_code(46)
            .build()
            .map_err(|e| translation_error!(automation, e))?;
        page.execute(key_down)
            .await
            .map_err(|e| translation_error!(automation, format!("删除keyDown失败: {}", e)))?;

        let key_up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key("Delete")
            .code("Delete")
            .build()
            .map_err(|e| translation_error!(automation, e))?;
        page.execute(key_up)
            .await
            .map_err(|e| translation_error!(automation, format!("删除keyUp失败: {}", e)))?;

        Ok(())
    }
}
