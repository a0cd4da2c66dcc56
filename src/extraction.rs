//! 译文提取模块
//!
//! 通过按优先级排序的候选选择器列表轮询DOM，回收译文文本，并用
//! 目标文字系统的Unicode区段校验其归属。所有特定选择器都未命中时，
//! 退而扫描标记为从右到左排版的元素。

// 标准库导入
use std::time::Duration;

// 第三方crate导入
use chromiumoxide::Element;
use tracing::debug;

// 本地模块导入
use crate::api_constants::{script_config, selector_config, timing_config};
use crate::session::AutomatedSession;

/// 判断文本是否属于目标文字系统
///
/// 逐字符扫描配置的码点区段。threshold为目标文字在非空白字符中的
/// 最低占比；0.0保持宽松策略——出现任意一个目标文字字符即判定命中。
pub fn is_target_script(text: &str, threshold: f32) -> bool {
    let mut total = 0usize;
    let mut matched = 0usize;

    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        total += 1;
        let cp = c as u32;
        if script_config::URDU_CODEPOINT_RANGES
            .iter()
            .any(|(lo, hi)| *lo <= cp && cp <= *hi)
        {
            matched += 1;
        }
    }

    if total == 0 || matched == 0 {
        return false;
    }
    matched as f32 / total as f32 >= threshold
}

/// 译文提取引擎
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    /// 目标文字占比阈值（见is_target_script）
    threshold: f32,
}

impl ExtractionEngine {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// 轮询提取译文
    ///
    /// 按固定轮数轮询，每轮完整过一遍候选选择器；全部落空返回None。
    pub async fn extract(&self, session: &AutomatedSession) -> Option<String> {
        for round in 0..timing_config::EXTRACT_POLL_ROUNDS {
            if let Some(text) = self.extract_once(session).await {
                return Some(text);
            }
            debug!(
                "🔍 第{}轮提取未命中，继续轮询",
                round + 1
            );
            tokio::time::sleep(Duration::from_millis(
                timing_config::EXTRACT_POLL_INTERVAL_MS,
            ))
            .await;
        }
        None
    }

    /// 单轮提取：先过特定选择器，再退到RTL元素扫描
    pub(crate) async fn extract_once(&self, session: &AutomatedSession) -> Option<String> {
        let page = session.page();

        for selector in selector_config::RESULT_SELECTORS {
            if let Ok(element) = page.find_element(*selector).await {
                if let Some(text) = self.qualify(&element).await {
                    debug!("📥 译文选择器命中: {}", selector);
                    return Some(text);
                }
            }
        }

        // 后备：扫描所有RTL排版元素
        if let Ok(elements) = page
            .find_elements(selector_config::RTL_FALLBACK_SELECTOR)
            .await
        {
            for element in elements {
                if let Some(text) = self.qualify(&element).await {
                    debug!("📥 RTL后备扫描命中");
                    return Some(text);
                }
            }
        }

        None
    }

    /// 校验单个元素的可见文本是否为合格译文
    async fn qualify(&self, element: &Element) -> Option<String> {
        let text = element.inner_text().await.ok()??;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if !is_target_script(trimmed, self.threshold) {
            return None;
        }
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_urdu_classifies_as_target_script() {
        assert!(is_target_script("محلہ امین آباد", 0.0));
        assert!(is_target_script("گھر", 0.0));
    }

    #[test]
    fn test_pure_latin_never_classifies() {
        assert!(!is_target_script("Near Masjid", 0.0));
        // 即使阈值为零，没有任何目标文字字符也不判定命中
        assert!(!is_target_script("hello world", 0.0));
        assert!(!is_target_script("", 0.0));
        assert!(!is_target_script("   ", 0.0));
    }

    #[test]
    fn test_permissive_rule_accepts_mixed_text() {
        // 宽松策略：单个目标文字字符即可令整串命中
        assert!(is_target_script("Aminabad محلہ road", 0.0));
    }

    #[test]
    fn test_strict_threshold_rejects_mostly_latin() {
        // 多数字符规则下，目标文字占比不足的混合文本被拒绝
        assert!(!is_target_script("Aminabad Road Near م", 0.5));
        assert!(is_target_script("محلہ امین آباد", 0.5));
    }

    #[test]
    fn test_presentation_forms_count_as_target() {
        // 阿拉伯文显现形式区段 (FB50–FDFF)
        assert!(is_target_script("\u{FB56}", 0.0));
        // 区段B (FE70–FEFF)
        assert!(is_target_script("\u{FE8D}", 0.0));
    }
}
