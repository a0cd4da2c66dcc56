//! 重试编排模块
//!
//! 将"提交+提取"包装为有界尝试的状态机：
//! `Attempting(n) → Success | Attempting(n+1) | GiveUp`，上限3次。
//!
//! 每次尝试都要求会话位于翻译页面（必要时先导航），提取结果必须非空
//! 且不同于提交文本。软失败（译文为空/与原文相同）先执行一次轻量恢复
//! 动作再进入下一轮；硬失败（元素丢失/导航失败）从头重新导航。
//! 耗尽全部尝试后返回原文——翻译回退为恒等，绝不向调用方抛错。

// 第三方crate导入
use tracing::{debug, info, warn};

// 本地模块导入
use crate::error::{RemoteOutcome, TranslationError};
use crate::extraction::ExtractionEngine;
use crate::input_controller::InputController;
use crate::session::AutomatedSession;

/// 单次尝试记录（仅在一次请求的生命周期内存在，用于调试日志）
#[derive(Debug)]
pub struct TranslationAttempt {
    /// 尝试序号 (0..N-1)
    pub index: usize,
    /// 提交文本
    pub submitted: String,
    /// 提取到的文本（若有）
    pub extracted: Option<String>,
    /// 失败原因（若有）
    pub failure: Option<String>,
}

/// 状态机的下一步动作
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum NextStep {
    /// 得到有效译文，结束
    Done,
    /// 进入下一轮尝试；硬失败时先从头重新导航
    Retry { renavigate: bool },
    /// 尝试耗尽，回退为原文
    GiveUp,
    /// 会话不可用，放弃剩余尝试并回退为原文
    Abort,
}

/// 根据单步结果与剩余额度决定状态转移
pub(crate) fn next_step(
    outcome: &RemoteOutcome,
    attempt_index: usize,
    max_attempts: usize,
) -> NextStep {
    match outcome {
        RemoteOutcome::Success(_) => NextStep::Done,
        RemoteOutcome::Retryable { hard, .. } => {
            if attempt_index + 1 < max_attempts {
                NextStep::Retry { renavigate: *hard }
            } else {
                NextStep::GiveUp
            }
        }
        RemoteOutcome::Fatal(_) => NextStep::Abort,
    }
}

/// 合格译文判定：非空且与提交文本不同
pub(crate) fn is_acceptable_result(submitted: &str, extracted: &str) -> bool {
    let extracted = extracted.trim();
    !extracted.is_empty() && extracted != submitted
}

/// 将操作错误归类为单步结果
fn classify_error(error: TranslationError) -> RemoteOutcome {
    match &error {
        TranslationError::ConnectionLost { .. } => RemoteOutcome::Fatal(error.to_string()),
        _ if error.is_fatal() => RemoteOutcome::Fatal(error.to_string()),
        // 导航失败、元素丢失、指令失败都按硬失败重试
        _ => RemoteOutcome::Retryable {
            reason: error.to_string(),
            hard: true,
        },
    }
}

/// 重试编排器
#[derive(Debug, Clone)]
pub struct RetryOrchestrator {
    max_attempts: usize,
    input: InputController,
    extraction: ExtractionEngine,
}

impl RetryOrchestrator {
    pub fn new(max_attempts: usize, input: InputController, extraction: ExtractionEngine) -> Self {
        Self {
            max_attempts,
            input,
            extraction,
        }
    }

    /// 翻译单段文本，失败时回退为原文
    pub async fn translate_text(&self, session: &mut AutomatedSession, text: &str) -> String {
        let mut attempts: Vec<TranslationAttempt> = Vec::new();

        for index in 0..self.max_attempts {
            if !session.is_alive() {
                warn!("⚠️  浏览器连接已丢失，放弃剩余尝试");
                session.mark_degraded();
                break;
            }

            let outcome = self.run_attempt(session, text).await;
            record_attempt(&mut attempts, index, text, &outcome);

            match next_step(&outcome, index, self.max_attempts) {
                NextStep::Done => {
                    if let RemoteOutcome::Success(translated) = outcome {
                        debug!("✅ 第{}次尝试成功", index + 1);
                        return translated;
                    }
                }
                NextStep::Retry { renavigate } => {
                    warn!(
                        "❌ 尝试失败 ({}/{})，准备重试",
                        index + 1,
                        self.max_attempts
                    );
                    if renavigate {
                        // 硬失败：从头重新导航，失败留给下一轮尝试处理
                        let _ = session.navigate_to_translator().await;
                    }
                }
                NextStep::GiveUp => break,
                NextStep::Abort => {
                    session.mark_degraded();
                    break;
                }
            }
        }

        info!("🔁 未得到有效译文，回退为原文: {:?}", attempt_summary(&attempts));
        text.to_string()
    }

    /// 执行单次完整尝试：确保页面 → 提交 → 提取（含一次软恢复）
    async fn run_attempt(&self, session: &mut AutomatedSession, text: &str) -> RemoteOutcome {
        if !session.on_translation_page() {
            if let Err(e) = session.navigate_to_translator().await {
                return classify_error(e);
            }
        }

        if let Err(e) = self.input.submit(session, text).await {
            return classify_error(e);
        }

        if let Some(extracted) = self.extraction.extract(session).await {
            if is_acceptable_result(text, &extracted) {
                return RemoteOutcome::Success(extracted);
            }
        }

        // 软恢复：点击空白处再聚焦回输入框，然后补一次提取
        if self.input.refocus(session).await.is_ok() {
            if let Some(extracted) = self.extraction.extract_once(session).await {
                if is_acceptable_result(text, &extracted) {
                    debug!("✅ 软恢复后提取成功");
                    return RemoteOutcome::Success(extracted);
                }
            }
        }

        RemoteOutcome::Retryable {
            reason: "译文为空或与原文相同".to_string(),
            hard: false,
        }
    }
}

fn record_attempt(
    attempts: &mut Vec<TranslationAttempt>,
    index: usize,
    submitted: &str,
    outcome: &RemoteOutcome,
) {
    let (extracted, failure) = match outcome {
        RemoteOutcome::Success(t) => (Some(t.clone()), None),
        RemoteOutcome::Retryable { reason, .. } => (None, Some(reason.clone())),
        RemoteOutcome::Fatal(reason) => (None, Some(reason.clone())),
    };
    attempts.push(TranslationAttempt {
        index,
        submitted: submitted.to_string(),
        extracted,
        failure,
    });
}

fn attempt_summary(attempts: &[TranslationAttempt]) -> Vec<String> {
    attempts
        .iter()
        .map(|a| {
            format!(
                "#{}: {}",
                a.index + 1,
                a.failure.as_deref().unwrap_or("ok")
            )
        })
        .collect()
}
