//! 翻译门面模块
//!
//! 对外的唯一入口：先做词表替换，未命中的词条逐个转交重试编排器走
//! 浏览器回退翻译。门面独占持有全进程唯一的自动化会话与词表，所有
//! 翻译/批量/词表变更调用都经由同一把异步互斥锁串行执行——并发调用
//! 排队依次进行，首个调用惰性创建会话（并发首调也只会创建一个）。

// 标准库导入
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

// 第三方crate导入
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::timing_config;
use crate::browser_env::BrowserEnvironment;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::extraction::ExtractionEngine;
use crate::input_controller::{InputController, TypingPolicy};
use crate::mapping::{MappingStore, Substituted};
use crate::retry::RetryOrchestrator;
use crate::session::{AutomatedSession, SessionState};
use crate::stats::ServiceStats;
use crate::stealth::StealthProfile;

/// 浏览器回退翻译器
///
/// 惰性创建并复用唯一的自动化会话；会话降级或连接丢失时丢弃，
/// 下一次调用自动重建。
pub struct BrowserFallback {
    profile: StealthProfile,
    environment: BrowserEnvironment,
    retry: RetryOrchestrator,
    session: Option<AutomatedSession>,
    /// 已解析的浏览器可执行文件（提供链只执行一次）
    resolved_executable: Option<PathBuf>,
}

impl BrowserFallback {
    pub fn from_config(config: &ServiceConfig) -> Self {
        let policy = TypingPolicy::from_millis(
            config.inter_word_delay_ms(),
            config.inter_char_delay_ms(),
        );
        let retry = RetryOrchestrator::new(
            config.max_attempts(),
            InputController::new(policy),
            ExtractionEngine::new(config.script_match_threshold()),
        );

        Self {
            profile: StealthProfile::from_config(config),
            environment: BrowserEnvironment::new(
                config.browser_executable().cloned(),
                config.browser_cache_dir(),
            ),
            retry,
            session: None,
            resolved_executable: None,
        }
    }

    /// 确保存在可用会话；环境/启动失败是仅有的致命错误来源
    async fn ensure_session(&mut self) -> Result<()> {
        let stale = matches!(
            &self.session,
            Some(s) if !s.is_alive()
                || s.state() == SessionState::Degraded
                || s.state() == SessionState::Closed
        );
        if stale {
            warn!("♻️  丢弃降级的浏览器会话，准备重建");
            if let Some(session) = self.session.take() {
                session.close().await;
            }
        }

        if self.session.is_none() {
            let executable = match &self.resolved_executable {
                Some(path) => path.clone(),
                None => {
                    let path = self.environment.ensure_browser_available().await?;
                    self.resolved_executable = Some(path.clone());
                    path
                }
            };
            let session = AutomatedSession::launch(&self.profile, &executable).await?;
            self.session = Some(session);
        }
        Ok(())
    }

    /// 翻译单个词条；远程失败在编排器内部回退为原文
    async fn translate_token(&mut self, token: &str) -> Result<String> {
        self.ensure_session().await?;

        if let Some(session) = self.session.as_mut() {
            Ok(self.retry.translate_text(session, token).await)
        } else {
            // ensure_session成功后必有会话；防御性回退
            Ok(token.to_string())
        }
    }

    async fn close(&mut self) {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }
}

/// 回退翻译引擎
///
/// 生产路径只有浏览器实现；测试通过桩实现验证"词表命中零远程交互"等
/// 性质。
pub(crate) enum FallbackEngine {
    Browser(Box<BrowserFallback>),
    #[cfg(test)]
    Stub(stub::StubFallback),
}

impl FallbackEngine {
    async fn translate_token(&mut self, token: &str) -> Result<String> {
        match self {
            FallbackEngine::Browser(fallback) => fallback.translate_token(token).await,
            #[cfg(test)]
            FallbackEngine::Stub(stub) => stub.translate_token(token).await,
        }
    }

    async fn close(&mut self) {
        match self {
            FallbackEngine::Browser(fallback) => fallback.close().await,
            #[cfg(test)]
            FallbackEngine::Stub(_) => {}
        }
    }
}

struct TranslatorState {
    mapping: MappingStore,
    fallback: FallbackEngine,
}

/// 翻译门面
pub struct AutoTranslator {
    state: Mutex<TranslatorState>,
    stats: Arc<ServiceStats>,
}

impl AutoTranslator {
    /// 创建门面；词表立即加载，浏览器会话推迟到首次需要时创建
    pub fn new(config: &ServiceConfig) -> Self {
        let mapping = MappingStore::load(config.mapping_path());
        info!("📖 词表就绪: {} 项", mapping.len());

        Self {
            state: Mutex::new(TranslatorState {
                mapping,
                fallback: FallbackEngine::Browser(Box::new(BrowserFallback::from_config(config))),
            }),
            stats: Arc::new(ServiceStats::new()),
        }
    }

    pub fn stats(&self) -> Arc<ServiceStats> {
        self.stats.clone()
    }

    /// 翻译单段文本
    ///
    /// 只有致命的环境/启动错误会以Err形式暴露；一切远程交互失败都
    /// 已在内部降级为"回退为原文"。
    pub async fn translate(&self, text: &str) -> Result<String> {
        self.stats.record_translate_request();
        let mut guard = self.state.lock().await;
        self.translate_locked(&mut guard, text).await
    }

    /// 批量翻译
    ///
    /// 保证每个输入都有且仅有一个结果条目：单条目的永久失败不影响
    /// 其余条目，各自独立回退为原文。整个批次复用同一次导航，条目
    /// 之间插入短暂停顿。
    pub async fn translate_batch(&self, texts: &[String]) -> HashMap<String, String> {
        self.stats.record_batch_request();
        let mut guard = self.state.lock().await;
        let mut results = HashMap::with_capacity(texts.len());

        for (index, text) in texts.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(Duration::from_millis(timing_config::BATCH_ITEM_PAUSE_MS))
                    .await;
            }

            let translated = match self.translate_locked(&mut guard, text).await {
                Ok(t) => t,
                Err(e) => {
                    warn!("❌ 批量条目翻译失败，回退为原文: {}", e);
                    text.clone()
                }
            };
            results.insert(text.clone(), translated);
        }

        results
    }

    async fn translate_locked(
        &self,
        state: &mut TranslatorState,
        text: &str,
    ) -> Result<String> {
        let plan = state.mapping.substitute(text);

        // 请求内记忆：同一词条只经历一次远程往返
        let mut memo: HashMap<String, String> = HashMap::new();
        let mut output = String::with_capacity(text.len());

        for segment in plan {
            match segment {
                Substituted::Mapped(mapped) => {
                    self.stats.record_mapping_hit();
                    output.push_str(&mapped);
                }
                Substituted::Passthrough(passthrough) => output.push_str(&passthrough),
                Substituted::Unmapped(token) => {
                    let translated = if let Some(hit) = memo.get(&token) {
                        self.stats.record_memo_hit();
                        hit.clone()
                    } else {
                        self.stats.record_remote_token();
                        let result = state.fallback.translate_token(&token).await?;
                        if result == token {
                            self.stats.record_identity_fallback();
                        }
                        memo.insert(token.clone(), result.clone());
                        result
                    };
                    output.push_str(&translated);
                }
            }
        }

        debug!("🔤 翻译完成: {} → {}", text, output);
        Ok(output)
    }

    /// 新增/更新词条
    pub async fn add_mapping(&self, english: &str, urdu: &str) -> Result<()> {
        let mut guard = self.state.lock().await;
        guard.mapping.upsert(english, urdu)
    }

    /// 删除词条；返回词条此前是否存在
    pub async fn remove_mapping(&self, word: &str) -> Result<bool> {
        let mut guard = self.state.lock().await;
        guard.mapping.remove(word)
    }

    /// 词表整表快照
    pub async fn mapping_snapshot(&self) -> BTreeMap<String, String> {
        let guard = self.state.lock().await;
        guard.mapping.snapshot()
    }

    /// 释放浏览器会话；可重复调用，之后的翻译调用会重建会话
    pub async fn close(&self) {
        let mut guard = self.state.lock().await;
        guard.fallback.close().await;
    }

    #[cfg(test)]
    pub(crate) fn with_stub(mapping: MappingStore, stub: stub::StubFallback) -> Self {
        Self {
            state: Mutex::new(TranslatorState {
                mapping,
                fallback: FallbackEngine::Stub(stub),
            }),
            stats: Arc::new(ServiceStats::new()),
        }
    }
}
