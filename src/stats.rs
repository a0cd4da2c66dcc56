use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// 服务运行统计
///
/// 所有计数器都是进程级累计值，由各请求路径在持有翻译互斥锁之外
/// 原子地更新。
#[derive(Debug, Default)]
pub struct ServiceStats {
    /// 单条翻译请求总数
    pub translate_requests: AtomicU64,
    /// 批量翻译请求总数
    pub batch_requests: AtomicU64,
    /// 词表直接命中的词条数
    pub mapping_hits: AtomicU64,
    /// 经远程回退翻译的词条数
    pub remote_tokens: AtomicU64,
    /// 请求内重复词条的记忆命中数
    pub memo_hits: AtomicU64,
    /// 最终回退为原文的词条数
    pub identity_fallbacks: AtomicU64,
}

impl ServiceStats {
    /// 创建新的统计实例
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_translate_request(&self) {
        self.translate_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_batch_request(&self) {
        self.batch_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mapping_hit(&self) {
        self.mapping_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_token(&self) {
        self.remote_tokens.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_memo_hit(&self) {
        self.memo_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_identity_fallback(&self) {
        self.identity_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// 打印统计摘要
    pub fn log_summary(&self) {
        let mapping = self.mapping_hits.load(Ordering::Relaxed);
        let remote = self.remote_tokens.load(Ordering::Relaxed);
        let total = mapping + remote;

        tracing::info!("📊 服务统计:");
        tracing::info!(
            "   请求: {} 条 / 批量 {} 次",
            self.translate_requests.load(Ordering::Relaxed),
            self.batch_requests.load(Ordering::Relaxed)
        );
        tracing::info!("   词表命中: {} 项", mapping);
        tracing::info!("   远程翻译: {} 项", remote);
        tracing::info!(
            "   记忆命中: {} 项",
            self.memo_hits.load(Ordering::Relaxed)
        );
        tracing::info!(
            "   回退原文: {} 项",
            self.identity_fallbacks.load(Ordering::Relaxed)
        );

        if total > 0 {
            let hit_rate = mapping as f64 / total as f64 * 100.0;
            tracing::info!("   词表命中率: {:.1}%", hit_rate);
        }
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let stats = ServiceStats::new();
        stats.record_mapping_hit();
        stats.record_mapping_hit();
        stats.record_remote_token();
        assert_eq!(stats.mapping_hits.load(Ordering::Relaxed), 2);
        assert_eq!(stats.remote_tokens.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }
}
