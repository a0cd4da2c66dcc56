use std::time::Duration;

use anyhow::Result;
use url::Url;

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证远程翻译页面地址
pub fn validate_remote_page_url(input: &str) -> Result<Url> {
    let url = Url::parse(input)?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("远程页面地址必须以http://或https://开头: {}", input);
    }
    Ok(url)
}

/// 将耗时转换为保留两位小数的秒数（HTTP响应中的processing_time字段）
pub fn round_processing_time(duration: Duration) -> f64 {
    (duration.as_secs_f64() * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_page_url_validation() {
        assert!(validate_remote_page_url("https://translate.google.com").is_ok());
        assert!(validate_remote_page_url("http://localhost:9000").is_ok());
        assert!(validate_remote_page_url("ftp://example.com").is_err());
        assert!(validate_remote_page_url("not a url").is_err());
    }

    #[test]
    fn test_processing_time_rounding() {
        assert_eq!(round_processing_time(Duration::from_millis(1234)), 1.23);
        assert_eq!(round_processing_time(Duration::from_millis(1235)), 1.24);
        assert_eq!(round_processing_time(Duration::from_secs(2)), 2.0);
    }
}
