//! 浏览器环境提供模块
//!
//! 此模块负责：
//! - 在服务首次使用前发现或提供一个可用的Chrome/Chromium可执行文件
//! - 按严格顺序执行回退链：托管缓存 → PATH搜索 → 常见安装位置 → 下载固定版本
//! - 回退链全部耗尽时返回致命错误（没有浏览器就没有翻译能力）
//!
//! 提供动作只在启动/首次使用时执行一次，绝不在请求处理中途静默重试。

// 标准库导入
use std::path::{Path, PathBuf};

// 第三方crate导入
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::browser_locate_config;
use crate::error::Result;
use crate::translation_error;

/// 浏览器环境
#[derive(Debug, Clone)]
pub struct BrowserEnvironment {
    /// 显式指定的可执行文件（跳过回退链）
    explicit_executable: Option<PathBuf>,
    /// 托管下载缓存目录
    cache_dir: PathBuf,
}

impl BrowserEnvironment {
    pub fn new(explicit_executable: Option<PathBuf>, cache_dir: PathBuf) -> Self {
        Self {
            explicit_executable,
            cache_dir,
        }
    }

    /// 确保存在可用的浏览器可执行文件，返回其路径
    ///
    /// 回退链按固定顺序尝试，第一个成功者即被采用。
    pub async fn ensure_browser_available(&self) -> Result<PathBuf> {
        if let Some(explicit) = &self.explicit_executable {
            if explicit.is_file() {
                info!("🔧 使用显式指定的浏览器: {}", explicit.display());
                return Ok(explicit.clone());
            }
            warn!(
                "⚠️  显式指定的浏览器不存在，转入自动发现: {}",
                explicit.display()
            );
        }

        let mut failures: Vec<String> = Vec::new();

        // 1. 托管缓存：之前下载过的固定版本（无需网络）
        if let Some(path) = self.probe_managed_cache() {
            info!("✅ 命中托管浏览器缓存: {}", path.display());
            return Ok(path);
        }
        failures.push("托管缓存为空".to_string());

        // 2. PATH搜索
        if let Some(path) = search_path() {
            info!("✅ 在PATH中找到浏览器: {}", path.display());
            return Ok(path);
        }
        failures.push("PATH中未找到".to_string());

        // 3. 平台常见安装位置
        if let Some(path) = search_well_known_locations() {
            info!("✅ 在常见安装位置找到浏览器: {}", path.display());
            return Ok(path);
        }
        failures.push("常见安装位置未找到".to_string());

        // 4. 最后手段：下载并解压固定版本
        info!("⬇️  本机未发现浏览器，下载固定版本到托管缓存...");
        match self.download_pinned_revision().await {
            Ok(path) => {
                info!("✅ 浏览器下载完成: {}", path.display());
                Ok(path)
            }
            Err(e) => {
                failures.push(format!("下载失败: {}", e));
                Err(translation_error!(provision, failures.join("; ")))
            }
        }
    }

    /// 探测托管缓存目录中是否已有可执行文件（不触网）
    fn probe_managed_cache(&self) -> Option<PathBuf> {
        if !self.cache_dir.is_dir() {
            return None;
        }
        scan_for_executable(&self.cache_dir, 4)
    }

    /// 下载固定版本的浏览器到托管缓存目录
    async fn download_pinned_revision(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.cache_dir)
            .map_err(|e| translation_error!(provision, format!("创建缓存目录失败: {}", e)))?;

        let options = BrowserFetcherOptions::builder()
            .with_path(&self.cache_dir)
            .build()
            .map_err(|e| translation_error!(provision, format!("下载器配置失败: {}", e)))?;

        let fetcher = BrowserFetcher::new(options);
        let info = fetcher
            .fetch()
            .await
            .map_err(|e| translation_error!(provision, format!("固定版本下载失败: {}", e)))?;

        Ok(info.executable_path)
    }
}

/// 在进程PATH中搜索已知的可执行文件名
fn search_path() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;

    for dir in std::env::split_paths(&path_var) {
        for name in browser_locate_config::EXECUTABLE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// 在平台特定的常见安装位置搜索
fn search_well_known_locations() -> Option<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        browser_locate_config::WELL_KNOWN_MACOS
    } else if cfg!(target_os = "windows") {
        browser_locate_config::WELL_KNOWN_WINDOWS
    } else {
        browser_locate_config::WELL_KNOWN_LINUX
    };

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// 在目录树中寻找浏览器可执行文件（深度受限的小型扫描）
fn scan_for_executable(dir: &Path, depth: usize) -> Option<PathBuf> {
    if depth == 0 {
        return None;
    }

    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let is_browser = if cfg!(target_os = "windows") {
                    name.eq_ignore_ascii_case("chrome.exe")
                } else {
                    name == "chrome" || name == "chromium" || name == "Chromium"
                };
                if is_browser {
                    debug!("缓存扫描命中: {}", path.display());
                    return Some(path);
                }
            }
        } else if path.is_dir() {
            subdirs.push(path);
        }
    }

    for sub in subdirs {
        if let Some(found) = scan_for_executable(&sub, depth - 1) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_lists_are_non_empty() {
        assert!(!browser_locate_config::WELL_KNOWN_LINUX.is_empty());
        assert!(!browser_locate_config::WELL_KNOWN_MACOS.is_empty());
        assert!(!browser_locate_config::WELL_KNOWN_WINDOWS.is_empty());
        assert!(!browser_locate_config::EXECUTABLE_NAMES.is_empty());
    }

    #[test]
    fn test_scan_finds_planted_executable() {
        let root = std::env::temp_dir().join("browser_env_scan_test");
        let nested = root.join("linux-1381561").join("chrome-linux");
        std::fs::create_dir_all(&nested).unwrap();

        let exe_name = if cfg!(target_os = "windows") {
            "chrome.exe"
        } else {
            "chrome"
        };
        let exe = nested.join(exe_name);
        std::fs::write(&exe, b"fake").unwrap();

        let found = scan_for_executable(&root, 4);
        assert_eq!(found, Some(exe));

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_scan_respects_depth_limit() {
        let root = std::env::temp_dir().join("browser_env_depth_test");
        let nested = root.join("a").join("b").join("c").join("d");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("chrome"), b"fake").unwrap();

        // 可执行文件位于第5层，深度4扫描不到
        assert!(scan_for_executable(&root, 4).is_none());

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_probe_missing_cache_dir_returns_none() {
        let env = BrowserEnvironment::new(
            None,
            std::env::temp_dir().join("browser_env_cache_that_does_not_exist"),
        );
        assert!(env.probe_managed_cache().is_none());
    }
}
