/// 远程翻译页面相关配置常量
///
/// 该文件定义了远程翻译页面、页面元素选择器、时序参数和文字系统检测
/// 相关的所有常量，方便统一管理和维护
/// 远程翻译页面配置
pub mod remote_config {
    /// 远程翻译页面地址（源语言/目标语言固定）
    pub const TRANSLATE_PAGE_URL: &str =
        "https://translate.google.com/?sl=en&tl=ur&op=translate";

    /// 源语言代码
    pub const SOURCE_LANG: &str = "en";

    /// 目标语言代码
    pub const TARGET_LANG: &str = "ur";
}

/// 页面元素选择器配置
///
/// 远程页面的DOM结构没有任何契约保证，因此每类元素都维护一个
/// 按优先级排序的候选选择器列表，运行时依次尝试，第一个命中即生效。
/// 新增选择器只需要扩充列表，不需要改动控制流。
pub mod selector_config {
    /// 输入框候选选择器（按优先级排序）
    pub const INPUT_SELECTORS: &[&str] = &[
        "textarea[aria-label='Source text']",
        "textarea.er8xn",
        "textarea[jsname='BJE2fc']",
        "div[contenteditable='true']",
        "textarea",
    ];

    /// 译文容器候选选择器（按优先级排序）
    pub const RESULT_SELECTORS: &[&str] = &[
        "span[jsname='W297wb']",
        "span.ryNqvb",
        "div[jsname='esnxob']",
        "span[lang='ur']",
        "div[aria-live='polite'] span",
    ];

    /// Cookie/同意弹窗候选选择器（尽力而为，点击失败直接忽略）
    pub const CONSENT_SELECTORS: &[&str] = &[
        "button#L2AGLb",
        "button[aria-label='Accept all']",
        "button[aria-label='Reject all']",
        "div.QS5gu.sy4vM",
    ];

    /// 所有特定译文选择器都未命中时，扫描标记为从右到左排版的元素
    pub const RTL_FALLBACK_SELECTOR: &str = "[dir='rtl']";
}

/// 时序配置
pub mod timing_config {
    /// 页面导航超时（秒）
    pub const NAVIGATION_TIMEOUT_SECS: u64 = 15;

    /// 等待输入框出现时的轮询间隔（毫秒）
    pub const ELEMENT_POLL_INTERVAL_MS: u64 = 250;

    /// 导航完成后等待页面脚本初始化的固定时长（毫秒）
    pub const PAGE_SETTLE_MS: u64 = 2000;

    /// 文本提交后等待远端渲染译文的固定时长（毫秒）
    pub const RESULT_SETTLE_MS: u64 = 2000;

    /// 译文提取的轮询轮数
    pub const EXTRACT_POLL_ROUNDS: usize = 6;

    /// 译文提取的轮询间隔（毫秒）
    pub const EXTRACT_POLL_INTERVAL_MS: u64 = 500;

    /// 默认词间输入停顿（毫秒）
    pub const DEFAULT_INTER_WORD_DELAY_MS: u64 = 120;

    /// 默认字符间输入停顿（毫秒）
    pub const DEFAULT_INTER_CHAR_DELAY_MS: u64 = 45;

    /// 批量翻译时条目之间的停顿（毫秒）
    pub const BATCH_ITEM_PAUSE_MS: u64 = 300;

    /// 弹窗点击后的短暂停顿（毫秒）
    pub const POPUP_DISMISS_PAUSE_MS: u64 = 300;
}

/// 目标文字系统（乌尔都语）的Unicode区段配置
pub mod script_config {
    /// 乌尔都语使用的阿拉伯文字Unicode码点区段（闭区间）
    pub const URDU_CODEPOINT_RANGES: &[(u32, u32)] = &[
        (0x0600, 0x06FF), // Arabic
        (0x0750, 0x077F), // Arabic Supplement
        (0x08A0, 0x08FF), // Arabic Extended-A
        (0xFB50, 0xFDFF), // Arabic Presentation Forms-A
        (0xFE70, 0xFEFF), // Arabic Presentation Forms-B
    ];

    /// 默认的目标文字占比阈值
    ///
    /// 0.0 表示宽松策略：只要出现任意一个目标文字字符即判定整串命中。
    /// 需要更严格的"多数字符"规则时可在配置中调高该比例。
    pub const DEFAULT_SCRIPT_MATCH_THRESHOLD: f32 = 0.0;
}

/// 服务限制与默认值
pub mod service_config {
    /// 健康检查返回的服务名
    pub const SERVICE_NAME: &str = "translation";

    /// 批量翻译单次请求的条目上限
    pub const MAX_BATCH_SIZE: usize = 10;

    /// 单个词条的最大翻译尝试次数
    pub const MAX_TRANSLATE_ATTEMPTS: usize = 3;

    /// 默认监听端口
    pub const DEFAULT_PORT: u16 = 5000;

    /// 默认监听地址
    pub const DEFAULT_HOST: &str = "0.0.0.0";

    /// 默认词表存储文件
    pub const DEFAULT_MAPPING_FILE: &str = "mapping.json";
}

/// 浏览器环境配置
pub mod browser_locate_config {
    /// PATH中搜索的可执行文件名
    #[cfg(not(target_os = "windows"))]
    pub const EXECUTABLE_NAMES: &[&str] = &[
        "chromium",
        "chromium-browser",
        "google-chrome",
        "google-chrome-stable",
        "chrome",
    ];

    #[cfg(target_os = "windows")]
    pub const EXECUTABLE_NAMES: &[&str] = &["chrome.exe", "chromium.exe"];

    /// Linux下的常见安装位置
    pub const WELL_KNOWN_LINUX: &[&str] = &[
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/snap/bin/chromium",
        "/opt/google/chrome/chrome",
    ];

    /// macOS下的常见安装位置
    pub const WELL_KNOWN_MACOS: &[&str] = &[
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    /// Windows下的常见安装位置
    pub const WELL_KNOWN_WINDOWS: &[&str] = &[
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    ];

    /// 托管缓存目录名（位于系统临时目录下）
    pub const MANAGED_CACHE_DIR: &str = "urdu-translation-service/browser";
}

/// 实用工具函数
/// 判断URL是否为可用的远程页面地址
pub fn is_valid_remote_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_url_validation() {
        assert!(is_valid_remote_url(remote_config::TRANSLATE_PAGE_URL));
        assert!(is_valid_remote_url("http://localhost:8080"));
        assert!(!is_valid_remote_url("ftp://example.com"));
        assert!(!is_valid_remote_url("invalid-url"));
    }

    #[test]
    fn test_selector_lists_are_ordered_and_non_empty() {
        assert!(!selector_config::INPUT_SELECTORS.is_empty());
        assert!(!selector_config::RESULT_SELECTORS.is_empty());
        assert!(!selector_config::CONSENT_SELECTORS.is_empty());
        // 最宽松的选择器必须排在最后，否则会屏蔽更精确的候选
        assert_eq!(*selector_config::INPUT_SELECTORS.last().unwrap(), "textarea");
    }

    #[test]
    fn test_urdu_ranges_cover_core_arabic_block() {
        let covered = script_config::URDU_CODEPOINT_RANGES
            .iter()
            .any(|(lo, hi)| *lo <= 0x0627 && 0x0627 <= *hi); // ا
        assert!(covered);
    }

    #[test]
    fn test_attempt_cap_is_three() {
        assert_eq!(service_config::MAX_TRANSLATE_ATTEMPTS, 3);
    }
}
