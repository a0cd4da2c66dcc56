//! 统一错误处理模块
//!
//! 提供翻译服务的统一错误类型定义，以及远程交互单步操作的显式结果类型。
//! 只有环境/启动类错误允许致命；所有远程交互失败都会在重试编排器内部
//! 被吸收并降级为"回退为原文"。

// 标准库导入
use std::fmt;

// 第三方crate导入
use anyhow::Error as AnyhowError;

/// 翻译服务统一错误类型
#[derive(Debug)]
pub enum TranslationError {
    /// 浏览器可执行文件提供失败（回退链全部耗尽，致命）
    BrowserProvision {
        /// 各回退步骤的失败详情
        details: String,
    },

    /// 浏览器会话启动失败（致命）
    SessionLaunch {
        /// 底层错误信息
        details: String,
    },

    /// 页面导航失败（可重试）
    Navigation {
        /// 目标地址
        url: String,
        /// 失败原因
        details: String,
    },

    /// 页面元素未找到（可重试）
    ElementNotFound {
        /// 元素类别（输入框、译文容器等）
        kind: String,
    },

    /// 浏览器自动化指令执行失败（可重试）
    Automation {
        /// 底层错误信息
        details: String,
    },

    /// 浏览器连接丢失（会话降级）
    ConnectionLost {
        /// 失败原因
        details: String,
    },

    /// 词表存储读写失败
    MappingStore {
        /// 存储文件路径
        path: String,
        /// 底层错误信息
        details: String,
    },

    /// 输入验证错误（只在HTTP边界产生，绝不进入自动化核心）
    InputValidation {
        /// 字段名称
        field: String,
        /// 失败原因
        reason: String,
    },

    /// 内部处理错误（包装anyhow::Error）
    Internal {
        /// 包装的错误
        source: AnyhowError,
    },
}

impl TranslationError {
    /// 判断错误是否属于致命类别
    ///
    /// 致命错误只可能来自环境提供与会话启动，在首次使用时向调用方
    /// 暴露一次；其余错误都会被编排器转化为回退行为。
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TranslationError::BrowserProvision { .. } | TranslationError::SessionLaunch { .. }
        )
    }
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::BrowserProvision { details } => {
                write!(f, "浏览器环境提供失败: {}", details)
            }
            TranslationError::SessionLaunch { details } => {
                write!(f, "浏览器会话启动失败: {}", details)
            }
            TranslationError::Navigation { url, details } => {
                write!(f, "页面导航失败 [{}]: {}", url, details)
            }
            TranslationError::ElementNotFound { kind } => {
                write!(f, "页面元素未找到: {}", kind)
            }
            TranslationError::Automation { details } => {
                write!(f, "自动化指令执行失败: {}", details)
            }
            TranslationError::ConnectionLost { details } => {
                write!(f, "浏览器连接丢失: {}", details)
            }
            TranslationError::MappingStore { path, details } => {
                write!(f, "词表存储操作失败 [{}]: {}", path, details)
            }
            TranslationError::InputValidation { field, reason } => {
                write!(f, "输入验证失败 [{}]: {}", field, reason)
            }
            TranslationError::Internal { source } => {
                write!(f, "内部处理错误: {}", source)
            }
        }
    }
}

impl std::error::Error for TranslationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslationError::Internal { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// 翻译服务结果类型别名
pub type Result<T> = std::result::Result<T, TranslationError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! translation_error {
    (provision, $details:expr) => {
        $crate::error::TranslationError::BrowserProvision {
            details: $details.to_string(),
        }
    };
    (launch, $details:expr) => {
        $crate::error::TranslationError::SessionLaunch {
            details: $details.to_string(),
        }
    };
    (navigation, $url:expr, $details:expr) => {
        $crate::error::TranslationError::Navigation {
            url: $url.to_string(),
            details: $details.to_string(),
        }
    };
    (element, $kind:expr) => {
        $crate::error::TranslationError::ElementNotFound {
            kind: $kind.to_string(),
        }
    };
    (automation, $details:expr) => {
        $crate::error::TranslationError::Automation {
            details: $details.to_string(),
        }
    };
    (connection, $details:expr) => {
        $crate::error::TranslationError::ConnectionLost {
            details: $details.to_string(),
        }
    };
    (mapping, $path:expr, $details:expr) => {
        $crate::error::TranslationError::MappingStore {
            path: $path.to_string(),
            details: $details.to_string(),
        }
    };
    (input_validation, $field:expr, $reason:expr) => {
        $crate::error::TranslationError::InputValidation {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}

/// 从anyhow::Error转换
impl From<AnyhowError> for TranslationError {
    fn from(error: AnyhowError) -> Self {
        TranslationError::Internal { source: error }
    }
}

/// 从std::io::Error转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::Internal {
            source: AnyhowError::new(error),
        }
    }
}

/// 从CDP协议错误转换
impl From<chromiumoxide::error::CdpError> for TranslationError {
    fn from(error: chromiumoxide::error::CdpError) -> Self {
        TranslationError::Automation {
            details: error.to_string(),
        }
    }
}

/// 远程交互单步操作的显式结果
///
/// 重试编排器根据该类型做数据驱动的状态转移，取代层层嵌套的
/// "捕获一切"式处理。
#[derive(Debug)]
pub enum RemoteOutcome {
    /// 得到有效译文
    Success(String),
    /// 本次尝试失败，但还可以重试
    Retryable {
        /// 失败原因
        reason: String,
        /// 硬失败（元素丢失/导航失败）需要从头重新导航；
        /// 软失败（译文为空或与原文相同）只做轻量恢复动作
        hard: bool,
    },
    /// 会话已不可用，放弃剩余尝试
    Fatal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TranslationError::Navigation {
            url: "https://translate.example".to_string(),
            details: "timeout".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "页面导航失败 [https://translate.example]: timeout"
        );
    }

    #[test]
    fn test_error_macro() {
        let err = translation_error!(element, "输入框");
        match err {
            TranslationError::ElementNotFound { kind } => assert_eq!(kind, "输入框"),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_fatal_classification() {
        assert!(translation_error!(provision, "exhausted").is_fatal());
        assert!(translation_error!(launch, "no chrome").is_fatal());
        assert!(!translation_error!(navigation, "u", "timeout").is_fatal());
        assert!(!translation_error!(element, "输入框").is_fatal());
        assert!(!translation_error!(connection, "gone").is_fatal());
    }

    #[test]
    fn test_anyhow_conversion() {
        let anyhow_err = anyhow::anyhow!("Test anyhow error");
        let translation_err: TranslationError = anyhow_err.into();
        match translation_err {
            TranslationError::Internal { .. } => {}
            _ => panic!("Wrong error type"),
        }
    }
}
