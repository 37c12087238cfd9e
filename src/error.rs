use thiserror::Error;

/// 推送桥接错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// 厂商 SDK 初始化或内部错误
    #[error("SDK error: {0}")]
    Sdk(String),
    /// 注册失败（设备令牌或注册令牌）
    #[error("Registration error: {0}")]
    Registration(String),
    /// 主题订阅失败
    #[error("Subscription error: {topic}: {reason}")]
    Subscription { topic: String, reason: String },
    /// 配置错误
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PushError {
    pub fn subscription(topic: impl Into<String>, reason: impl Into<String>) -> Self {
        PushError::Subscription {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// 错误代码（用于日志）
    pub fn code(&self) -> &'static str {
        match self {
            PushError::Sdk(_) => "sdk",
            PushError::Registration(_) => "registration",
            PushError::Subscription { .. } => "subscription",
            PushError::Configuration(_) => "configuration",
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, PushError>;
