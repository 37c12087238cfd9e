use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 初始化日志系统
pub fn init_logging(log_level: &str, log_format: Option<&str>, quiet: bool) -> Result<()> {
    // 如果静默模式，只输出错误
    let level = if quiet { "error" } else { log_level };

    // 解析日志级别
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // 根据格式选择不同的输出方式
    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match log_format {
        // JSON 格式（适合 CI 收集）
        Some("json") => registry.with(fmt::layer().json()).try_init(),
        // Pretty 格式（适合本地调试）
        Some("pretty") | Some("dev") => registry.with(fmt::layer().pretty()).try_init(),
        // Compact 格式（默认）
        _ => registry.with(fmt::layer().compact()).try_init(),
    };

    result.map_err(|e| anyhow!("日志系统初始化失败: {}", e))
}
