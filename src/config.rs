use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// 推送桥接配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// 消息 SDK 的 sender id
    pub sender_id: String,
    /// 是否使用 APNs sandbox 环境
    pub sandbox: bool,
    /// façade 诊断日志开关
    pub logging: bool,
    /// 启动后订阅的主题（`/topics/` 开头）
    pub topics: Vec<String>,
    /// 日志级别
    pub log_level: String,
    /// 日志格式：compact / pretty / json
    pub log_format: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            sender_id: String::new(),
            sandbox: false,
            logging: false,
            topics: vec!["/topics/global".to_string()],
            log_level: "info".to_string(),
            log_format: None,
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 TOML 文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("无法读取配置文件: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content).with_context(|| "配置文件格式错误")?;
        Ok(toml_config.into())
    }

    /// 从环境变量合并配置（PUSHBRIDGE_ 前缀）
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(sender_id) = env::var("PUSHBRIDGE_SENDER_ID") {
            self.sender_id = sender_id;
        }
        if let Ok(sandbox) = env::var("PUSHBRIDGE_SANDBOX") {
            self.sandbox = parse_bool(&sandbox)
                .with_context(|| format!("PUSHBRIDGE_SANDBOX 不是布尔值: {}", sandbox))?;
        }
        if let Ok(logging) = env::var("PUSHBRIDGE_LOGGING") {
            self.logging = parse_bool(&logging)
                .with_context(|| format!("PUSHBRIDGE_LOGGING 不是布尔值: {}", logging))?;
        }
        if let Ok(topics) = env::var("PUSHBRIDGE_TOPICS") {
            self.topics = split_topics(&topics);
        }
        if let Ok(log_level) = env::var("PUSHBRIDGE_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Ok(log_format) = env::var("PUSHBRIDGE_LOG_FORMAT") {
            self.log_format = Some(log_format);
        }
        Ok(())
    }

    /// 从命令行参数合并配置
    pub fn merge_from_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(sender_id) = &cli.sender_id {
            self.sender_id = sender_id.clone();
        }
        if cli.sandbox {
            self.sandbox = true;
        }
        if cli.verbose_facade {
            self.logging = true;
        }
        if !cli.topics.is_empty() {
            self.topics = cli.topics.clone();
        }
        if let Some(log_level) = cli.get_log_level() {
            self.log_level = log_level;
        }
        if let Some(log_format) = cli.get_log_format() {
            self.log_format = Some(log_format);
        }
    }

    /// 加载配置（按优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    pub fn load(cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if let Some(config_file) = &cli.config_file {
            if Path::new(config_file).exists() {
                info!("📄 从配置文件加载: {}", config_file);
                Self::from_toml_file(config_file)?
            } else {
                tracing::warn!("⚠️ 配置文件不存在: {}", config_file);
                Self::new()
            }
        } else if Path::new("pushbridge.toml").exists() {
            info!("📄 从默认配置文件加载: pushbridge.toml");
            Self::from_toml_file("pushbridge.toml")?
        } else {
            Self::new()
        };

        config.merge_from_env()?;
        config.merge_from_cli(cli);

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_topics(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

/// TOML 配置文件结构（用于反序列化）
#[derive(Debug, Deserialize)]
struct TomlConfig {
    push: Option<TomlPushConfig>,
    logging: Option<TomlLoggingConfig>,
}

#[derive(Debug, Deserialize)]
struct TomlPushConfig {
    sender_id: Option<String>,
    sandbox: Option<bool>,
    logging: Option<bool>,
    topics: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TomlLoggingConfig {
    level: Option<String>,
    format: Option<String>,
}

impl From<TomlConfig> for BridgeConfig {
    fn from(toml: TomlConfig) -> Self {
        let mut config = BridgeConfig::default();

        if let Some(push) = toml.push {
            if let Some(sender_id) = push.sender_id {
                config.sender_id = sender_id;
            }
            if let Some(sandbox) = push.sandbox {
                config.sandbox = sandbox;
            }
            if let Some(logging) = push.logging {
                config.logging = logging;
            }
            if let Some(topics) = push.topics {
                config.topics = topics;
            }
        }

        if let Some(logging) = toml.logging {
            if let Some(level) = logging.level {
                config.log_level = level;
            }
            config.log_format = logging.format;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str() {
        let config = BridgeConfig::from_toml_str(
            r#"
[push]
sender_id = "1234567890"
sandbox = true
topics = ["/topics/news", "/topics/sports"]

[logging]
level = "debug"
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.sender_id, "1234567890");
        assert!(config.sandbox);
        assert!(!config.logging);
        assert_eq!(config.topics, vec!["/topics/news", "/topics/sports"]);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_invalid_toml() {
        assert!(BridgeConfig::from_toml_str("[push\nsender_id=").is_err());
    }

    #[test]
    fn test_parse_bool_and_topics() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(split_topics(" /topics/a, ,/topics/b "), vec!["/topics/a", "/topics/b"]);
    }
}
