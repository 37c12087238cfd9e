use clap::{Parser, Subcommand};

// 确保 Parser trait 被使用
impl Cli {
    /// 解析命令行参数
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

/// PushBridge - 推送通知 façade 与测试凭据工具
#[derive(Parser, Debug, Default)]
#[command(name = "pushbridge")]
#[command(version)]
#[command(about = "推送通知 façade 演示与测试凭据检查", long_about = None)]
pub struct Cli {
    /// 配置文件路径
    #[arg(long, value_name = "FILE", global = true, help = "指定配置文件路径")]
    pub config_file: Option<String>,

    /// 消息 SDK sender id
    #[arg(long, value_name = "ID", global = true, help = "消息 SDK 的 sender id")]
    pub sender_id: Option<String>,

    /// 使用 sandbox 环境
    #[arg(long, global = true, help = "使用 APNs sandbox 环境")]
    pub sandbox: bool,

    /// 订阅主题（可重复）
    #[arg(long = "topic", value_name = "TOPIC", global = true, help = "启动后订阅的主题")]
    pub topics: Vec<String>,

    /// 打开 façade 诊断日志
    #[arg(long, global = true, help = "打开 façade 诊断日志")]
    pub verbose_facade: bool,

    /// 日志级别
    #[arg(
        long,
        value_name = "LEVEL",
        global = true,
        help = "日志级别: trace, debug, info, warn, error"
    )]
    pub log_level: Option<String>,

    /// 日志格式
    #[arg(long, value_name = "FORMAT", global = true, help = "日志格式: pretty, json, compact")]
    pub log_format: Option<String>,

    /// 详细输出（可重复使用：-v, -vv, -vvv）
    #[arg(short, action = clap::ArgAction::Count, global = true, help = "详细输出级别")]
    pub verbose: u8,

    /// 静默模式
    #[arg(long, short = 'q', global = true, help = "静默模式（只输出错误）")]
    pub quiet: bool,

    /// 子命令
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 列出各测试目标的凭据是否在构建时定义（不输出值）
    Credentials {
        /// 只检查指定目标：aws, aws_ses, fcm, twilio
        #[arg(value_name = "TARGET")]
        target: Option<String>,
    },
    /// 用 loopback SDK 走一遍启动、注册、订阅、收推送流程
    Simulate,
    /// 生成默认配置文件
    GenerateConfig {
        /// 输出文件路径
        #[arg(value_name = "PATH", default_value = "pushbridge.toml")]
        path: String,
    },
    /// 显示最终配置（合并后的配置）
    ShowConfig,
}

impl Cli {
    /// 获取日志级别（考虑 verbose 和 quiet）
    pub fn get_log_level(&self) -> Option<String> {
        if self.quiet {
            return Some("error".to_string());
        }

        if let Some(level) = &self.log_level {
            return Some(level.clone());
        }

        match self.verbose {
            0 => None,
            1 => Some("info".to_string()),
            2 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        }
    }

    /// 获取日志格式
    pub fn get_log_format(&self) -> Option<String> {
        self.log_format.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::try_parse_from(["pushbridge", "-vv"]).unwrap();
        assert_eq!(cli.get_log_level().as_deref(), Some("debug"));

        let cli = Cli::try_parse_from(["pushbridge", "-vv", "--log-level", "warn"]).unwrap();
        assert_eq!(cli.get_log_level().as_deref(), Some("warn"));

        let cli = Cli::try_parse_from(["pushbridge", "-q", "--log-level", "warn"]).unwrap();
        assert_eq!(cli.get_log_level().as_deref(), Some("error"));

        let cli = Cli::try_parse_from(["pushbridge"]).unwrap();
        assert_eq!(cli.get_log_level(), None);
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from(["pushbridge", "credentials", "fcm"]).unwrap();
        match cli.command {
            Some(Commands::Credentials { target }) => assert_eq!(target.as_deref(), Some("fcm")),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from([
            "pushbridge",
            "simulate",
            "--sender-id",
            "42",
            "--topic",
            "/topics/a",
            "--topic",
            "/topics/b",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Simulate)));
        assert_eq!(cli.sender_id.as_deref(), Some("42"));
        assert_eq!(cli.topics, vec!["/topics/a", "/topics/b"]);
    }
}
