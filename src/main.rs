use anyhow::{bail, Context, Result};
use pushbridge::{
    cli::{Cli, Commands},
    config::BridgeConfig,
    credentials::{self, TestTarget},
    logging, simulate,
};
use std::fs;
use std::process;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载 .env 文件（如果存在）
    let _ = dotenvy::dotenv();

    // 解析命令行参数
    let cli = Cli::parse();

    // 生成配置文件不需要加载配置
    if let Some(Commands::GenerateConfig { path }) = &cli.command {
        return generate_config(path);
    }

    // 加载配置（按优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    let config = BridgeConfig::load(&cli).context("加载配置失败")?;

    logging::init_logging(&config.log_level, config.log_format.as_deref(), cli.quiet)?;

    match &cli.command {
        Some(Commands::Credentials { target }) => show_credentials(target.as_deref()),
        Some(Commands::ShowConfig) => show_config(&config),
        Some(Commands::GenerateConfig { .. }) => Ok(()),
        Some(Commands::Simulate) | None => run_simulation(&config).await,
    }
}

/// 运行 loopback 演示
async fn run_simulation(config: &BridgeConfig) -> Result<()> {
    tracing::info!("🚀 PushBridge simulation starting...");
    tracing::info!("  - Sandbox: {}", config.sandbox);
    tracing::info!("  - Façade Logging: {}", config.logging);
    tracing::info!("  - Topics: {:?}", config.topics);

    let report = simulate::run_simulation(config).await?;

    if !report.launched {
        tracing::error!("❌ 消息 SDK 启动失败 (sender_id={})", report.sender_id);
        tracing::error!("💡 请检查 sender id 配置后重试");
        process::exit(1);
    }

    println!("✅ 演示完成");
    println!("  - Sender ID: {}", report.sender_id);
    println!(
        "  - Token: {}",
        report
            .token
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("  - Subscribed: {:?}", report.subscribed_topics);
    if !report.failed_topics.is_empty() {
        println!("  - Failed: {:?}", report.failed_topics);
    }
    for error in &report.registration_errors {
        println!("  - Registration Error [{}]: {}", error.code(), error);
    }
    println!(
        "  - Fetch Result: {}",
        report.fetch_result.map(|r| r.as_str()).unwrap_or("<none>")
    );
    Ok(())
}

/// 列出测试凭据是否存在（从不输出值）
fn show_credentials(target: Option<&str>) -> Result<()> {
    let targets: Vec<TestTarget> = match target {
        Some(name) => match TestTarget::from_str(name) {
            Some(target) => vec![target],
            None => bail!("未知的测试目标: {}（可选: aws, aws_ses, fcm, twilio）", name),
        },
        None => TestTarget::ALL.to_vec(),
    };

    println!("🔐 测试凭据:");
    for target in targets {
        println!("  [{}]", target);
        for binding in target.bindings() {
            let compiled = if binding.is_present() { "defined" } else { "absent" };
            let runtime = if credentials::effective_value(&binding).is_some() {
                "available"
            } else {
                "missing"
            };
            println!(
                "    - {:<28} build: {:<8} effective: {}",
                binding.definition, compiled, runtime
            );
        }
        if let Err(e) = credentials::require_target(target) {
            println!("    ⚠️ {}", e);
        }
    }
    Ok(())
}

/// 生成默认配置文件
fn generate_config(path: &str) -> Result<()> {
    let default_config = r#"# PushBridge 配置文件
# 此文件由 pushbridge generate-config 生成

[push]
sender_id = ""
sandbox = false
logging = false
topics = ["/topics/global"]

[logging]
level = "info"
format = "compact"
"#;

    fs::write(path, default_config).with_context(|| format!("无法写入配置文件: {}", path))?;

    println!("✅ 配置文件已生成: {}", path);
    Ok(())
}

/// 显示最终配置（合并后的配置）
fn show_config(config: &BridgeConfig) -> Result<()> {
    println!("📊 最终配置（合并后的配置）:");
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
