//! 集成测试凭据常量
//!
//! 每个测试目标的密钥在构建时由 build.rs 从构建环境（或凭据文件）解析，
//! 生成 `Option<&'static str>` 常量：定义存在则为原样字符串，缺失则为 `None`。
//! 缺失不是错误，使用方在使用前自行判断。

pub mod render;

use std::env;
use std::fmt;

use thiserror::Error;
use tracing::debug;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/test_credentials.rs"));
}

pub use generated::{aws, aws_ses, fcm, twilio};

/// 一个已解析的凭据绑定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretBinding {
    /// 可读名称，例如 "access key id"
    pub name: &'static str,
    /// 构建时定义名
    pub definition: &'static str,
    value: Option<&'static str>,
}

impl SecretBinding {
    pub const fn new(name: &'static str, definition: &'static str, value: Option<&'static str>) -> Self {
        Self {
            name,
            definition,
            value,
        }
    }

    /// 编译进二进制的值
    pub fn resolved_value(&self) -> Option<&'static str> {
        self.value
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// 运行时环境变量名（去掉 `TEST_` 前缀）
    pub fn runtime_name(&self) -> &'static str {
        self.definition
            .strip_prefix("TEST_")
            .unwrap_or(self.definition)
    }
}

/// 集成测试目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestTarget {
    Aws,
    AwsSes,
    Fcm,
    Twilio,
}

impl TestTarget {
    pub const ALL: [TestTarget; 4] = [
        TestTarget::Aws,
        TestTarget::AwsSes,
        TestTarget::Fcm,
        TestTarget::Twilio,
    ];

    pub fn module_name(&self) -> &'static str {
        match self {
            TestTarget::Aws => "aws",
            TestTarget::AwsSes => "aws_ses",
            TestTarget::Fcm => "fcm",
            TestTarget::Twilio => "twilio",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "aws" => Some(TestTarget::Aws),
            "aws_ses" | "ses" => Some(TestTarget::AwsSes),
            "fcm" => Some(TestTarget::Fcm),
            "twilio" => Some(TestTarget::Twilio),
            _ => None,
        }
    }

    /// 该目标的全部凭据绑定，顺序与生成的常量一致
    pub fn bindings(&self) -> [SecretBinding; 2] {
        match self {
            TestTarget::Aws => [
                SecretBinding::new("access key id", "TEST_AWS_ACCESS_KEY_ID", aws::ACCESS_KEY_ID),
                SecretBinding::new(
                    "secret access key",
                    "TEST_AWS_SECRET_ACCESS_KEY",
                    aws::SECRET_ACCESS_KEY,
                ),
            ],
            TestTarget::AwsSes => [
                SecretBinding::new(
                    "access key id",
                    "TEST_AWS_ACCESS_KEY_ID",
                    aws_ses::ACCESS_KEY_ID,
                ),
                SecretBinding::new(
                    "secret access key",
                    "TEST_AWS_SECRET_ACCESS_KEY",
                    aws_ses::SECRET_ACCESS_KEY,
                ),
            ],
            TestTarget::Fcm => [
                SecretBinding::new("sender id", "TEST_FCM_SENDER_ID", fcm::SENDER_ID),
                SecretBinding::new("api key", "TEST_FCM_API_KEY", fcm::API_KEY),
            ],
            TestTarget::Twilio => [
                SecretBinding::new("account sid", "TEST_TWILIO_SID", twilio::SID),
                SecretBinding::new("auth token", "TEST_TWILIO_AUTH_TOKEN", twilio::AUTH_TOKEN),
            ],
        }
    }
}

impl fmt::Display for TestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module_name())
    }
}

/// 凭据错误（仅由测试辅助函数产生，常量解析本身永不失败）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("No {names} in build definitions; failing test. See README for more details.")]
    Missing { target: TestTarget, names: String },
}

/// 有效值：编译期值非空时用它，否则回退到同名（去掉 `TEST_`）的运行时环境变量
pub fn effective_value(binding: &SecretBinding) -> Option<String> {
    match binding.resolved_value() {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => {
            let value = env::var(binding.runtime_name()).ok();
            debug!(
                "凭据 {} 未在构建时定义，运行时环境变量 {} {}",
                binding.definition,
                binding.runtime_name(),
                if value.is_some() { "已设置" } else { "未设置" }
            );
            value
        }
    }
}

/// 要求某个测试目标的所有凭据都可用
///
/// 返回 `(定义名, 值)` 列表；任一缺失或为空时返回 [`CredentialError::Missing`]。
pub fn require_target(target: TestTarget) -> Result<Vec<(&'static str, String)>, CredentialError> {
    let bindings = target.bindings();
    let mut values = Vec::with_capacity(bindings.len());

    for binding in bindings.iter() {
        match effective_value(binding) {
            Some(value) if !value.is_empty() => values.push((binding.definition, value)),
            _ => {
                let names = bindings
                    .iter()
                    .map(|b| b.runtime_name())
                    .collect::<Vec<_>>()
                    .join(" or ");
                return Err(CredentialError::Missing { target, names });
            }
        }
    }

    Ok(values)
}
