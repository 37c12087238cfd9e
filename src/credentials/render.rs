//! 测试凭据常量的源码生成
//!
//! build.rs 通过 `#[path]` 引入本文件，库内也编译同一份代码用于单元测试，
//! 因此这里只能依赖标准库。

use std::collections::HashMap;
use std::env::VarError;

/// 单个构建时定义
#[derive(Debug, Clone, Copy)]
pub struct DefinitionSpec {
    /// 构建时定义名，例如 `TEST_AWS_ACCESS_KEY_ID`
    pub definition: &'static str,
    /// 生成的常量名
    pub constant: &'static str,
}

/// 一个集成测试目标及其凭据定义
#[derive(Debug, Clone, Copy)]
pub struct TargetSpec {
    /// 生成的模块名
    pub module: &'static str,
    pub title: &'static str,
    pub definitions: &'static [DefinitionSpec],
}

const AWS_DEFINITIONS: &[DefinitionSpec] = &[
    DefinitionSpec {
        definition: "TEST_AWS_ACCESS_KEY_ID",
        constant: "ACCESS_KEY_ID",
    },
    DefinitionSpec {
        definition: "TEST_AWS_SECRET_ACCESS_KEY",
        constant: "SECRET_ACCESS_KEY",
    },
];

/// 所有测试目标（AWS 与 AWS SES 共用同一组定义名，但各自独立解析）
pub const TARGETS: &[TargetSpec] = &[
    TargetSpec {
        module: "aws",
        title: "AWS",
        definitions: AWS_DEFINITIONS,
    },
    TargetSpec {
        module: "aws_ses",
        title: "AWS SES",
        definitions: AWS_DEFINITIONS,
    },
    TargetSpec {
        module: "fcm",
        title: "FCM",
        definitions: &[
            DefinitionSpec {
                definition: "TEST_FCM_SENDER_ID",
                constant: "SENDER_ID",
            },
            DefinitionSpec {
                definition: "TEST_FCM_API_KEY",
                constant: "API_KEY",
            },
        ],
    },
    TargetSpec {
        module: "twilio",
        title: "Twilio",
        definitions: &[
            DefinitionSpec {
                definition: "TEST_TWILIO_SID",
                constant: "SID",
            },
            DefinitionSpec {
                definition: "TEST_TWILIO_AUTH_TOKEN",
                constant: "AUTH_TOKEN",
            },
        ],
    },
];

/// 把一个可选值渲染成 `Option<&str>` 表达式
///
/// 存在时原样转成字符串字面量（仅做字面量转义），缺失时为 `None`，绝不退化为空字符串。
pub fn render_literal(value: Option<&str>) -> String {
    match value {
        // str 的 Debug 输出本身就是合法的 Rust 字符串字面量
        Some(v) => format!("Some({:?})", v),
        None => "None".to_string(),
    }
}

/// 渲染单个测试目标的模块
///
/// `lookup(module, definition)` 返回该目标下某个定义的原始值。
pub fn render_target(target: &TargetSpec, lookup: &dyn Fn(&str, &str) -> Option<String>) -> String {
    let mut out = String::new();
    out.push_str(&format!("/// {} 集成测试凭据\n", target.title));
    out.push_str(&format!("pub mod {} {{\n", target.module));
    for def in target.definitions {
        let value = lookup(target.module, def.definition);
        out.push_str(&format!("    /// 来自构建时定义 `{}`\n", def.definition));
        out.push_str(&format!(
            "    pub const {}: Option<&str> = {};\n",
            def.constant,
            render_literal(value.as_deref())
        ));
    }
    out.push_str("}\n");
    out
}

/// 渲染完整的 test_credentials.rs
pub fn render_file(lookup: &dyn Fn(&str, &str) -> Option<String>) -> String {
    let mut out = String::from("// 由 build.rs 根据构建环境生成，请勿手工修改\n\n");
    for target in TARGETS {
        out.push_str(&render_target(target, lookup));
        out.push('\n');
    }
    out
}

/// 凭据文件中的一个值（已由调用方从 TOML 拍平）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileValue {
    /// 字符串，原样使用
    Text(String),
    /// 非字符串标量（整数、浮点、布尔、日期），使用其字面文本
    Scalar(String),
    /// 表或数组，不能作为凭据值
    Nested,
}

/// 拍平后的凭据文件：顶层定义 + 按目标模块覆盖的定义
#[derive(Debug, Clone, Default)]
pub struct CredentialsFile {
    shared: HashMap<String, FileValue>,
    targets: HashMap<String, HashMap<String, FileValue>>,
}

impl CredentialsFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否是某个测试目标的模块名（顶层同名表视为该目标的覆盖段）
    pub fn is_target_section(name: &str) -> bool {
        TARGETS.iter().any(|t| t.module == name)
    }

    pub fn insert_shared(&mut self, definition: impl Into<String>, value: FileValue) {
        self.shared.insert(definition.into(), value);
    }

    pub fn insert_target(&mut self, module: impl Into<String>, definition: impl Into<String>, value: FileValue) {
        self.targets
            .entry(module.into())
            .or_default()
            .insert(definition.into(), value);
    }

    /// 查找某个目标下的定义：目标段优先，其次顶层
    ///
    /// 值存在但不是标量时返回错误（包含键名），不会当作缺失。
    pub fn lookup(&self, module: &str, definition: &str) -> Result<Option<String>, String> {
        let (key, value) = match self.targets.get(module).and_then(|section| section.get(definition)) {
            Some(value) => (format!("{}.{}", module, definition), value),
            None => match self.shared.get(definition) {
                Some(value) => (definition.to_string(), value),
                None => return Ok(None),
            },
        };

        match value {
            FileValue::Text(text) | FileValue::Scalar(text) => Ok(Some(text.clone())),
            FileValue::Nested => Err(format!("凭据文件中的 {} 必须是字符串或标量", key)),
        }
    }
}

/// 单个定义的解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub value: Option<String>,
    /// 需要以 `cargo:warning` 输出的提示
    pub warnings: Vec<String>,
}

/// 解析单个定义：构建环境优先，其次凭据文件
///
/// 环境变量存在但不是合法 UTF-8 时给出警告并继续查凭据文件。
pub fn resolve_definition(
    env_value: Result<String, VarError>,
    file: Option<&CredentialsFile>,
    module: &str,
    definition: &str,
) -> Result<Resolved, String> {
    let mut resolved = Resolved::default();

    match env_value {
        Ok(value) => {
            resolved.value = Some(value);
            return Ok(resolved);
        }
        Err(VarError::NotUnicode(_)) => resolved
            .warnings
            .push(format!("构建环境中的 {} 不是合法 UTF-8，已忽略", definition)),
        Err(VarError::NotPresent) => {}
    }

    if let Some(file) = file {
        resolved.value = file.lookup(module, definition)?;
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_literal_absent_is_none() {
        assert_eq!(render_literal(None), "None");
    }

    #[test]
    fn test_render_literal_present_is_verbatim() {
        assert_eq!(render_literal(Some("AKIA123")), "Some(\"AKIA123\")");
        // 空字符串也是“存在”
        assert_eq!(render_literal(Some("")), "Some(\"\")");
    }

    #[test]
    fn test_render_literal_escapes_only_for_literal() {
        assert_eq!(
            render_literal(Some("a\"b\\c d")),
            "Some(\"a\\\"b\\\\c d\")"
        );
        // 首尾空格不会被裁掉
        assert_eq!(render_literal(Some(" x ")), "Some(\" x \")");
    }

    #[test]
    fn test_render_target_resolves_independently() {
        let aws = &TARGETS[0];
        let src = render_target(aws, &|_, definition| {
            if definition == "TEST_AWS_ACCESS_KEY_ID" {
                Some("access".to_string())
            } else {
                None
            }
        });

        assert!(src.contains("pub mod aws {"));
        assert!(src.contains("pub const ACCESS_KEY_ID: Option<&str> = Some(\"access\");"));
        assert!(src.contains("pub const SECRET_ACCESS_KEY: Option<&str> = None;"));
    }

    #[test]
    fn test_render_target_passes_module_to_lookup() {
        let ses = &TARGETS[1];
        let src = render_target(ses, &|module, _| Some(module.to_string()));
        assert!(src.contains("pub mod aws_ses {"));
        assert!(src.contains("Some(\"aws_ses\")"));
    }

    #[test]
    fn test_render_file_contains_all_targets() {
        let src = render_file(&|_, _| None);
        for target in TARGETS {
            assert!(src.contains(&format!("pub mod {} {{", target.module)));
        }
        assert!(!src.contains("Some("));
    }

    fn sample_file() -> CredentialsFile {
        let mut file = CredentialsFile::new();
        file.insert_shared("TEST_AWS_ACCESS_KEY_ID", FileValue::Text("shared-key".into()));
        file.insert_target("aws_ses", "TEST_AWS_ACCESS_KEY_ID", FileValue::Text("ses-key".into()));
        file.insert_shared("TEST_FCM_SENDER_ID", FileValue::Scalar("1234567890".into()));
        file.insert_shared("TEST_TWILIO_SID", FileValue::Nested);
        file
    }

    #[test]
    fn test_file_top_level_value() {
        let file = sample_file();
        assert_eq!(
            file.lookup("aws", "TEST_AWS_ACCESS_KEY_ID").unwrap().as_deref(),
            Some("shared-key")
        );
        assert_eq!(file.lookup("aws", "TEST_AWS_SECRET_ACCESS_KEY").unwrap(), None);
    }

    #[test]
    fn test_file_target_override_applies_to_one_target() {
        let file = sample_file();
        assert_eq!(
            file.lookup("aws_ses", "TEST_AWS_ACCESS_KEY_ID").unwrap().as_deref(),
            Some("ses-key")
        );
        assert_eq!(
            file.lookup("aws", "TEST_AWS_ACCESS_KEY_ID").unwrap().as_deref(),
            Some("shared-key")
        );
    }

    #[test]
    fn test_file_numeric_value_is_kept() {
        let file = sample_file();
        assert_eq!(
            file.lookup("fcm", "TEST_FCM_SENDER_ID").unwrap().as_deref(),
            Some("1234567890")
        );

        let src = render_target(&TARGETS[2], &|module, definition| {
            file.lookup(module, definition).unwrap()
        });
        assert!(src.contains("pub const SENDER_ID: Option<&str> = Some(\"1234567890\");"));
    }

    #[test]
    fn test_file_nested_value_is_error() {
        let err = sample_file().lookup("twilio", "TEST_TWILIO_SID").unwrap_err();
        assert!(err.contains("TEST_TWILIO_SID"));
    }

    #[test]
    fn test_target_section_names() {
        assert!(CredentialsFile::is_target_section("aws_ses"));
        assert!(!CredentialsFile::is_target_section("TEST_FCM_API_KEY"));
    }

    #[test]
    fn test_env_wins_over_file() {
        let file = sample_file();
        let resolved = resolve_definition(
            Ok("from-env".to_string()),
            Some(&file),
            "aws",
            "TEST_AWS_ACCESS_KEY_ID",
        )
        .unwrap();
        assert_eq!(resolved.value.as_deref(), Some("from-env"));
        assert!(resolved.warnings.is_empty());

        let resolved =
            resolve_definition(Err(VarError::NotPresent), Some(&file), "aws", "TEST_AWS_ACCESS_KEY_ID")
                .unwrap();
        assert_eq!(resolved.value.as_deref(), Some("shared-key"));
    }

    #[test]
    fn test_env_absent_without_file_is_none() {
        let resolved =
            resolve_definition(Err(VarError::NotPresent), None, "fcm", "TEST_FCM_API_KEY").unwrap();
        assert_eq!(resolved, Resolved::default());
    }

    #[test]
    fn test_env_not_unicode_warns() {
        let resolved = resolve_definition(
            Err(VarError::NotUnicode(std::ffi::OsString::from("x"))),
            None,
            "twilio",
            "TEST_TWILIO_AUTH_TOKEN",
        )
        .unwrap();
        assert_eq!(resolved.value, None);
        assert_eq!(resolved.warnings.len(), 1);
        assert!(resolved.warnings[0].contains("TEST_TWILIO_AUTH_TOKEN"));
    }
}
