use std::env;
use std::fs;
use std::path::Path;

#[allow(dead_code)]
#[path = "src/credentials/render.rs"]
mod render;

use render::{CredentialsFile, FileValue};

/// 可选的凭据文件（TOML），由该环境变量指定路径
const CREDENTIALS_FILE_VAR: &str = "PUSHBRIDGE_TEST_CREDENTIALS";

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("test_credentials.rs");

    // 告诉 cargo：凭据定义变化时重新生成
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/credentials/render.rs");
    println!("cargo:rerun-if-env-changed={}", CREDENTIALS_FILE_VAR);
    for target in render::TARGETS {
        for def in target.definitions {
            println!("cargo:rerun-if-env-changed={}", def.definition);
        }
    }

    let file = load_credentials_file();

    // 优先级：构建环境 > 凭据文件中的目标段 > 凭据文件顶层
    let source = render::render_file(&|module, definition| {
        let resolved = render::resolve_definition(env::var(definition), file.as_ref(), module, definition)
            .unwrap_or_else(|e| panic!("{}", e));
        for warning in &resolved.warnings {
            println!("cargo:warning={}", warning);
        }
        resolved.value
    });

    fs::write(&dest_path, source).expect("无法写入 test_credentials.rs");
}

fn load_credentials_file() -> Option<CredentialsFile> {
    let path = env::var(CREDENTIALS_FILE_VAR).ok()?;
    println!("cargo:rerun-if-changed={}", path);

    if !Path::new(&path).exists() {
        println!("cargo:warning=凭据文件不存在: {}", path);
        return None;
    }

    let content = fs::read_to_string(&path).expect("无法读取凭据文件");
    let table = content
        .parse::<toml::Table>()
        .expect("凭据文件格式错误（需要 TOML 键值表）");

    let mut file = CredentialsFile::new();
    for (key, value) in table {
        match value {
            toml::Value::Table(section) if CredentialsFile::is_target_section(&key) => {
                for (definition, value) in section {
                    file.insert_target(key.as_str(), definition, file_value(value));
                }
            }
            other => file.insert_shared(key, file_value(other)),
        }
    }
    Some(file)
}

// 非字符串标量保留 TOML 字面文本，例如数字形式的 sender id
fn file_value(value: toml::Value) -> FileValue {
    match value {
        toml::Value::String(text) => FileValue::Text(text),
        toml::Value::Table(_) | toml::Value::Array(_) => FileValue::Nested,
        scalar => FileValue::Scalar(scalar.to_string()),
    }
}
