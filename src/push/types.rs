use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// 启动参数（宿主平台传入的 launch options）
pub type LaunchOptions = Map<String, Value>;

/// 注册令牌（由消息 SDK 签发，标识本次安装）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationToken(String);

impl RegistrationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 推送消息
///
/// payload 对 façade 是不透明的，原样转交给 delegate。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub payload: Map<String, Value>,
    pub received_at: DateTime<Utc>,
}

impl PushMessage {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self {
            payload,
            received_at: Utc::now(),
        }
    }

    /// 消息 ID（`gcm.message_id` 或 `google.message_id`）
    pub fn message_id(&self) -> Option<&str> {
        self.payload
            .get("gcm.message_id")
            .or_else(|| self.payload.get("google.message_id"))
            .and_then(|v| v.as_str())
    }

    /// 主题消息的来源主题（`from` 以 `/topics/` 开头时）
    pub fn topic(&self) -> Option<&str> {
        self.payload
            .get("from")
            .and_then(|v| v.as_str())
            .filter(|from| from.starts_with("/topics/"))
    }
}

/// 后台拉取结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchResult {
    NewData,
    NoData,
    Failed,
}

impl FetchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchResult::NewData => "new_data",
            FetchResult::NoData => "no_data",
            FetchResult::Failed => "failed",
        }
    }
}

/// 后台拉取完成回调
///
/// `complete` 消费自身，因此最多调用一次；若从未调用就被丢弃，
/// 则以 [`FetchResult::Failed`] 通知宿主，保证宿主最终一定收到结果。
pub struct FetchCompletion {
    handler: Option<Box<dyn FnOnce(FetchResult) + Send>>,
}

impl FetchCompletion {
    pub fn new(handler: impl FnOnce(FetchResult) + Send + 'static) -> Self {
        Self {
            handler: Some(Box::new(handler)),
        }
    }

    pub fn complete(mut self, result: FetchResult) {
        if let Some(handler) = self.handler.take() {
            handler(result);
        }
    }
}

impl Drop for FetchCompletion {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            warn!("FetchCompletion dropped without being completed, reporting failed");
            handler(FetchResult::Failed);
        }
    }
}

impl fmt::Debug for FetchCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCompletion")
            .field("pending", &self.handler.is_some())
            .finish()
    }
}

/// 通知交互类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Alert,
    Badge,
    Sound,
}

/// 远程通知注册设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub types: Vec<NotificationType>,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl NotificationSettings {
    pub fn new(types: Vec<NotificationType>) -> Self {
        Self {
            types,
            categories: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn allows(&self, kind: NotificationType) -> bool {
        self.types.contains(&kind)
    }
}

impl Default for NotificationSettings {
    /// 平台默认：alert + badge + sound，无分类
    fn default() -> Self {
        Self::new(vec![
            NotificationType::Alert,
            NotificationType::Badge,
            NotificationType::Sound,
        ])
    }
}

/// 启动消息 SDK 时传入的配置
#[derive(Debug, Clone, PartialEq)]
pub struct MessagingConfig {
    pub sender_id: String,
    /// 使用 APNs sandbox 环境
    pub sandbox: bool,
    pub launch_options: LaunchOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_message_id_and_topic() {
        let msg = PushMessage::new(payload(json!({
            "gcm.message_id": "0:1234",
            "from": "/topics/news",
        })));
        assert_eq!(msg.message_id(), Some("0:1234"));
        assert_eq!(msg.topic(), Some("/topics/news"));

        let direct = PushMessage::new(payload(json!({ "from": "1234567890" })));
        assert_eq!(direct.topic(), None);
        assert_eq!(direct.message_id(), None);
    }

    #[test]
    fn test_completion_called_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let completion = FetchCompletion::new(move |r| sink.lock().unwrap().push(r));
        completion.complete(FetchResult::NewData);

        assert_eq!(*seen.lock().unwrap(), vec![FetchResult::NewData]);
    }

    #[test]
    fn test_completion_dropped_reports_failed() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        {
            let _completion = FetchCompletion::new(move |r| sink.lock().unwrap().push(r));
        }
        assert_eq!(*seen.lock().unwrap(), vec![FetchResult::Failed]);
    }

    #[test]
    fn test_default_settings() {
        let settings = NotificationSettings::default();
        assert!(settings.allows(NotificationType::Alert));
        assert!(settings.allows(NotificationType::Badge));
        assert!(settings.allows(NotificationType::Sound));
        assert!(settings.categories.is_empty());

        let only_alert = NotificationSettings::new(vec![NotificationType::Alert]).with_category("reply");
        assert!(!only_alert.allows(NotificationType::Sound));
        assert_eq!(only_alert.categories, vec!["reply".to_string()]);
    }
}
