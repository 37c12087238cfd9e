//! Loopback 演示流程
//!
//! 不接入真实平台：用 [`LoopbackSdk`] 与 [`RecordingHost`] 走一遍
//! 启动 → 设备令牌 → 注册令牌 → 订阅主题 → 后台收推送 的完整链路。

use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::BridgeConfig;
use crate::credentials::{self, TestTarget};
use crate::error::PushError;
use crate::push::{
    FetchCompletion, FetchResult, HostApplication, LaunchOptions, LoopbackSdk, NotificationDelegate,
    NotificationFacade, PushContext, PushMessage, RecordingHost, RegistrationToken,
};

/// 没有配置 sender id 且构建时也未提供 FCM 凭据时使用
pub const FALLBACK_SENDER_ID: &str = "000000000000";

/// 后台处理一条推送的模拟耗时
const BACKGROUND_WORK: Duration = Duration::from_millis(20);

/// 等待宿主完成回调的上限（演示用，façade 本身不设超时）
const COMPLETION_WAIT: Duration = Duration::from_secs(5);

/// 演示结果
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub sender_id: String,
    pub launched: bool,
    pub token: Option<RegistrationToken>,
    pub subscribed_topics: Vec<String>,
    pub failed_topics: Vec<String>,
    pub registration_errors: Vec<PushError>,
    pub fetch_result: Option<FetchResult>,
}

/// 演示用 delegate：收到令牌后订阅配置的主题，收到推送后在后台任务里完成
pub struct ConsoleDelegate {
    facade: Weak<NotificationFacade>,
    topics: Vec<String>,
    runtime: Handle,
    tokens: Mutex<Vec<RegistrationToken>>,
    failed_topics: Mutex<Vec<String>>,
    errors: Mutex<Vec<PushError>>,
}

impl ConsoleDelegate {
    pub fn new(facade: &Arc<NotificationFacade>, topics: Vec<String>, runtime: Handle) -> Self {
        Self {
            facade: Arc::downgrade(facade),
            topics,
            runtime,
            tokens: Mutex::new(Vec::new()),
            failed_topics: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn last_token(&self) -> Option<RegistrationToken> {
        self.tokens.lock().last().cloned()
    }

    pub fn failed_topics(&self) -> Vec<String> {
        self.failed_topics.lock().clone()
    }

    pub fn errors(&self) -> Vec<PushError> {
        self.errors.lock().clone()
    }
}

impl NotificationDelegate for ConsoleDelegate {
    fn did_fail_to_register(&self, error: &PushError) {
        warn!("❌ Registration failed: {}", error);
        self.errors.lock().push(error.clone());
    }

    fn did_receive_token(&self, token: &RegistrationToken) {
        info!("🔑 Registration token: {}", token);
        self.tokens.lock().push(token.clone());

        if let Some(facade) = self.facade.upgrade() {
            for topic in &self.topics {
                facade.subscribe_to_topic(topic);
            }
        }
    }

    fn did_receive_remote_notification(
        &self,
        _application: &dyn HostApplication,
        message: PushMessage,
        completion: FetchCompletion,
    ) {
        info!(
            "📨 Remote notification: id={:?}, topic={:?}",
            message.message_id(),
            message.topic()
        );
        self.runtime.spawn(async move {
            tokio::time::sleep(BACKGROUND_WORK).await;
            completion.complete(FetchResult::NewData);
        });
    }

    fn did_fail_to_subscribe(&self, topic: &str, error: &PushError) {
        warn!("⚠️ Subscription failed: {}", error);
        self.failed_topics.lock().push(topic.to_string());
    }
}

/// 选择 sender id：配置 > 构建时/运行时 FCM 凭据 > 占位值
pub fn resolve_sender_id(config: &BridgeConfig) -> String {
    if !config.sender_id.is_empty() {
        return config.sender_id.clone();
    }
    let [sender, _] = TestTarget::Fcm.bindings();
    credentials::effective_value(&sender).unwrap_or_else(|| {
        warn!("⚠️ 未配置 sender id，使用占位值 {}", FALLBACK_SENDER_ID);
        FALLBACK_SENDER_ID.to_string()
    })
}

/// 运行一次 loopback 演示
pub async fn run_simulation(config: &BridgeConfig) -> Result<SimulationReport> {
    run_simulation_with(config, LoopbackSdk::new().into_shared()).await
}

pub async fn run_simulation_with(config: &BridgeConfig, sdk: Arc<LoopbackSdk>) -> Result<SimulationReport> {
    let sender_id = resolve_sender_id(config);
    let context = PushContext::from_config(config, sdk.clone());
    let facade = context.shared_instance();
    let host = Arc::new(RecordingHost::new());

    let console = Arc::new(ConsoleDelegate::new(&facade, config.topics.clone(), Handle::current()));
    let delegate: Arc<dyn NotificationDelegate> = console.clone();

    let launched =
        facade.application_did_finish_launching(host.as_ref(), LaunchOptions::new(), &sender_id, &delegate);
    if !launched {
        return Ok(SimulationReport {
            sender_id,
            launched,
            token: None,
            subscribed_topics: Vec::new(),
            failed_topics: Vec::new(),
            registration_errors: console.errors(),
            fetch_result: None,
        });
    }
    facade.application_did_become_active();

    // 宿主签发设备令牌
    let device_token = Uuid::new_v4();
    facade.did_register_for_remote_notifications(device_token.as_bytes());

    // 推送在后台线程到达
    let (tx, rx) = oneshot::channel();
    let completion = FetchCompletion::new(move |result| {
        let _ = tx.send(result);
    });
    let payload = json!({
        "gcm.message_id": format!("0:{}", Uuid::new_v4().simple()),
        "from": config.topics.first().cloned().unwrap_or_else(|| sender_id.clone()),
        "aps": { "content-available": 1 },
    });
    let message = match payload {
        serde_json::Value::Object(map) => PushMessage::new(map),
        _ => bail!("推送 payload 必须是 JSON 对象"),
    };

    let background_facade = facade.clone();
    let background_host = host.clone();
    tokio::spawn(async move {
        background_facade.did_receive_remote_notification(background_host.as_ref(), message, completion);
    })
    .await
    .context("推送投递任务失败")?;

    let fetch_result = tokio::time::timeout(COMPLETION_WAIT, rx)
        .await
        .context("等待后台拉取完成超时")?
        .ok();

    facade.application_did_enter_background();

    Ok(SimulationReport {
        sender_id,
        launched,
        token: console.last_token(),
        subscribed_topics: sdk.topics(),
        failed_topics: console.failed_topics(),
        registration_errors: console.errors(),
        fetch_result,
    })
}
