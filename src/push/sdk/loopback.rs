use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{PushError, Result};
use crate::push::sdk::sdk_trait::{MessagingEvents, MessagingSdk, SubscribeCallback};
use crate::push::types::{MessagingConfig, PushMessage, RegistrationToken};

/// 主题名前缀
pub const TOPIC_PREFIX: &str = "/topics/";

#[derive(Default)]
struct LoopbackState {
    events: Option<Weak<dyn MessagingEvents>>,
    config: Option<MessagingConfig>,
    token: Option<RegistrationToken>,
    connected: bool,
    topics: Vec<String>,
    received: Vec<PushMessage>,
}

/// Loopback SDK（用于测试和演示）
///
/// 不调用真实服务：设备令牌到达后直接在本地签发注册令牌，
/// 主题订阅只做记录。可配置各阶段失败以覆盖错误路径。
#[derive(Default)]
pub struct LoopbackSdk {
    state: Mutex<LoopbackState>,
    fail_start: Option<String>,
    fail_registration: Option<String>,
    fail_subscription: Option<String>,
}

impl LoopbackSdk {
    pub fn new() -> Self {
        Self::default()
    }

    /// `start` 时返回失败
    pub fn with_start_failure(mut self, reason: impl Into<String>) -> Self {
        self.fail_start = Some(reason.into());
        self
    }

    /// 设备令牌到达后报告注册失败
    pub fn with_registration_failure(mut self, reason: impl Into<String>) -> Self {
        self.fail_registration = Some(reason.into());
        self
    }

    /// 所有主题订阅失败
    pub fn with_subscription_failure(mut self, reason: impl Into<String>) -> Self {
        self.fail_subscription = Some(reason.into());
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 模拟令牌刷新：签发新令牌并回调
    pub fn refresh_token(&self) {
        let (events, token) = {
            let mut state = self.state.lock();
            if state.token.is_none() {
                debug!("[LOOPBACK] Token refresh ignored, not registered yet");
                return;
            }
            let token = Self::issue_token();
            state.token = Some(token.clone());
            (state.events.clone(), token)
        };
        info!("[LOOPBACK] Token refreshed: {}", token);
        Self::emit(events, |e| e.did_receive_token(token));
    }

    /// 模拟直连通道下发一条消息
    ///
    /// 未 `connect` 时丢弃并返回 `false`。
    pub fn deliver(&self, message: PushMessage) -> bool {
        let events = {
            let state = self.state.lock();
            if !state.connected {
                debug!("[LOOPBACK] Not connected, message dropped");
                return false;
            }
            state.events.clone()
        };
        Self::emit(events, |e| e.did_receive_message(message));
        true
    }

    pub fn config(&self) -> Option<MessagingConfig> {
        self.state.lock().config.clone()
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().config.is_some()
    }

    pub fn token(&self) -> Option<RegistrationToken> {
        self.state.lock().token.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn topics(&self) -> Vec<String> {
        self.state.lock().topics.clone()
    }

    pub fn received_messages(&self) -> Vec<PushMessage> {
        self.state.lock().received.clone()
    }

    fn issue_token() -> RegistrationToken {
        RegistrationToken::new(format!("loopback:{}", Uuid::new_v4().simple()))
    }

    // 回调前必须先释放锁，delegate 可能在回调里再次调用 SDK
    fn emit(events: Option<Weak<dyn MessagingEvents>>, f: impl FnOnce(Arc<dyn MessagingEvents>)) {
        match events.and_then(|w| w.upgrade()) {
            Some(events) => f(events),
            None => debug!("[LOOPBACK] No event receiver, callback dropped"),
        }
    }
}

impl MessagingSdk for LoopbackSdk {
    fn start(&self, config: &MessagingConfig, events: Weak<dyn MessagingEvents>) -> Result<()> {
        if let Some(reason) = &self.fail_start {
            return Err(PushError::Sdk(reason.clone()));
        }
        if config.sender_id.trim().is_empty() {
            return Err(PushError::Configuration("sender id is empty".to_string()));
        }

        info!(
            "[LOOPBACK] Started: sender_id={}, sandbox={}",
            config.sender_id, config.sandbox
        );
        let mut state = self.state.lock();
        state.events = Some(events);
        state.config = Some(config.clone());
        Ok(())
    }

    fn set_device_token(&self, device_token: &[u8]) {
        let (events, outcome) = {
            let mut state = self.state.lock();
            if state.config.is_none() {
                warn!("[LOOPBACK] Device token received before start, ignored");
                return;
            }
            let outcome = match &self.fail_registration {
                Some(reason) => Err(PushError::Registration(reason.clone())),
                None => {
                    let token = Self::issue_token();
                    state.token = Some(token.clone());
                    Ok(token)
                }
            };
            (state.events.clone(), outcome)
        };

        debug!("[LOOPBACK] Device token: {} bytes", device_token.len());
        match outcome {
            Ok(token) => Self::emit(events, |e| e.did_receive_token(token)),
            Err(error) => Self::emit(events, |e| e.did_fail_to_register(error)),
        }
    }

    fn connect(&self) {
        self.state.lock().connected = true;
        debug!("[LOOPBACK] Connected");
    }

    fn disconnect(&self) {
        self.state.lock().connected = false;
        debug!("[LOOPBACK] Disconnected");
    }

    fn app_did_receive_message(&self, message: &PushMessage) {
        debug!("[LOOPBACK] Message received: id={:?}", message.message_id());
        self.state.lock().received.push(message.clone());
    }

    fn subscribe_to_topic(&self, topic: &str, on_complete: SubscribeCallback) {
        let result = {
            let mut state = self.state.lock();
            if state.token.is_none() {
                Err(PushError::subscription(topic, "not registered"))
            } else if !topic.starts_with(TOPIC_PREFIX) || topic.len() == TOPIC_PREFIX.len() {
                Err(PushError::subscription(topic, "invalid topic name"))
            } else if let Some(reason) = &self.fail_subscription {
                Err(PushError::subscription(topic, reason.clone()))
            } else {
                if !state.topics.iter().any(|t| t == topic) {
                    state.topics.push(topic.to_string());
                }
                Ok(())
            }
        };
        on_complete(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::types::LaunchOptions;

    #[derive(Default)]
    struct Events {
        messages: Mutex<Vec<PushMessage>>,
    }

    impl MessagingEvents for Events {
        fn did_receive_token(&self, _token: RegistrationToken) {}
        fn did_fail_to_register(&self, _error: PushError) {}
        fn did_receive_message(&self, message: PushMessage) {
            self.messages.lock().push(message);
        }
    }

    fn started(sdk: &LoopbackSdk, events: &Arc<Events>) {
        let config = MessagingConfig {
            sender_id: "42".to_string(),
            sandbox: false,
            launch_options: LaunchOptions::new(),
        };
        let weak: Weak<dyn MessagingEvents> = Arc::downgrade(events) as Weak<dyn MessagingEvents>;
        sdk.start(&config, weak).unwrap();
    }

    #[test]
    fn test_deliver_requires_connection() {
        let sdk = LoopbackSdk::new();
        let events = Arc::new(Events::default());
        started(&sdk, &events);

        assert!(!sdk.deliver(PushMessage::new(Default::default())));
        sdk.connect();
        assert!(sdk.deliver(PushMessage::new(Default::default())));
        sdk.disconnect();
        assert!(!sdk.deliver(PushMessage::new(Default::default())));

        assert_eq!(events.messages.lock().len(), 1);
    }

    #[test]
    fn test_deliver_after_receiver_dropped() {
        let sdk = LoopbackSdk::new();
        let events = Arc::new(Events::default());
        started(&sdk, &events);
        sdk.connect();
        drop(events);

        // 接收者已释放，回调落空
        assert!(sdk.deliver(PushMessage::new(Default::default())));
    }
}
