use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::error::{PushError, Result};
use crate::push::delegate::NotificationDelegate;
use crate::push::platform::HostApplication;
use crate::push::sdk::{MessagingEvents, MessagingSdk};
use crate::push::types::{
    FetchCompletion, FetchResult, LaunchOptions, MessagingConfig, NotificationSettings,
    PushMessage, RegistrationToken,
};

/// Notification Façade（推送集成入口）
///
/// 职责：
/// - 把宿主生命周期事件转交给消息 SDK
/// - 作为 SDK 的回调接收者，把回调原样转交给当前 delegate
/// - 提供启动、设备令牌注册、主题订阅等操作
///
/// 除 delegate 绑定和日志开关外不持有任何状态，也不做加锁排队以外的顺序保证。
pub struct NotificationFacade {
    me: Weak<NotificationFacade>,
    sdk: Arc<dyn MessagingSdk>,
    delegate: RwLock<Option<Weak<dyn NotificationDelegate>>>,
    logging: AtomicBool,
    sandbox: bool,
}

impl NotificationFacade {
    pub fn new(sdk: Arc<dyn MessagingSdk>) -> Arc<Self> {
        Self::with_sandbox(sdk, false)
    }

    /// 创建 façade；`sandbox` 原样传给 SDK（APNs 开发环境）
    pub fn with_sandbox(sdk: Arc<dyn MessagingSdk>, sandbox: bool) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            sdk,
            delegate: RwLock::new(None),
            logging: AtomicBool::new(false),
            sandbox,
        })
    }

    /// 替换当前 delegate（不通知旧 delegate）
    pub fn set_delegate(&self, delegate: &Arc<dyn NotificationDelegate>) {
        *self.delegate.write() = Some(Arc::downgrade(delegate));
        if self.is_logging() {
            debug!("[FACADE] Delegate replaced");
        }
    }

    pub fn clear_delegate(&self) {
        *self.delegate.write() = None;
        if self.is_logging() {
            debug!("[FACADE] Delegate cleared");
        }
    }

    /// 是否有可达的 delegate
    pub fn has_delegate(&self) -> bool {
        self.current_delegate().is_some()
    }

    pub fn set_logging(&self, enabled: bool) {
        self.logging.store(enabled, Ordering::Relaxed);
    }

    pub fn is_logging(&self) -> bool {
        self.logging.load(Ordering::Relaxed)
    }

    /// 应用启动：使用平台默认的通知设置
    pub fn application_did_finish_launching(
        &self,
        application: &dyn HostApplication,
        launch_options: LaunchOptions,
        sender_id: &str,
        delegate: &Arc<dyn NotificationDelegate>,
    ) -> bool {
        self.application_did_finish_launching_with_settings(
            application,
            launch_options,
            sender_id,
            delegate,
            &NotificationSettings::default(),
        )
    }

    /// 应用启动：绑定 delegate、启动 SDK、向宿主注册远程通知
    ///
    /// 返回 SDK 是否启动成功；失败原因只记录日志，不返回给调用方。
    pub fn application_did_finish_launching_with_settings(
        &self,
        application: &dyn HostApplication,
        launch_options: LaunchOptions,
        sender_id: &str,
        delegate: &Arc<dyn NotificationDelegate>,
        settings: &NotificationSettings,
    ) -> bool {
        self.set_delegate(delegate);

        let config = MessagingConfig {
            sender_id: sender_id.to_string(),
            sandbox: self.sandbox,
            launch_options,
        };
        let started = match self.start_sdk(&config) {
            Ok(()) => {
                if self.is_logging() {
                    info!("[FACADE] Messaging SDK started: sender_id={}", sender_id);
                }
                true
            }
            Err(e) => {
                if self.is_logging() {
                    warn!("[FACADE] Messaging SDK failed to start: code={}, {}", e.code(), e);
                }
                false
            }
        };

        application.register_notification_settings(settings);
        application.register_for_remote_notifications();

        started
    }

    fn start_sdk(&self, config: &MessagingConfig) -> Result<()> {
        let events: Weak<dyn MessagingEvents> = self.me.clone();
        self.sdk.start(config, events)
    }

    /// 订阅主题
    ///
    /// 从不同步失败；失败通过 delegate 的 `did_fail_to_subscribe` 异步通知。
    pub fn subscribe_to_topic(&self, topic: &str) {
        if self.is_logging() {
            debug!("[FACADE] Subscribing to topic: {}", topic);
        }
        let me = self.me.clone();
        let owned_topic = topic.to_string();
        self.sdk.subscribe_to_topic(
            topic,
            Box::new(move |result| {
                if let Some(facade) = me.upgrade() {
                    facade.on_subscription_result(&owned_topic, result);
                }
            }),
        );
    }

    fn on_subscription_result(&self, topic: &str, result: Result<()>) {
        match result {
            Ok(()) => {
                if self.is_logging() {
                    info!("[FACADE] Subscribed to topic: {}", topic);
                }
            }
            Err(e) => {
                if self.is_logging() {
                    warn!("[FACADE] Topic subscription failed: code={}, {}", e.code(), e);
                }
                if let Some(delegate) = self.current_delegate() {
                    delegate.did_fail_to_subscribe(topic, &e);
                }
            }
        }
    }

    /// 宿主回调：远程通知注册成功，转交设备令牌给 SDK
    pub fn did_register_for_remote_notifications(&self, device_token: &[u8]) {
        if self.is_logging() {
            debug!("[FACADE] Device token received: {} bytes", device_token.len());
        }
        self.sdk.set_device_token(device_token);
    }

    /// 宿主回调：远程通知注册失败
    pub fn did_fail_to_register_for_remote_notifications(&self, error: PushError) {
        self.forward_registration_failure(error);
    }

    /// 宿主回调：收到远程通知
    ///
    /// 没有 delegate 时直接以 `NoData` 完成，避免宿主一直等待。
    pub fn did_receive_remote_notification(
        &self,
        application: &dyn HostApplication,
        message: PushMessage,
        completion: FetchCompletion,
    ) {
        self.sdk.app_did_receive_message(&message);

        match self.current_delegate() {
            Some(delegate) => {
                if self.is_logging() {
                    debug!(
                        "[FACADE] Remote notification: id={:?}, topic={:?}",
                        message.message_id(),
                        message.topic()
                    );
                }
                delegate.did_receive_remote_notification(application, message, completion);
            }
            None => {
                if self.is_logging() {
                    debug!("[FACADE] Remote notification without delegate, completing with no data");
                }
                completion.complete(FetchResult::NoData);
            }
        }
    }

    /// 应用进入前台
    pub fn application_did_become_active(&self) {
        self.sdk.connect();
    }

    /// 应用进入后台
    pub fn application_did_enter_background(&self) {
        self.sdk.disconnect();
    }

    // 先 upgrade 再释放读锁，回调期间不持锁
    fn current_delegate(&self) -> Option<Arc<dyn NotificationDelegate>> {
        self.delegate.read().as_ref().and_then(|weak| weak.upgrade())
    }

    fn forward_registration_failure(&self, error: PushError) {
        if self.is_logging() {
            warn!("[FACADE] Registration failed: code={}, {}", error.code(), error);
        }
        match self.current_delegate() {
            Some(delegate) => delegate.did_fail_to_register(&error),
            None => debug!("[FACADE] Registration failure dropped, no delegate"),
        }
    }
}

impl MessagingEvents for NotificationFacade {
    fn did_receive_token(&self, token: RegistrationToken) {
        if self.is_logging() {
            info!("[FACADE] Registration token received");
        }
        match self.current_delegate() {
            Some(delegate) => delegate.did_receive_token(&token),
            None => debug!("[FACADE] Registration token dropped, no delegate"),
        }
    }

    fn did_fail_to_register(&self, error: PushError) {
        self.forward_registration_failure(error);
    }

    fn did_receive_message(&self, message: PushMessage) {
        if self.is_logging() {
            debug!("[FACADE] Direct channel message: id={:?}", message.message_id());
        }
        match self.current_delegate() {
            Some(delegate) => delegate.did_receive_message(message),
            None => debug!("[FACADE] Direct channel message dropped, no delegate"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::sdk::LoopbackSdk;

    struct Silent;

    impl NotificationDelegate for Silent {
        fn did_fail_to_register(&self, _error: &PushError) {}
        fn did_receive_token(&self, _token: &RegistrationToken) {}
        fn did_receive_remote_notification(
            &self,
            _application: &dyn HostApplication,
            _message: PushMessage,
            completion: FetchCompletion,
        ) {
            completion.complete(FetchResult::NewData);
        }
    }

    #[test]
    fn test_logging_flag() {
        let facade = NotificationFacade::new(Arc::new(LoopbackSdk::new()));
        assert!(!facade.is_logging());
        facade.set_logging(true);
        assert!(facade.is_logging());
        facade.set_logging(false);
        assert!(!facade.is_logging());
    }

    #[test]
    fn test_delegate_is_not_owned() {
        let facade = NotificationFacade::new(Arc::new(LoopbackSdk::new()));
        let delegate: Arc<dyn NotificationDelegate> = Arc::new(Silent);
        facade.set_delegate(&delegate);
        assert!(facade.has_delegate());

        drop(delegate);
        assert!(!facade.has_delegate());
    }

    #[test]
    fn test_clear_delegate() {
        let facade = NotificationFacade::new(Arc::new(LoopbackSdk::new()));
        let delegate: Arc<dyn NotificationDelegate> = Arc::new(Silent);
        facade.set_delegate(&delegate);
        facade.clear_delegate();
        assert!(!facade.has_delegate());
    }

    #[test]
    fn test_sdk_does_not_keep_facade_alive() {
        let sdk = Arc::new(LoopbackSdk::new());
        let facade = NotificationFacade::new(sdk.clone());
        let weak = Arc::downgrade(&facade);
        let delegate: Arc<dyn NotificationDelegate> = Arc::new(Silent);
        let host = crate::push::platform::RecordingHost::new();
        assert!(facade.application_did_finish_launching(&host, LaunchOptions::new(), "1234", &delegate));

        drop(facade);
        assert!(weak.upgrade().is_none());
        // SDK 回调落空，不会 panic
        sdk.set_device_token(b"device");
    }
}
