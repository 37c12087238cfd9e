use std::sync::Weak;

use crate::error::{PushError, Result};
use crate::push::types::{MessagingConfig, PushMessage, RegistrationToken};

/// 主题订阅完成回调（异步，结果只通过它返回）
pub type SubscribeCallback = Box<dyn FnOnce(Result<()>) + Send>;

/// 消息 SDK 的回调接口（instance-ID 与 receiver delegate）
///
/// 由 façade 实现，原样转交给使用方的 delegate。
pub trait MessagingEvents: Send + Sync {
    /// SDK 签发了新的注册令牌（首次注册或令牌刷新）
    fn did_receive_token(&self, token: RegistrationToken);

    /// SDK 注册失败
    fn did_fail_to_register(&self, error: PushError);

    /// 直连通道（`connect` 之后）收到的消息
    fn did_receive_message(&self, message: PushMessage);
}

/// Messaging SDK Trait（厂商云消息 SDK 边界）
///
/// 注册握手、令牌刷新、消息投递顺序等协议状态都在 SDK 内部，façade 不感知。
pub trait MessagingSdk: Send + Sync {
    /// 初始化 SDK；`events` 为弱引用，SDK 不延长 façade 的生命周期
    fn start(&self, config: &MessagingConfig, events: Weak<dyn MessagingEvents>) -> Result<()>;

    /// 宿主平台签发的设备令牌，SDK 用它换取注册令牌
    fn set_device_token(&self, device_token: &[u8]);

    /// 建立直连通道（应用进入前台）
    fn connect(&self);

    /// 断开直连通道（应用进入后台）
    fn disconnect(&self);

    /// 通知 SDK 收到了一条推送（回执/统计）
    fn app_did_receive_message(&self, message: &PushMessage);

    /// 以当前注册身份订阅主题
    fn subscribe_to_topic(&self, topic: &str, on_complete: SubscribeCallback);
}
