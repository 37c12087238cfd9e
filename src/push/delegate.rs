use crate::error::PushError;
use crate::push::platform::HostApplication;
use crate::push::types::{FetchCompletion, PushMessage, RegistrationToken};

/// Notification Delegate（推送回调接收者）
///
/// 由使用方实现，façade 只持有弱引用，不控制其生命周期。
/// 回调可能在任意线程上触发。
pub trait NotificationDelegate: Send + Sync {
    /// SDK 注册失败；façade 不会重试
    fn did_fail_to_register(&self, error: &PushError);

    /// 每次（重新）注册成功后收到新的注册令牌
    fn did_receive_token(&self, token: &RegistrationToken);

    /// 收到推送，需要做后台工作
    ///
    /// `completion` 必须且只能调用一次；直接丢弃会以 `Failed` 通知宿主。
    fn did_receive_remote_notification(
        &self,
        application: &dyn HostApplication,
        message: PushMessage,
        completion: FetchCompletion,
    );

    /// SDK 直连通道收到的消息（应用在前台，无需宿主完成回调；默认忽略）
    fn did_receive_message(&self, message: PushMessage) {
        let _ = message;
    }

    /// 主题订阅失败（默认忽略）
    fn did_fail_to_subscribe(&self, topic: &str, error: &PushError) {
        let _ = (topic, error);
    }
}
