use parking_lot::Mutex;
use tracing::info;

use crate::push::types::NotificationSettings;

/// 宿主平台接口（应用生命周期与远程通知注册）
pub trait HostApplication: Send + Sync {
    /// 按给定交互类型注册用户通知设置
    fn register_notification_settings(&self, settings: &NotificationSettings);

    /// 向平台申请远程通知，平台稍后回调设备令牌
    fn register_for_remote_notifications(&self);
}

/// 记录调用的宿主实现（用于测试和演示）
///
/// 不接入真实平台，只记录并打印日志
#[derive(Debug, Default)]
pub struct RecordingHost {
    settings: Mutex<Vec<NotificationSettings>>,
    remote_registrations: Mutex<u32>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已注册的通知设置（按调用顺序）
    pub fn registered_settings(&self) -> Vec<NotificationSettings> {
        self.settings.lock().clone()
    }

    pub fn remote_registration_count(&self) -> u32 {
        *self.remote_registrations.lock()
    }
}

impl HostApplication for RecordingHost {
    fn register_notification_settings(&self, settings: &NotificationSettings) {
        info!(
            "[HOST] Register notification settings: types={:?}, categories={:?}",
            settings.types, settings.categories
        );
        self.settings.lock().push(settings.clone());
    }

    fn register_for_remote_notifications(&self) {
        info!("[HOST] Register for remote notifications");
        *self.remote_registrations.lock() += 1;
    }
}
