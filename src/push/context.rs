use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::config::BridgeConfig;
use crate::push::facade::NotificationFacade;
use crate::push::sdk::MessagingSdk;

/// 推送上下文
///
/// 在应用启动时构造一次，并传给所有需要注册 delegate 或转交回调的地方。
/// façade 在第一次访问时创建，之后每次返回同一个实例。
pub struct PushContext {
    sdk: Arc<dyn MessagingSdk>,
    sandbox: bool,
    logging: bool,
    facade: OnceLock<Arc<NotificationFacade>>,
}

impl PushContext {
    pub fn new(sdk: Arc<dyn MessagingSdk>) -> Self {
        Self {
            sdk,
            sandbox: false,
            logging: false,
            facade: OnceLock::new(),
        }
    }

    /// 按配置创建（sandbox 与初始日志开关）
    pub fn from_config(config: &BridgeConfig, sdk: Arc<dyn MessagingSdk>) -> Self {
        Self {
            sdk,
            sandbox: config.sandbox,
            logging: config.logging,
            facade: OnceLock::new(),
        }
    }

    /// 全局唯一的 façade（惰性创建）
    pub fn shared_instance(&self) -> Arc<NotificationFacade> {
        self.facade
            .get_or_init(|| {
                info!("🔔 Notification façade created (sandbox={})", self.sandbox);
                let facade = NotificationFacade::with_sandbox(self.sdk.clone(), self.sandbox);
                facade.set_logging(self.logging);
                facade
            })
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.facade.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::sdk::LoopbackSdk;

    #[test]
    fn test_shared_instance_is_lazy_and_identical() {
        let ctx = PushContext::new(Arc::new(LoopbackSdk::new()));
        assert!(!ctx.is_initialized());

        let first = ctx.shared_instance();
        let second = ctx.shared_instance();
        assert!(ctx.is_initialized());
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_from_config_applies_logging() {
        let config = BridgeConfig {
            logging: true,
            ..BridgeConfig::default()
        };
        let ctx = PushContext::from_config(&config, Arc::new(LoopbackSdk::new()));
        assert!(ctx.shared_instance().is_logging());
    }
}
