pub mod cli;
pub mod config;
pub mod credentials; // 构建时测试凭据常量
pub mod error;
pub mod logging;
pub mod push;
pub mod simulate;

pub use config::BridgeConfig;
pub use credentials::{SecretBinding, TestTarget};
pub use error::{PushError, Result};
pub use push::{NotificationDelegate, NotificationFacade, PushContext};
