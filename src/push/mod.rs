pub mod context;
pub mod delegate;
pub mod facade;
pub mod platform;
pub mod sdk;
pub mod types;

pub use context::PushContext;
pub use delegate::NotificationDelegate;
pub use facade::NotificationFacade;
pub use platform::{HostApplication, RecordingHost};
pub use sdk::{LoopbackSdk, MessagingEvents, MessagingSdk};
pub use types::{
    FetchCompletion, FetchResult, LaunchOptions, MessagingConfig, NotificationSettings,
    NotificationType, PushMessage, RegistrationToken,
};
