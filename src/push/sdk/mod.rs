pub mod loopback;
pub mod sdk_trait;

pub use loopback::LoopbackSdk;
pub use sdk_trait::{MessagingEvents, MessagingSdk, SubscribeCallback};
