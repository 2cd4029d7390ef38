//! Platform backends feeding the dispatcher

pub mod channel;
pub mod gilrs_backend;

pub use channel::{channel_platform, ChannelPlatform, FinishedEvent, PlatformFeed, PlatformSender, SensorControl};
pub use gilrs_backend::{spawn_collector, CollectorSettings, DeviceTable, GilrsClassifier};
