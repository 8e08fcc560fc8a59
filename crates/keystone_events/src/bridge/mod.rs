/// Event bridge module - broken down into manageable components
mod core;
mod dispatch;
mod lifecycle;
mod management;
mod registry;
mod stats;

pub use core::EventBridge;
pub use lifecycle::ShutdownSummary;
pub use registry::{BindingSnapshot, RegistrationSummary};
pub use stats::BridgeStats;
