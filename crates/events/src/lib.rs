//! Post-commit signalling: pub/sub bus and notification dispatch.

pub mod bus;
pub mod in_memory_bus;
pub mod notification;

pub use bus::{EventBus, Subscription};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use notification::{
    BusNotifySink, NoopNotifySink, Notification, NotificationKind, NotifyError, NotifySink,
    dispatch_all,
};
