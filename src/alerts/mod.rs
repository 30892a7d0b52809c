/// Notification delivery
pub mod notifier;

/// Notification policy per flow
pub mod policy;

#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{LogNotifier, NotificationTag, Notifier, OutboxNotifier};
pub use policy::NotificationPolicy;
