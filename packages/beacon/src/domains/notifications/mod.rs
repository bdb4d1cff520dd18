//! In-app notifications: fan-out writes and the read-side feed.

pub mod fanout;
pub mod feed;
pub mod models;

pub use fanout::{NotificationFanout, NOTIFICATIONS};
pub use feed::{NotificationChange, NotificationFeed, NotificationWatch};
pub use models::{NotificationKind, UserNotification};
