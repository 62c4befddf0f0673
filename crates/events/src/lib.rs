//! User-visible notices for the organizer.
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`Notice`] -- a message for the user, with a level and a payload.
//! - [`NotificationSink`] -- the seam the import workflow reports through.

pub mod bus;
pub mod sink;

pub use bus::{EventBus, Notice, NoticeLevel};
pub use sink::NotificationSink;
