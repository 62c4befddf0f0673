//! In-process notice bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans every published [`Notice`] out to all subscribers. It
//! is designed to be shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A message for the user.
///
/// Constructed with one of the level constructors and optionally enriched
/// with [`with_payload`](Notice::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,

    /// Dot-separated kind, e.g. `"import.committed"`.
    pub event_type: String,

    /// Human-readable text.
    pub message: String,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            event_type: event_type.into(),
            message: message.into(),
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn info(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, event_type, message)
    }

    pub fn success(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, event_type, message)
    }

    pub fn warning(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, event_type, message)
    }

    pub fn error(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, event_type, message)
    }

    /// Set the JSON payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out notice bus.
///
/// # Usage
///
/// ```rust
/// use hoard_events::bus::{EventBus, Notice};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(Notice::info("import.started", "Reading 3 files"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<Notice>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed notices are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notice to all current subscribers.
    ///
    /// With no subscribers the notice is dropped.
    pub fn publish(&self, notice: Notice) {
        tracing::debug!(
            level = notice.level.as_str(),
            event_type = %notice.event_type,
            "Notice published"
        );
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(notice);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
