//! The reporting seam used by the import workflow.

use std::sync::Arc;

use crate::bus::{EventBus, Notice};

/// Anything that can show a notice to the user.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl NotificationSink for EventBus {
    fn notify(&self, notice: Notice) {
        self.publish(notice);
    }
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bus_is_a_sink() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let sink: Arc<dyn NotificationSink> = bus.clone();

        sink.notify(Notice::info("import.nothing", "Nothing to import"));

        assert_eq!(rx.recv().await.unwrap().event_type, "import.nothing");
    }
}
