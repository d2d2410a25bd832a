//! Best-effort notifications.

use std::sync::Arc;

use tracing::{debug, warn};
use vframe_models::WorkItem;
use vframe_queue::Notifier;

use crate::error::WorkerError;
use crate::metrics;

/// Wraps an optional notifier so callers never branch on its presence.
///
/// Send failures are logged and counted, never returned.
#[derive(Clone)]
pub struct Notifications {
    notifier: Option<Arc<dyn Notifier>>,
}

impl Notifications {
    pub fn new(notifier: Option<Arc<dyn Notifier>>) -> Self {
        Self { notifier }
    }

    pub async fn success(&self, item: &WorkItem, archive_location: &str, email: &str) {
        let Some(notifier) = &self.notifier else {
            debug!(video_id = %item.video_id, "Notifications disabled, skipping success event");
            return;
        };

        if let Err(e) = notifier
            .notify_success(item.video_id.as_str(), &item.title, archive_location, &item.author, email)
            .await
        {
            report(item, WorkerError::notification(e));
        }
    }

    pub async fn failure(&self, item: &WorkItem, reason: &str, email: &str) {
        let Some(notifier) = &self.notifier else {
            debug!(video_id = %item.video_id, "Notifications disabled, skipping failure event");
            return;
        };

        if let Err(e) = notifier
            .notify_failure(item.video_id.as_str(), &item.title, reason, &item.author, email)
            .await
        {
            report(item, WorkerError::notification(e));
        }
    }
}

fn report(item: &WorkItem, err: WorkerError) {
    metrics::record_notification_failure();
    warn!(video_id = %item.video_id, stage = err.stage(), "{}", err);
}
