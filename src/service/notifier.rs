//! Fire-and-forget notification fan-out.
//!
//! [`Notifier::notify`] appends an entry to the recipient's durable
//! feed, mirrors it to Postgres when enabled, and broadcasts a
//! [`MarketEvent::NotificationPosted`] for live delivery. It never
//! returns an error: a failed notification is logged and must not
//! block the settlement step that triggered it.

use std::sync::Arc;

use crate::domain::{
    EventBus, MarketEvent, Notification, NotificationPayload, SettlementLedger, UserId,
};
use crate::persistence::PostgresPersistence;

/// Publishes state transitions to interested users.
#[derive(Debug, Clone)]
pub struct Notifier {
    ledger: Arc<SettlementLedger>,
    event_bus: EventBus,
    persistence: Option<Arc<PostgresPersistence>>,
}

impl Notifier {
    /// Creates a notifier over the given feed store and event bus.
    #[must_use]
    pub fn new(
        ledger: Arc<SettlementLedger>,
        event_bus: EventBus,
        persistence: Option<Arc<PostgresPersistence>>,
    ) -> Self {
        Self {
            ledger,
            event_bus,
            persistence,
        }
    }

    /// Appends a notification to `user_id`'s feed and broadcasts it.
    ///
    /// Infallible by contract: mirror failures are logged and
    /// swallowed so notification delivery can never fail a settlement
    /// step.
    pub async fn notify(
        &self,
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: NotificationPayload,
    ) {
        let notification = Notification::new(user_id, title, message, payload);

        self.ledger.record_notification(notification.clone()).await;

        if let Some(persistence) = &self.persistence
            && let Err(e) = persistence.insert_notification(&notification).await
        {
            tracing::warn!(
                user_id = %notification.user_id,
                kind = notification.kind(),
                error = %e,
                "notification mirror write failed"
            );
        }

        let _ = self.event_bus.publish(MarketEvent::NotificationPosted {
            user_id: notification.user_id.clone(),
            notification,
        });
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::ListingId;

    #[tokio::test]
    async fn notify_appends_to_feed_and_broadcasts() {
        let ledger = Arc::new(SettlementLedger::new());
        let bus = EventBus::new(100);
        let notifier = Notifier::new(Arc::clone(&ledger), bus.clone(), None);
        let mut rx = bus.subscribe();

        notifier
            .notify(
                UserId::new("buyer1"),
                "Acceptance cancelled",
                "Do not make payment",
                NotificationPayload::AcceptanceCancelled {
                    listing_id: ListingId::new(),
                },
            )
            .await;

        let feed = ledger.notifications_for(&UserId::new("buyer1")).await;
        assert_eq!(feed.len(), 1);

        let event = rx.recv().await;
        let Ok(event) = event else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "notification_posted");
        assert_eq!(event.addressed_to(), Some(&UserId::new("buyer1")));
    }

    #[tokio::test]
    async fn notify_without_subscribers_is_silent() {
        let ledger = Arc::new(SettlementLedger::new());
        let notifier = Notifier::new(Arc::clone(&ledger), EventBus::new(100), None);

        notifier
            .notify(
                UserId::new("seller1"),
                "t",
                "m",
                NotificationPayload::AcceptanceCancelled {
                    listing_id: ListingId::new(),
                },
            )
            .await;

        let feed = ledger.notifications_for(&UserId::new("seller1")).await;
        assert_eq!(feed.len(), 1);
    }
}
