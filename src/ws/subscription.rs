//! Per-connection subscription manager.
//!
//! Tracks which listings a WebSocket client watches and provides
//! server-side event filtering. A connection authenticated via the
//! identity headers additionally receives the notifications addressed
//! to that user.

use std::collections::HashSet;

use crate::domain::{ListingId, MarketEvent, UserId};

/// Manages the event filter for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed listing IDs. If `subscribe_all` is true, this set is
    /// ignored.
    listing_ids: HashSet<ListingId>,
    /// Whether the client subscribes to all listings (wildcard `"*"`).
    subscribe_all: bool,
    /// Verified identity of the connection, when present.
    user: Option<UserId>,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager for a connection authenticated as `user`.
    #[must_use]
    pub fn for_user(user: Option<UserId>) -> Self {
        Self {
            user,
            ..Self::default()
        }
    }

    /// Adds listing IDs to the subscription set. `"*"` enables the
    /// wildcard.
    pub fn subscribe(&mut self, ids: &[ListingId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        for id in ids {
            self.listing_ids.insert(*id);
        }
    }

    /// Removes listing IDs from the subscription set.
    pub fn unsubscribe(&mut self, ids: &[ListingId]) {
        for id in ids {
            self.listing_ids.remove(id);
        }
    }

    /// Returns `true` if the event passes this connection's filter.
    ///
    /// User-addressed events (notifications) are delivered only to the
    /// matching authenticated connection; listing events follow the
    /// explicit subscriptions or the wildcard.
    #[must_use]
    pub fn matches(&self, event: &MarketEvent) -> bool {
        if let Some(recipient) = event.addressed_to() {
            return self.user.as_ref() == Some(recipient);
        }
        match event.listing_id() {
            Some(listing_id) => self.subscribe_all || self.listing_ids.contains(&listing_id),
            None => false,
        }
    }

    /// Returns the number of explicitly subscribed listing IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.listing_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Notification, NotificationPayload};
    use chrono::Utc;

    fn listing_event(listing_id: ListingId) -> MarketEvent {
        MarketEvent::ListingDelisted {
            listing_id,
            timestamp: Utc::now(),
        }
    }

    fn notification_event(user: &str) -> MarketEvent {
        MarketEvent::NotificationPosted {
            user_id: UserId::new(user),
            notification: Notification::new(
                UserId::new(user),
                "t",
                "m",
                NotificationPayload::AcceptanceCancelled {
                    listing_id: ListingId::new(),
                },
            ),
        }
    }

    #[test]
    fn empty_matches_nothing() {
        let mgr = SubscriptionManager::new();
        assert!(!mgr.matches(&listing_event(ListingId::new())));
    }

    #[test]
    fn subscribe_specific_listing() {
        let mut mgr = SubscriptionManager::new();
        let id = ListingId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(&listing_event(id)));
        assert!(!mgr.matches(&listing_event(ListingId::new())));
    }

    #[test]
    fn wildcard_matches_every_listing() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(mgr.matches(&listing_event(ListingId::new())));
        assert!(mgr.matches(&listing_event(ListingId::new())));
    }

    #[test]
    fn unsubscribe_removes_listing() {
        let mut mgr = SubscriptionManager::new();
        let id = ListingId::new();
        mgr.subscribe(&[id], false);
        assert!(mgr.matches(&listing_event(id)));
        mgr.unsubscribe(&[id]);
        assert!(!mgr.matches(&listing_event(id)));
    }

    #[test]
    fn notifications_reach_only_their_user() {
        let mine = SubscriptionManager::for_user(Some(UserId::new("buyer1")));
        let other = SubscriptionManager::for_user(Some(UserId::new("buyer2")));
        let anon = SubscriptionManager::new();

        let event = notification_event("buyer1");
        assert!(mine.matches(&event));
        assert!(!other.matches(&event));
        assert!(!anon.matches(&event));
    }

    #[test]
    fn wildcard_does_not_leak_notifications() {
        let mut mgr = SubscriptionManager::new();
        mgr.subscribe(&[], true);
        assert!(!mgr.matches(&notification_event("buyer1")));
    }

    #[test]
    fn count_tracks_explicit() {
        let mut mgr = SubscriptionManager::new();
        assert_eq!(mgr.count(), 0);
        mgr.subscribe(&[ListingId::new(), ListingId::new()], false);
        assert_eq!(mgr.count(), 2);
    }
}
