//! Concurrent listing storage with per-listing fine-grained locking.
//!
//! [`ListingBook`] stores every open listing in a `HashMap` where each
//! entry is individually protected by a [`tokio::sync::RwLock`]. A
//! listing's bids live *inside* its entry, so the entry's write lock is
//! the single-writer serialization point for acceptance and settlement:
//! two racing `accept_bid` calls on different bids of the same listing
//! serialize on the same lock and can never leave two bids accepted.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::bid::Bid;
use super::listing::{Listing, ListingSummary};
use super::{BidId, ListingId};
use crate::error::MarketError;

/// A listing together with its bids and a retirement marker.
#[derive(Debug)]
pub struct ListingEntry {
    /// The listing record.
    pub listing: Listing,

    /// All bids against the listing, in arrival order.
    pub bids: Vec<Bid>,

    /// Set under the entry's write lock when the listing is settled,
    /// delisted, or swept. A retired entry is never shown or mutated
    /// again, even through a stale `Arc` acquired before removal.
    pub retired: bool,
}

impl ListingEntry {
    /// Wraps a listing into a fresh entry with no bids.
    #[must_use]
    pub fn new(listing: Listing) -> Self {
        Self {
            listing,
            bids: Vec::new(),
            retired: false,
        }
    }

    /// The currently accepted bid, if any.
    #[must_use]
    pub fn accepted_bid(&self) -> Option<&Bid> {
        self.bids.iter().find(|b| b.accepted)
    }

    /// Bids ordered by price descending; ties keep arrival order.
    #[must_use]
    pub fn sorted_bids(&self) -> Vec<Bid> {
        let mut bids = self.bids.clone();
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        bids
    }

    /// Builds the list-endpoint projection for this entry.
    #[must_use]
    pub fn summary(&self) -> ListingSummary {
        ListingSummary {
            listing_id: self.listing.id,
            seller_id: self.listing.seller.id.clone(),
            seller_name: self.listing.seller.name.clone(),
            meal_date: self.listing.meal_date,
            meal_type: self.listing.meal_type,
            mess: self.listing.mess.clone(),
            min_price: self.listing.min_price,
            bid_count: self.bids.len(),
            has_accepted_bid: self.accepted_bid().is_some(),
            created_at: self.listing.created_at,
        }
    }
}

/// Authoritative in-memory store for open listings and their bids.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-entry
/// `Arc<RwLock<ListingEntry>>` for fine-grained per-listing locking,
/// plus a secondary `BidId → ListingId` index for bid-addressed
/// operations (withdraw by bid id).
///
/// # Concurrency
///
/// - Multiple tasks may read the same listing concurrently.
/// - Writes to different listings are concurrent.
/// - Writes to the same listing (bids, acceptance, settlement) are
///   serialized on the entry lock.
#[derive(Debug)]
pub struct ListingBook {
    listings: RwLock<HashMap<ListingId, Arc<RwLock<ListingEntry>>>>,
    bid_index: RwLock<HashMap<BidId, ListingId>>,
}

impl ListingBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            bid_index: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new listing into the book.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] if a listing with the
    /// same ID already exists (should never happen with UUID v4).
    pub async fn insert(&self, listing: Listing) -> Result<ListingId, MarketError> {
        let listing_id = listing.id;
        let mut map = self.listings.write().await;
        if map.contains_key(&listing_id) {
            return Err(MarketError::InvalidRequest(format!(
                "listing {listing_id} already exists"
            )));
        }
        map.insert(listing_id, Arc::new(RwLock::new(ListingEntry::new(listing))));
        Ok(listing_id)
    }

    /// Returns a shared reference to the entry behind its per-listing lock.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] if no listing with the
    /// given ID exists.
    pub async fn get(&self, listing_id: ListingId) -> Result<Arc<RwLock<ListingEntry>>, MarketError> {
        let map = self.listings.read().await;
        map.get(&listing_id)
            .cloned()
            .ok_or(MarketError::ListingNotFound(*listing_id.as_uuid()))
    }

    /// Removes a listing from the book, returning its entry handle.
    ///
    /// Returns `None` when the listing is already gone, so removal is
    /// idempotent for callers that race each other (settlement vs.
    /// sweep). Bid-index entries must be removed separately via
    /// [`Self::unindex_bids`].
    pub async fn remove(&self, listing_id: ListingId) -> Option<Arc<RwLock<ListingEntry>>> {
        let mut map = self.listings.write().await;
        map.remove(&listing_id)
    }

    /// Records a bid id as belonging to a listing.
    pub async fn index_bid(&self, bid_id: BidId, listing_id: ListingId) {
        let mut index = self.bid_index.write().await;
        index.insert(bid_id, listing_id);
    }

    /// Resolves the listing a bid belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::BidNotFound`] if the bid id is unknown.
    pub async fn resolve_bid(&self, bid_id: BidId) -> Result<ListingId, MarketError> {
        let index = self.bid_index.read().await;
        index
            .get(&bid_id)
            .copied()
            .ok_or(MarketError::BidNotFound(*bid_id.as_uuid()))
    }

    /// Drops index entries for bids that no longer exist.
    pub async fn unindex_bids(&self, bid_ids: &[BidId]) {
        let mut index = self.bid_index.write().await;
        for bid_id in bid_ids {
            index.remove(bid_id);
        }
    }

    /// Returns summaries of all open (non-retired) listings.
    pub async fn list_open(&self) -> Vec<ListingSummary> {
        let map = self.listings.read().await;
        let mut summaries = Vec::with_capacity(map.len());
        for entry_lock in map.values() {
            let entry = entry_lock.read().await;
            if entry.retired {
                continue;
            }
            summaries.push(entry.summary());
        }
        summaries
    }

    /// Broad candidate set for the expiry sweep: every listing dated
    /// today or earlier. The caller re-checks each candidate against
    /// the pure expiry predicate before deleting.
    pub async fn expiry_candidates(&self, today: NaiveDate) -> Vec<ListingId> {
        let map = self.listings.read().await;
        let mut candidates = Vec::new();
        for entry_lock in map.values() {
            let entry = entry_lock.read().await;
            if !entry.retired && entry.listing.meal_date <= today {
                candidates.push(entry.listing.id);
            }
        }
        candidates
    }

    /// Returns the number of listings in the book.
    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    /// Returns `true` if the book contains no listings.
    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }
}

impl Default for ListingBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{MealType, UserProfile};

    fn make_listing(date: &str) -> Listing {
        let meal_date = date.parse().unwrap_or_else(|_| {
            panic!("bad test date: {date}");
        });
        Listing::new(
            UserProfile::new("seller1", "Ravi", "ravi@campus.edu"),
            meal_date,
            MealType::Lunch,
            "Mess A".to_string(),
            50,
        )
    }

    fn make_bid(listing_id: ListingId, buyer: &str, price: u32) -> Bid {
        Bid::new(
            listing_id,
            UserProfile::new(buyer, buyer, format!("{buyer}@campus.edu")),
            price,
        )
    }

    #[tokio::test]
    async fn insert_and_get() {
        let book = ListingBook::new();
        let listing = make_listing("2024-05-01");
        let id = listing.id;

        let result = book.insert(listing).await;
        assert!(result.is_ok());

        let fetched = book.get(id).await;
        assert!(fetched.is_ok());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let book = ListingBook::new();
        let result = book.get(ListingId::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let book = ListingBook::new();
        let listing = make_listing("2024-05-01");
        let id = listing.id;
        let _ = book.insert(listing).await;

        assert!(book.remove(id).await.is_some());
        assert!(book.remove(id).await.is_none());
        assert!(book.get(id).await.is_err());
    }

    #[tokio::test]
    async fn bid_index_resolves_and_unindexes() {
        let book = ListingBook::new();
        let listing = make_listing("2024-05-01");
        let listing_id = listing.id;
        let _ = book.insert(listing).await;

        let bid_id = BidId::new();
        book.index_bid(bid_id, listing_id).await;
        assert_eq!(book.resolve_bid(bid_id).await.ok(), Some(listing_id));

        book.unindex_bids(&[bid_id]).await;
        assert!(book.resolve_bid(bid_id).await.is_err());
    }

    #[tokio::test]
    async fn list_open_skips_retired() {
        let book = ListingBook::new();
        let keep = make_listing("2024-05-01");
        let retire = make_listing("2024-05-01");
        let retire_id = retire.id;
        let _ = book.insert(keep).await;
        let _ = book.insert(retire).await;

        let entry_lock = book.get(retire_id).await;
        let Ok(entry_lock) = entry_lock else {
            panic!("listing not found");
        };
        entry_lock.write().await.retired = true;

        let open = book.list_open().await;
        assert_eq!(open.len(), 1);
    }

    #[tokio::test]
    async fn expiry_candidates_are_date_bounded() {
        let book = ListingBook::new();
        let _ = book.insert(make_listing("2024-04-30")).await;
        let _ = book.insert(make_listing("2024-05-01")).await;
        let _ = book.insert(make_listing("2024-05-02")).await;

        let today = "2024-05-01".parse().unwrap_or_else(|_| {
            panic!("bad date");
        });
        let candidates = book.expiry_candidates(today).await;
        assert_eq!(candidates.len(), 2);
    }

    #[tokio::test]
    async fn sorted_bids_order_price_desc_with_stable_ties() {
        let book = ListingBook::new();
        let listing = make_listing("2024-05-01");
        let listing_id = listing.id;
        let _ = book.insert(listing).await;

        let entry_lock = book.get(listing_id).await;
        let Ok(entry_lock) = entry_lock else {
            panic!("listing not found");
        };
        let mut entry = entry_lock.write().await;
        entry.bids.push(make_bid(listing_id, "buyer1", 40));
        entry.bids.push(make_bid(listing_id, "buyer2", 60));
        entry.bids.push(make_bid(listing_id, "buyer3", 40));

        let sorted = entry.sorted_bids();
        let prices: Vec<u32> = sorted.iter().map(|b| b.price).collect();
        assert_eq!(prices, vec![60, 40, 40]);
        // Equal prices keep arrival order.
        let names: Vec<&str> = sorted
            .iter()
            .filter(|b| b.price == 40)
            .map(|b| b.buyer.name.as_str())
            .collect();
        assert_eq!(names, vec!["buyer1", "buyer3"]);
    }
}
