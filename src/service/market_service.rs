//! Market service: the bid/listing lifecycle and settlement state machine.
//!
//! Orchestrates every marketplace mutation: listing creation and
//! withdrawal, bidding, acceptance, the multi-step settlement saga, and
//! the expiry sweep. Each mutation follows the pattern: acquire the
//! per-listing lock → check ownership and state → write → release →
//! notify → emit events. Acceptance and settlement for one listing are
//! serialized on that listing's entry lock, which is what keeps "at
//! most one accepted bid" true under concurrent accepts.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{
    Bid, BidId, EventBus, Listing, ListingBook, ListingId, ListingSummary, MarketClock,
    MarketEvent, MealType, Notification, NotificationPayload, PurchaseId, PurchaseRecord,
    PurchaseView, SettlementLedger, TransactionId, TransactionRecord, UserId, UserProfile,
    is_expired,
};
use crate::error::MarketError;
use crate::persistence::PostgresPersistence;
use crate::service::notifier::Notifier;
use crate::service::registration::RegistrationProvider;

/// Result of placing or re-pricing a bid.
#[derive(Debug, Clone)]
pub struct BidOutcome {
    /// The bid as stored.
    pub bid: Bid,
    /// Whether the offer is below the listing's minimum price. The
    /// bid is still accepted into the book; this flag lets the caller
    /// warn the bidder.
    pub below_min: bool,
}

/// Result of a completed settlement.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    /// The recorded transaction.
    pub transaction_id: TransactionId,
    /// The recorded purchase.
    pub purchase_id: PurchaseId,
    /// Final sale price.
    pub sold_price: u32,
    /// Whether a redemption token was captured. `false` marks a
    /// degraded-but-recorded settlement (token fetch failed).
    pub token_available: bool,
}

/// Orchestration layer for all marketplace operations.
///
/// Stateless coordinator: owns handles to the [`ListingBook`] and
/// [`SettlementLedger`] for state, the [`RegistrationProvider`] for
/// upstream lookups, and the [`EventBus`] / [`Notifier`] for fan-out.
/// Store handles are injected explicitly; there is no ambient global
/// client anywhere in the crate.
#[derive(Debug, Clone)]
pub struct MarketService {
    book: Arc<ListingBook>,
    ledger: Arc<SettlementLedger>,
    registration: Arc<dyn RegistrationProvider>,
    notifier: Notifier,
    event_bus: EventBus,
    persistence: Option<Arc<PostgresPersistence>>,
    clock: MarketClock,
}

impl MarketService {
    /// Creates a new `MarketService`.
    #[must_use]
    pub fn new(
        book: Arc<ListingBook>,
        ledger: Arc<SettlementLedger>,
        registration: Arc<dyn RegistrationProvider>,
        event_bus: EventBus,
        persistence: Option<Arc<PostgresPersistence>>,
        clock: MarketClock,
    ) -> Self {
        let notifier = Notifier::new(
            Arc::clone(&ledger),
            event_bus.clone(),
            persistence.clone(),
        );
        Self {
            book,
            ledger,
            registration,
            notifier,
            event_bus,
            persistence,
            clock,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`ListingBook`].
    #[must_use]
    pub fn book(&self) -> &Arc<ListingBook> {
        &self.book
    }

    /// Returns a reference to the inner [`SettlementLedger`].
    #[must_use]
    pub fn ledger(&self) -> &Arc<SettlementLedger> {
        &self.ledger
    }

    /// Returns the pinned market clock.
    #[must_use]
    pub const fn clock(&self) -> MarketClock {
        self.clock
    }

    // ── Listings ────────────────────────────────────────────────────────

    /// Creates a listing for one of the seller's meal slots.
    ///
    /// When `mess` is absent the venue is auto-populated from the
    /// seller's meal registration.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidRequest`] if the meal window has
    /// already passed, or a registration-service error when the venue
    /// lookup fails.
    pub async fn create_listing(
        &self,
        seller: UserProfile,
        meal_date: NaiveDate,
        meal_type: MealType,
        mess: Option<String>,
        min_price: u32,
    ) -> Result<ListingSummary, MarketError> {
        if is_expired(meal_date, meal_type, self.clock.now()) {
            return Err(MarketError::InvalidRequest(format!(
                "meal window for {meal_type} on {meal_date} has already passed"
            )));
        }

        let mess = match mess.filter(|m| !m.trim().is_empty()) {
            Some(m) => m,
            None => {
                self.registration
                    .registration(&seller.id, meal_date, meal_type)
                    .await?
                    .mess
            }
        };

        let listing = Listing::new(seller, meal_date, meal_type, mess, min_price);
        let listing_id = listing.id;
        let summary = ListingSummary {
            listing_id,
            seller_id: listing.seller.id.clone(),
            seller_name: listing.seller.name.clone(),
            meal_date,
            meal_type,
            mess: listing.mess.clone(),
            min_price,
            bid_count: 0,
            has_accepted_bid: false,
            created_at: listing.created_at,
        };
        let seller_id = listing.seller.id.clone();
        let mess_name = listing.mess.clone();
        self.book.insert(listing).await?;

        let _ = self.event_bus.publish(MarketEvent::ListingCreated {
            listing_id,
            seller_id,
            meal_date,
            meal_type,
            mess: mess_name,
            min_price,
            timestamp: Utc::now(),
        });

        tracing::info!(%listing_id, %meal_type, %meal_date, "listing created");
        Ok(summary)
    }

    /// Edits the minimum price of an unsettled listing. Seller-only,
    /// and refused once any bid has been accepted.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotSeller`] for non-owners and
    /// [`MarketError::AlreadyAccepted`] once a bid is accepted.
    pub async fn update_min_price(
        &self,
        listing_id: ListingId,
        seller_id: &UserId,
        min_price: u32,
    ) -> Result<ListingSummary, MarketError> {
        let entry_lock = self.book.get(listing_id).await?;
        let mut entry = entry_lock.write().await;
        if entry.retired {
            return Err(MarketError::ListingNotFound(*listing_id.as_uuid()));
        }
        if entry.listing.seller.id != *seller_id {
            return Err(MarketError::NotSeller);
        }
        if entry.accepted_bid().is_some() {
            return Err(MarketError::AlreadyAccepted);
        }

        let old_min_price = entry.listing.min_price;
        entry.listing.min_price = min_price;
        let summary = entry.summary();
        drop(entry);

        let _ = self.event_bus.publish(MarketEvent::ListingRepriced {
            listing_id,
            old_min_price,
            new_min_price: min_price,
            timestamp: Utc::now(),
        });

        Ok(summary)
    }

    /// Withdraws an unsettled listing, cascading its bids. Seller-only
    /// and idempotent: deleting an already-deleted listing succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotSeller`] if the caller does not own
    /// the listing.
    pub async fn delete_listing(
        &self,
        listing_id: ListingId,
        seller_id: &UserId,
    ) -> Result<(), MarketError> {
        let Ok(entry_lock) = self.book.get(listing_id).await else {
            // Already gone; deletion is idempotent.
            return Ok(());
        };
        let mut entry = entry_lock.write().await;
        if entry.retired {
            return Ok(());
        }
        if entry.listing.seller.id != *seller_id {
            return Err(MarketError::NotSeller);
        }

        entry.retired = true;
        let bid_ids: Vec<BidId> = entry.bids.iter().map(|b| b.id).collect();
        entry.bids.clear();
        drop(entry);

        let _ = self.book.remove(listing_id).await;
        self.book.unindex_bids(&bid_ids).await;

        let _ = self.event_bus.publish(MarketEvent::ListingDelisted {
            listing_id,
            timestamp: Utc::now(),
        });

        tracing::info!(%listing_id, "listing delisted by seller");
        Ok(())
    }

    /// Returns summaries of all open listings, soonest meal first.
    pub async fn list_open_listings(&self) -> Vec<ListingSummary> {
        let mut summaries = self.book.list_open().await;
        summaries.sort_by(|a, b| {
            a.meal_date
                .cmp(&b.meal_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        summaries
    }

    /// Returns one listing with its bids ordered by price descending.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::ListingNotFound`] for unknown or retired
    /// listings.
    pub async fn listing_detail(
        &self,
        listing_id: ListingId,
    ) -> Result<(ListingSummary, Vec<Bid>), MarketError> {
        let entry_lock = self.book.get(listing_id).await?;
        let entry = entry_lock.read().await;
        if entry.retired {
            return Err(MarketError::ListingNotFound(*listing_id.as_uuid()));
        }
        Ok((entry.summary(), entry.sorted_bids()))
    }

    // ── Bids ────────────────────────────────────────────────────────────

    /// Places a first bid on a listing.
    ///
    /// A bid below the listing minimum is allowed; the outcome flags it
    /// so the caller can warn the bidder. Notifies the seller.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::DuplicateBid`] if the buyer already has a
    /// bid on this listing (the caller must use `update_bid` instead),
    /// or [`MarketError::InvalidRequest`] when bidding on one's own
    /// listing.
    pub async fn place_bid(
        &self,
        buyer: UserProfile,
        listing_id: ListingId,
        price: u32,
    ) -> Result<BidOutcome, MarketError> {
        let entry_lock = self.book.get(listing_id).await?;
        let mut entry = entry_lock.write().await;
        if entry.retired {
            return Err(MarketError::ListingNotFound(*listing_id.as_uuid()));
        }
        if entry.listing.seller.id == buyer.id {
            return Err(MarketError::InvalidRequest(
                "cannot bid on your own listing".to_string(),
            ));
        }
        if entry.bids.iter().any(|b| b.buyer.id == buyer.id) {
            return Err(MarketError::DuplicateBid);
        }

        let below_min = price < entry.listing.min_price;
        let bid = Bid::new(listing_id, buyer, price);
        let bid_id = bid.id;
        let seller = entry.listing.seller.clone();
        entry.bids.push(bid.clone());
        drop(entry);

        self.book.index_bid(bid_id, listing_id).await;

        self.notifier
            .notify(
                seller.id.clone(),
                "New bid received",
                format!("{} offered ₹{} for your meal", bid.buyer.name, price),
                NotificationPayload::BidActivity {
                    listing_id,
                    bid_id,
                    bidder_name: bid.buyer.name.clone(),
                    price,
                },
            )
            .await;

        let _ = self.event_bus.publish(MarketEvent::BidPlaced {
            listing_id,
            bid_id,
            buyer_id: bid.buyer.id.clone(),
            price,
            below_min,
            timestamp: Utc::now(),
        });

        Ok(BidOutcome { bid, below_min })
    }

    /// Re-prices the caller's existing bid on a listing.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::BidNotFound`] if the buyer has no bid on
    /// the listing and [`MarketError::AlreadyAccepted`] once the bid
    /// has been accepted (post-acceptance price changes are refused at
    /// the store level, not just in the UI).
    pub async fn update_bid(
        &self,
        buyer_id: &UserId,
        listing_id: ListingId,
        price: u32,
    ) -> Result<BidOutcome, MarketError> {
        let entry_lock = self.book.get(listing_id).await?;
        let mut entry = entry_lock.write().await;
        if entry.retired {
            return Err(MarketError::ListingNotFound(*listing_id.as_uuid()));
        }
        let min_price = entry.listing.min_price;
        let seller = entry.listing.seller.clone();
        let Some(bid) = entry.bids.iter_mut().find(|b| b.buyer.id == *buyer_id) else {
            return Err(MarketError::BidNotFound(uuid::Uuid::nil()));
        };
        if bid.accepted {
            return Err(MarketError::AlreadyAccepted);
        }

        let old_price = bid.price;
        bid.price = price;
        let updated = bid.clone();
        drop(entry);

        self.notifier
            .notify(
                seller.id.clone(),
                "Bid updated",
                format!(
                    "{} changed their offer from ₹{old_price} to ₹{price}",
                    updated.buyer.name
                ),
                NotificationPayload::BidActivity {
                    listing_id,
                    bid_id: updated.id,
                    bidder_name: updated.buyer.name.clone(),
                    price,
                },
            )
            .await;

        let _ = self.event_bus.publish(MarketEvent::BidUpdated {
            listing_id,
            bid_id: updated.id,
            old_price,
            new_price: price,
            timestamp: Utc::now(),
        });

        Ok(BidOutcome {
            below_min: price < min_price,
            bid: updated,
        })
    }

    /// Withdraws the caller's bid. Buyer-only, refused once accepted,
    /// and idempotent: withdrawing an already-removed bid succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotBuyer`] if the caller does not own the
    /// bid and [`MarketError::AlreadyAccepted`] if it has been accepted
    /// (the seller must cancel the acceptance instead).
    pub async fn withdraw_bid(&self, buyer_id: &UserId, bid_id: BidId) -> Result<(), MarketError> {
        let Ok(listing_id) = self.book.resolve_bid(bid_id).await else {
            // Already gone; withdrawal is idempotent.
            return Ok(());
        };
        let Ok(entry_lock) = self.book.get(listing_id).await else {
            self.book.unindex_bids(&[bid_id]).await;
            return Ok(());
        };
        let mut entry = entry_lock.write().await;
        let Some(position) = entry.bids.iter().position(|b| b.id == bid_id) else {
            drop(entry);
            self.book.unindex_bids(&[bid_id]).await;
            return Ok(());
        };
        let Some(bid) = entry.bids.get(position) else {
            return Err(MarketError::Internal("bid position out of range".to_string()));
        };
        if bid.buyer.id != *buyer_id {
            return Err(MarketError::NotBuyer);
        }
        if bid.accepted {
            return Err(MarketError::AlreadyAccepted);
        }

        entry.bids.remove(position);
        drop(entry);
        self.book.unindex_bids(&[bid_id]).await;

        let _ = self.event_bus.publish(MarketEvent::BidWithdrawn {
            listing_id,
            bid_id,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    // ── Settlement state machine ────────────────────────────────────────

    /// Accepts one bid, clearing the accepted flag from any other bid
    /// on the listing in the same serialized write. Seller-only.
    ///
    /// Both parties are notified with a contact-exchange payload so
    /// they can coordinate payment off-platform.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotSeller`] or
    /// [`MarketError::BidNotFound`].
    pub async fn accept_bid(
        &self,
        listing_id: ListingId,
        bid_id: BidId,
        seller_id: &UserId,
    ) -> Result<(), MarketError> {
        let entry_lock = self.book.get(listing_id).await?;
        // The entry write lock is the serialization point: a concurrent
        // accept on a different bid of the same listing queues here, so
        // clear-then-set below can never interleave.
        let mut entry = entry_lock.write().await;
        if entry.retired {
            return Err(MarketError::ListingNotFound(*listing_id.as_uuid()));
        }
        if entry.listing.seller.id != *seller_id {
            return Err(MarketError::NotSeller);
        }
        if !entry.bids.iter().any(|b| b.id == bid_id) {
            return Err(MarketError::BidNotFound(*bid_id.as_uuid()));
        }

        for bid in &mut entry.bids {
            bid.accepted = bid.id == bid_id;
        }
        let Some(accepted) = entry.bids.iter().find(|b| b.accepted) else {
            return Err(MarketError::Internal("accepted bid vanished".to_string()));
        };
        let buyer = accepted.buyer.clone();
        let price = accepted.price;
        let seller = entry.listing.seller.clone();
        drop(entry);

        self.notifier
            .notify(
                buyer.id.clone(),
                "Bid accepted",
                format!(
                    "{} accepted your offer of ₹{price}. Contact them to arrange payment.",
                    seller.name
                ),
                NotificationPayload::ContactExchange {
                    listing_id,
                    bid_id,
                    counterparty_name: seller.name.clone(),
                    counterparty_email: seller.email.clone(),
                    price,
                },
            )
            .await;
        // Self-record for the seller with the buyer's contact details.
        self.notifier
            .notify(
                seller.id.clone(),
                "Bid accepted",
                format!("You accepted {}'s offer of ₹{price}.", buyer.name),
                NotificationPayload::ContactExchange {
                    listing_id,
                    bid_id,
                    counterparty_name: buyer.name.clone(),
                    counterparty_email: buyer.email.clone(),
                    price,
                },
            )
            .await;

        let _ = self.event_bus.publish(MarketEvent::BidAccepted {
            listing_id,
            bid_id,
            buyer_id: buyer.id.clone(),
            price,
            timestamp: Utc::now(),
        });

        tracing::info!(%listing_id, %bid_id, price, "bid accepted");
        Ok(())
    }

    /// Reverses an acceptance before payment by deleting the bid
    /// outright — the buyer must re-bid to participate again. Notifies
    /// the buyer that no payment should be made. Seller-only.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotSeller`], [`MarketError::BidNotFound`]
    /// or [`MarketError::NotAccepted`].
    pub async fn cancel_accepted_bid(
        &self,
        listing_id: ListingId,
        bid_id: BidId,
        seller_id: &UserId,
    ) -> Result<(), MarketError> {
        let entry_lock = self.book.get(listing_id).await?;
        let mut entry = entry_lock.write().await;
        if entry.retired {
            return Err(MarketError::ListingNotFound(*listing_id.as_uuid()));
        }
        if entry.listing.seller.id != *seller_id {
            return Err(MarketError::NotSeller);
        }
        let Some(position) = entry.bids.iter().position(|b| b.id == bid_id) else {
            return Err(MarketError::BidNotFound(*bid_id.as_uuid()));
        };
        let Some(bid) = entry.bids.get(position) else {
            return Err(MarketError::Internal("bid position out of range".to_string()));
        };
        if !bid.accepted {
            return Err(MarketError::NotAccepted);
        }
        if bid.paid {
            return Err(MarketError::InvalidRequest(
                "bid is already paid; settlement cannot be cancelled".to_string(),
            ));
        }

        let bid = entry.bids.remove(position);
        drop(entry);
        self.book.unindex_bids(&[bid_id]).await;

        self.notifier
            .notify(
                bid.buyer.id.clone(),
                "Acceptance cancelled",
                "The seller cancelled the acceptance. Do not make any payment.".to_string(),
                NotificationPayload::AcceptanceCancelled { listing_id },
            )
            .await;

        let _ = self.event_bus.publish(MarketEvent::AcceptanceCancelled {
            listing_id,
            bid_id,
            buyer_id: bid.buyer.id.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(%listing_id, %bid_id, "acceptance cancelled");
        Ok(())
    }

    /// Terminal settlement step: the seller attests that payment was
    /// received for the accepted bid.
    ///
    /// Writes the transaction record, fetches the seller's redemption
    /// token (the seller transfers their meal credential to the buyer),
    /// writes the purchase record, cascades the listing's bids, retires
    /// the listing, and notifies both parties. The token fetch is the
    /// one step allowed to fail without aborting: a sale recorded
    /// without its token is recoverable, an unrecorded sale is not.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotSeller`], [`MarketError::BidNotFound`]
    /// or [`MarketError::NotAccepted`]. `paid` is only ever set here,
    /// on a bid that is already accepted.
    pub async fn mark_paid(
        &self,
        listing_id: ListingId,
        bid_id: BidId,
        seller_id: &UserId,
    ) -> Result<SettlementOutcome, MarketError> {
        let entry_lock = self.book.get(listing_id).await?;
        let mut entry = entry_lock.write().await;
        if entry.retired {
            return Err(MarketError::ListingNotFound(*listing_id.as_uuid()));
        }
        if entry.listing.seller.id != *seller_id {
            return Err(MarketError::NotSeller);
        }
        let Some(bid) = entry.bids.iter_mut().find(|b| b.id == bid_id) else {
            return Err(MarketError::BidNotFound(*bid_id.as_uuid()));
        };
        if !bid.accepted {
            return Err(MarketError::NotAccepted);
        }

        // Step 1: terminal flag on the bid.
        bid.paid = true;
        let buyer = bid.buyer.clone();
        let sold_price = bid.price;
        let listing = entry.listing.clone();
        let settled_at = Utc::now();

        // Step 2: immutable transaction record.
        let transaction = TransactionRecord {
            id: TransactionId::new(),
            listing_id,
            meal_date: listing.meal_date,
            meal_type: listing.meal_type,
            mess: listing.mess.clone(),
            sold_price,
            listing_price: listing.min_price,
            buyer: buyer.clone(),
            seller: listing.seller.clone(),
            listed_at: listing.created_at,
            settled_at,
        };
        self.ledger.record_transaction(transaction.clone()).await;
        self.mirror_transaction(&transaction).await;

        // Step 3: the seller's redemption token. Degrades instead of
        // aborting: the sale stays recorded even when the upstream
        // credential service is down.
        let token = match self
            .registration
            .registration(&listing.seller.id, listing.meal_date, listing.meal_type)
            .await
        {
            Ok(reg) => Some(reg.redemption_token),
            Err(e) => {
                tracing::warn!(
                    %listing_id,
                    error = %e,
                    "redemption token fetch failed; recording degraded settlement"
                );
                None
            }
        };

        // Step 4: buyer-facing purchase record.
        let purchase = PurchaseRecord {
            id: PurchaseId::new(),
            transaction_id: transaction.id,
            redemption_token: token.clone(),
            meal_date: listing.meal_date,
            created_at: settled_at,
        };
        self.ledger.record_purchase(purchase.clone()).await;
        self.mirror_purchase(&purchase).await;

        // Steps 5–6: cascade bids and retire the listing. `retired` is
        // flipped before the entry lock is released, so a stale handle
        // can never observe this listing as open again.
        let bid_ids: Vec<BidId> = entry.bids.iter().map(|b| b.id).collect();
        entry.bids.clear();
        entry.retired = true;
        drop(entry);
        let _ = self.book.remove(listing_id).await;
        self.book.unindex_bids(&bid_ids).await;

        // Step 7: notifications, after every write has landed.
        self.notifier
            .notify(
                buyer.id.clone(),
                "Payment confirmed",
                format!(
                    "Your purchase of {} on {} at {} is confirmed.",
                    listing.meal_type, listing.meal_date, listing.mess
                ),
                NotificationPayload::PaymentConfirmed {
                    listing_id,
                    transaction_id: transaction.id,
                    token_available: token.is_some(),
                },
            )
            .await;
        self.notifier
            .notify(
                listing.seller.id.clone(),
                "Sale recorded",
                format!("Sale to {} for ₹{sold_price} is recorded.", buyer.name),
                NotificationPayload::PaymentConfirmed {
                    listing_id,
                    transaction_id: transaction.id,
                    token_available: token.is_some(),
                },
            )
            .await;

        let _ = self.event_bus.publish(MarketEvent::ListingSettled {
            listing_id,
            bid_id,
            buyer_id: buyer.id.clone(),
            seller_id: listing.seller.id.clone(),
            sold_price,
            timestamp: settled_at,
        });

        tracing::info!(%listing_id, %bid_id, sold_price, "listing settled");
        Ok(SettlementOutcome {
            transaction_id: transaction.id,
            purchase_id: purchase.id,
            sold_price,
            token_available: token.is_some(),
        })
    }

    // ── Expiry sweep ────────────────────────────────────────────────────

    /// Deletes every listing whose meal window has passed at `now`,
    /// cascading bids and notifying the seller and all bidders.
    ///
    /// Idempotent: a second run with no newly-expired listings deletes
    /// nothing. `now` is passed in explicitly so the externally
    /// triggered sweep and the request-path checks share one clock.
    /// Returns the number of listings deleted.
    pub async fn sweep(&self, now: DateTime<FixedOffset>) -> usize {
        let today = now.date_naive();
        let candidates = self.book.expiry_candidates(today).await;
        let mut deleted = 0usize;

        for listing_id in candidates {
            let Ok(entry_lock) = self.book.get(listing_id).await else {
                continue;
            };
            let mut entry = entry_lock.write().await;
            if entry.retired
                || !is_expired(entry.listing.meal_date, entry.listing.meal_type, now)
            {
                continue;
            }

            entry.retired = true;
            let listing = entry.listing.clone();
            let bid_ids: Vec<BidId> = entry.bids.iter().map(|b| b.id).collect();
            let bidders: Vec<UserId> = entry.bids.iter().map(|b| b.buyer.id.clone()).collect();
            entry.bids.clear();
            drop(entry);

            let _ = self.book.remove(listing_id).await;
            self.book.unindex_bids(&bid_ids).await;

            let payload = NotificationPayload::ListingExpired {
                listing_id,
                meal_date: listing.meal_date,
                meal_type: listing.meal_type,
            };
            self.notifier
                .notify(
                    listing.seller.id.clone(),
                    "Listing expired",
                    format!(
                        "Your {} listing for {} expired unsold.",
                        listing.meal_type, listing.meal_date
                    ),
                    payload.clone(),
                )
                .await;
            for bidder in bidders {
                self.notifier
                    .notify(
                        bidder,
                        "Listing expired",
                        format!(
                            "The {} listing for {} you bid on has expired.",
                            listing.meal_type, listing.meal_date
                        ),
                        payload.clone(),
                    )
                    .await;
            }

            let _ = self.event_bus.publish(MarketEvent::ListingExpired {
                listing_id,
                meal_date: listing.meal_date,
                meal_type: listing.meal_type,
                timestamp: Utc::now(),
            });

            deleted = deleted.saturating_add(1);
        }

        tracing::info!(deleted, "expiry sweep complete");
        deleted
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// The buyer's active purchases (meal date >= today on the pinned
    /// market clock).
    pub async fn active_purchases(&self, buyer: &UserId) -> Vec<PurchaseView> {
        self.ledger
            .active_purchases(buyer, self.clock.today())
            .await
    }

    /// The user's transaction history, as buyer or seller.
    pub async fn transactions_for(&self, user: &UserId) -> Vec<TransactionRecord> {
        self.ledger.transactions_for(user).await
    }

    /// The user's notification feed.
    pub async fn notifications_for(&self, user: &UserId) -> Vec<Notification> {
        self.ledger.notifications_for(user).await
    }

    // ── Mirror helpers ──────────────────────────────────────────────────

    async fn mirror_transaction(&self, record: &TransactionRecord) {
        if let Some(persistence) = &self.persistence
            && let Err(e) = persistence.insert_transaction(record).await
        {
            tracing::error!(
                transaction_id = %record.id,
                error = %e,
                "transaction mirror write failed"
            );
        }
    }

    async fn mirror_purchase(&self, record: &PurchaseRecord) {
        if let Some(persistence) = &self.persistence
            && let Err(e) = persistence.insert_purchase(record).await
        {
            tracing::error!(
                purchase_id = %record.id,
                error = %e,
                "purchase mirror write failed"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::registration::{MessRegistration, RegistrationError};
    use async_trait::async_trait;

    /// Canned registration provider for tests.
    #[derive(Debug)]
    struct StubRegistration {
        mode: StubMode,
    }

    #[derive(Debug, Clone, Copy)]
    enum StubMode {
        Success,
        NotRegistered,
        Unavailable,
    }

    #[async_trait]
    impl RegistrationProvider for StubRegistration {
        async fn registration(
            &self,
            user: &UserId,
            date: NaiveDate,
            meal: MealType,
        ) -> Result<MessRegistration, RegistrationError> {
            match self.mode {
                StubMode::Success => Ok(MessRegistration {
                    mess: "Mess A".to_string(),
                    redemption_token: format!("tok-{user}"),
                }),
                StubMode::NotRegistered => Err(RegistrationError::NotRegistered {
                    user: user.clone(),
                    date,
                    meal,
                }),
                StubMode::Unavailable => {
                    Err(RegistrationError::Transport("connection refused".to_string()))
                }
            }
        }
    }

    fn make_service(mode: StubMode) -> MarketService {
        let book = Arc::new(ListingBook::new());
        let ledger = Arc::new(SettlementLedger::new());
        let event_bus = EventBus::new(1000);
        let clock = MarketClock::from_offset_minutes(330).unwrap_or_else(|_| {
            panic!("valid offset");
        });
        MarketService::new(
            book,
            ledger,
            Arc::new(StubRegistration { mode }),
            event_bus,
            None,
            clock,
        )
    }

    fn seller() -> UserProfile {
        UserProfile::new("seller1", "Ravi", "ravi@campus.edu")
    }

    fn buyer(n: u32) -> UserProfile {
        UserProfile::new(
            format!("buyer{n}"),
            format!("Buyer {n}"),
            format!("buyer{n}@campus.edu"),
        )
    }

    fn day(date: &str) -> NaiveDate {
        date.parse().unwrap_or_else(|_| {
            panic!("bad test date: {date}");
        })
    }

    fn at(date: &str, hour: u32) -> DateTime<FixedOffset> {
        let s = format!("{date}T{hour:02}:00:00+05:30");
        s.parse().unwrap_or_else(|_| {
            panic!("bad test timestamp: {s}");
        })
    }

    /// Creates a listing on a future date through the service.
    async fn open_listing(service: &MarketService, min_price: u32) -> ListingId {
        let date = service.clock().today() + chrono::Duration::days(3);
        let summary = service
            .create_listing(seller(), date, MealType::Lunch, Some("Mess A".to_string()), min_price)
            .await;
        let Ok(summary) = summary else {
            panic!("listing creation failed");
        };
        summary.listing_id
    }

    /// Inserts a listing on an arbitrary (possibly past) date directly
    /// into the book, for sweep tests.
    async fn seed_listing(service: &MarketService, date: &str, meal: MealType) -> ListingId {
        let listing = Listing::new(seller(), day(date), meal, "Mess A".to_string(), 50);
        let id = listing.id;
        let inserted = service.book().insert(listing).await;
        assert!(inserted.is_ok());
        id
    }

    // ── Listing lifecycle ───────────────────────────────────────────────

    #[tokio::test]
    async fn create_listing_autopopulates_mess_from_registration() {
        let service = make_service(StubMode::Success);
        let date = service.clock().today() + chrono::Duration::days(1);
        let result = service
            .create_listing(seller(), date, MealType::Dinner, None, 50)
            .await;
        let Ok(summary) = result else {
            panic!("creation failed");
        };
        assert_eq!(summary.mess, "Mess A");
    }

    #[tokio::test]
    async fn create_listing_rejects_elapsed_meal_window() {
        let service = make_service(StubMode::Success);
        let result = service
            .create_listing(
                seller(),
                day("2020-01-01"),
                MealType::Lunch,
                Some("Mess A".to_string()),
                50,
            )
            .await;
        assert!(matches!(result, Err(MarketError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn create_listing_surfaces_missing_registration() {
        let service = make_service(StubMode::NotRegistered);
        let date = service.clock().today() + chrono::Duration::days(1);
        let result = service
            .create_listing(seller(), date, MealType::Dinner, None, 50)
            .await;
        assert!(matches!(result, Err(MarketError::NotRegistered(_))));
    }

    #[tokio::test]
    async fn update_min_price_is_seller_only_and_pre_acceptance() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;

        let stranger = UserId::new("mallory");
        let result = service.update_min_price(listing_id, &stranger, 70).await;
        assert!(matches!(result, Err(MarketError::NotSeller)));

        let result = service.update_min_price(listing_id, &seller().id, 70).await;
        assert!(result.is_ok());

        let outcome = service.place_bid(buyer(1), listing_id, 70).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };
        let accepted = service
            .accept_bid(listing_id, outcome.bid.id, &seller().id)
            .await;
        assert!(accepted.is_ok());

        let result = service.update_min_price(listing_id, &seller().id, 90).await;
        assert!(matches!(result, Err(MarketError::AlreadyAccepted)));
    }

    #[tokio::test]
    async fn delete_listing_cascades_and_is_idempotent() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };

        let result = service.delete_listing(listing_id, &seller().id).await;
        assert!(result.is_ok());
        assert!(service.book().get(listing_id).await.is_err());
        assert!(service.book().resolve_bid(outcome.bid.id).await.is_err());

        // Second deletion is a no-op.
        let result = service.delete_listing(listing_id, &seller().id).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn delete_listing_requires_ownership() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let result = service
            .delete_listing(listing_id, &UserId::new("mallory"))
            .await;
        assert!(matches!(result, Err(MarketError::NotSeller)));
    }

    // ── Bid ledger ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn scenario_c_duplicate_bid_then_update() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;

        // Below-minimum bid is allowed but flagged.
        let first = service.place_bid(buyer(1), listing_id, 40).await;
        let Ok(first) = first else {
            panic!("first bid failed");
        };
        assert!(first.below_min);

        // Second placement by the same buyer is rejected.
        let second = service.place_bid(buyer(1), listing_id, 45).await;
        assert!(matches!(second, Err(MarketError::DuplicateBid)));

        // Update succeeds and leaves a single row at the new price.
        let updated = service.update_bid(&buyer(1).id, listing_id, 60).await;
        let Ok(updated) = updated else {
            panic!("update failed");
        };
        assert_eq!(updated.bid.price, 60);
        assert!(!updated.below_min);

        let detail = service.listing_detail(listing_id).await;
        let Ok((summary, bids)) = detail else {
            panic!("detail failed");
        };
        assert_eq!(summary.bid_count, 1);
        assert_eq!(bids.len(), 1);
        assert_eq!(bids.first().map(|b| b.price), Some(60));
    }

    #[tokio::test]
    async fn seller_cannot_bid_on_own_listing() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let result = service.place_bid(seller(), listing_id, 60).await;
        assert!(matches!(result, Err(MarketError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn place_bid_notifies_seller() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let result = service.place_bid(buyer(1), listing_id, 60).await;
        assert!(result.is_ok());

        let feed = service.notifications_for(&seller().id).await;
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.first().map(Notification::kind), Some("bid_activity"));
    }

    #[tokio::test]
    async fn update_bid_post_acceptance_is_rejected() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };
        let accepted = service
            .accept_bid(listing_id, outcome.bid.id, &seller().id)
            .await;
        assert!(accepted.is_ok());

        let result = service.update_bid(&buyer(1).id, listing_id, 80).await;
        assert!(matches!(result, Err(MarketError::AlreadyAccepted)));
    }

    #[tokio::test]
    async fn withdraw_bid_rules() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };
        let bid_id = outcome.bid.id;

        // Only the owner may withdraw.
        let result = service.withdraw_bid(&buyer(2).id, bid_id).await;
        assert!(matches!(result, Err(MarketError::NotBuyer)));

        // Accepted bids cannot be withdrawn by the buyer.
        let accepted = service.accept_bid(listing_id, bid_id, &seller().id).await;
        assert!(accepted.is_ok());
        let result = service.withdraw_bid(&buyer(1).id, bid_id).await;
        assert!(matches!(result, Err(MarketError::AlreadyAccepted)));

        // After the seller cancels the acceptance the bid is gone, and
        // withdrawal of a gone bid is an idempotent no-op.
        let cancelled = service
            .cancel_accepted_bid(listing_id, bid_id, &seller().id)
            .await;
        assert!(cancelled.is_ok());
        let result = service.withdraw_bid(&buyer(1).id, bid_id).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn list_bids_ordered_by_price_with_buyer_identity() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let _ = service.place_bid(buyer(1), listing_id, 40).await;
        let _ = service.place_bid(buyer(2), listing_id, 60).await;
        let _ = service.place_bid(buyer(3), listing_id, 40).await;

        let detail = service.listing_detail(listing_id).await;
        let Ok((_, bids)) = detail else {
            panic!("detail failed");
        };
        let prices: Vec<u32> = bids.iter().map(|b| b.price).collect();
        assert_eq!(prices, vec![60, 40, 40]);
        // Ties keep arrival order, and rows carry display identity.
        let names: Vec<&str> = bids.iter().map(|b| b.buyer.name.as_str()).collect();
        assert_eq!(names, vec!["Buyer 2", "Buyer 1", "Buyer 3"]);
    }

    // ── Settlement state machine ────────────────────────────────────────

    #[tokio::test]
    async fn scenario_d_accepting_another_bid_moves_the_flag() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let b1 = service.place_bid(buyer(1), listing_id, 60).await;
        let b2 = service.place_bid(buyer(2), listing_id, 55).await;
        let (Ok(b1), Ok(b2)) = (b1, b2) else {
            panic!("bids failed");
        };

        let accepted = service.accept_bid(listing_id, b1.bid.id, &seller().id).await;
        assert!(accepted.is_ok());
        let accepted = service.accept_bid(listing_id, b2.bid.id, &seller().id).await;
        assert!(accepted.is_ok());

        let detail = service.listing_detail(listing_id).await;
        let Ok((_, bids)) = detail else {
            panic!("detail failed");
        };
        let accepted_ids: Vec<BidId> =
            bids.iter().filter(|b| b.accepted).map(|b| b.id).collect();
        assert_eq!(accepted_ids, vec![b2.bid.id]);
        // B1 still exists, just no longer accepted.
        assert!(bids.iter().any(|b| b.id == b1.bid.id && !b.accepted));
    }

    #[tokio::test]
    async fn concurrent_accepts_leave_at_most_one_accepted_bid() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let b1 = service.place_bid(buyer(1), listing_id, 60).await;
        let b2 = service.place_bid(buyer(2), listing_id, 55).await;
        let (Ok(b1), Ok(b2)) = (b1, b2) else {
            panic!("bids failed");
        };

        // Race two acceptances on different bids of the same listing.
        // The per-listing write lock serializes clear-then-set, so the
        // later winner fully replaces the earlier one.
        let seller = seller();
        let (r1, r2) = tokio::join!(
            service.accept_bid(listing_id, b1.bid.id, &seller.id),
            service.accept_bid(listing_id, b2.bid.id, &seller.id),
        );
        assert!(r1.is_ok());
        assert!(r2.is_ok());

        let detail = service.listing_detail(listing_id).await;
        let Ok((_, bids)) = detail else {
            panic!("detail failed");
        };
        let accepted_count = bids.iter().filter(|b| b.accepted).count();
        assert_eq!(accepted_count, 1);
    }

    #[tokio::test]
    async fn accept_bid_requires_seller() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };
        let result = service
            .accept_bid(listing_id, outcome.bid.id, &UserId::new("mallory"))
            .await;
        assert!(matches!(result, Err(MarketError::NotSeller)));
    }

    #[tokio::test]
    async fn accept_bid_exchanges_contacts_both_ways() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };
        let accepted = service
            .accept_bid(listing_id, outcome.bid.id, &seller().id)
            .await;
        assert!(accepted.is_ok());

        let buyer_feed = service.notifications_for(&buyer(1).id).await;
        assert!(
            buyer_feed
                .iter()
                .any(|n| n.kind() == "contact_exchange")
        );
        // Seller gets a self-record with the buyer's contact details.
        let seller_feed = service.notifications_for(&seller().id).await;
        assert!(
            seller_feed
                .iter()
                .any(|n| n.kind() == "contact_exchange")
        );
    }

    #[tokio::test]
    async fn mark_paid_requires_prior_acceptance() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };

        let result = service
            .mark_paid(listing_id, outcome.bid.id, &seller().id)
            .await;
        assert!(matches!(result, Err(MarketError::NotAccepted)));

        // The failed call must not have set `paid`: paid implies accepted.
        let detail = service.listing_detail(listing_id).await;
        let Ok((_, bids)) = detail else {
            panic!("detail failed");
        };
        assert!(bids.iter().all(|b| !b.paid || b.accepted));
        assert!(bids.iter().all(|b| !b.paid));
    }

    #[tokio::test]
    async fn scenario_e_mark_paid_settles_completely() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let b1 = service.place_bid(buyer(1), listing_id, 40).await;
        let b2 = service.place_bid(buyer(2), listing_id, 60).await;
        let (Ok(b1), Ok(b2)) = (b1, b2) else {
            panic!("bids failed");
        };
        let accepted = service.accept_bid(listing_id, b2.bid.id, &seller().id).await;
        assert!(accepted.is_ok());

        let outcome = service.mark_paid(listing_id, b2.bid.id, &seller().id).await;
        let Ok(outcome) = outcome else {
            panic!("settlement failed");
        };
        assert_eq!(outcome.sold_price, 60);
        assert!(outcome.token_available);

        // Exactly one transaction, with sold and listing prices.
        let transactions = service.transactions_for(&buyer(2).id).await;
        assert_eq!(transactions.len(), 1);
        let Some(tx) = transactions.first() else {
            panic!("missing transaction");
        };
        assert_eq!(tx.sold_price, 60);
        assert_eq!(tx.listing_price, 50);
        assert_eq!(tx.id, outcome.transaction_id);

        // Exactly one purchase referencing it, carrying the token.
        let purchases = service.active_purchases(&buyer(2).id).await;
        assert_eq!(purchases.len(), 1);
        let Some(purchase) = purchases.first() else {
            panic!("missing purchase");
        };
        assert_eq!(purchase.transaction_id, outcome.transaction_id);
        assert!(purchase.redemption_token.is_some());

        // Zero bids remain for the listing, and the listing is gone.
        assert!(service.book().get(listing_id).await.is_err());
        assert!(service.book().resolve_bid(b1.bid.id).await.is_err());
        assert!(service.book().resolve_bid(b2.bid.id).await.is_err());

        // Buyer is told payment is confirmed and the token is available.
        let feed = service.notifications_for(&buyer(2).id).await;
        assert!(feed.iter().any(|n| n.kind() == "payment_confirmed"));
    }

    #[tokio::test]
    async fn mark_paid_degrades_when_token_fetch_fails() {
        let service = make_service(StubMode::Unavailable);
        // Venue is supplied explicitly so creation does not need the
        // registration service.
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };
        let accepted = service
            .accept_bid(listing_id, outcome.bid.id, &seller().id)
            .await;
        assert!(accepted.is_ok());

        let settled = service
            .mark_paid(listing_id, outcome.bid.id, &seller().id)
            .await;
        let Ok(settled) = settled else {
            panic!("settlement should degrade, not fail");
        };
        assert!(!settled.token_available);

        // The sale is recorded; only the token is missing.
        let purchases = service.active_purchases(&buyer(1).id).await;
        assert_eq!(purchases.len(), 1);
        assert_eq!(
            purchases.first().and_then(|p| p.redemption_token.clone()),
            None
        );
        assert_eq!(service.ledger().transaction_count().await, 1);
    }

    #[tokio::test]
    async fn cancel_accepted_bid_deletes_and_warns_buyer() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };
        let bid_id = outcome.bid.id;
        let accepted = service.accept_bid(listing_id, bid_id, &seller().id).await;
        assert!(accepted.is_ok());

        let cancelled = service
            .cancel_accepted_bid(listing_id, bid_id, &seller().id)
            .await;
        assert!(cancelled.is_ok());

        // The bid is deleted, not merely un-accepted: re-bidding starts over.
        let detail = service.listing_detail(listing_id).await;
        let Ok((_, bids)) = detail else {
            panic!("detail failed");
        };
        assert!(bids.is_empty());
        assert!(service.book().resolve_bid(bid_id).await.is_err());

        let feed = service.notifications_for(&buyer(1).id).await;
        assert!(feed.iter().any(|n| n.kind() == "acceptance_cancelled"));
    }

    #[tokio::test]
    async fn cancel_unaccepted_bid_is_rejected() {
        let service = make_service(StubMode::Success);
        let listing_id = open_listing(&service, 50).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };
        let result = service
            .cancel_accepted_bid(listing_id, outcome.bid.id, &seller().id)
            .await;
        assert!(matches!(result, Err(MarketError::NotAccepted)));
    }

    // ── Expiry sweep ────────────────────────────────────────────────────

    #[tokio::test]
    async fn scenario_a_sweep_deletes_after_cutoff() {
        let service = make_service(StubMode::Success);
        let listing_id = seed_listing(&service, "2024-05-01", MealType::Lunch).await;

        let deleted = service.sweep(at("2024-05-01", 16)).await;
        assert_eq!(deleted, 1);
        assert!(service.book().get(listing_id).await.is_err());
    }

    #[tokio::test]
    async fn scenario_b_sweep_retains_before_cutoff() {
        let service = make_service(StubMode::Success);
        let listing_id = seed_listing(&service, "2024-05-01", MealType::Lunch).await;

        let deleted = service.sweep(at("2024-05-01", 14)).await;
        assert_eq!(deleted, 0);
        assert!(service.book().get(listing_id).await.is_ok());
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let service = make_service(StubMode::Success);
        let _ = seed_listing(&service, "2024-04-30", MealType::Dinner).await;
        let _ = seed_listing(&service, "2024-05-01", MealType::Breakfast).await;

        let first = service.sweep(at("2024-05-01", 11)).await;
        assert_eq!(first, 2);
        let second = service.sweep(at("2024-05-01", 11)).await;
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn sweep_cascades_bids_and_notifies_bidders() {
        let service = make_service(StubMode::Success);
        let listing_id = seed_listing(&service, "2024-05-01", MealType::Lunch).await;
        let outcome = service.place_bid(buyer(1), listing_id, 60).await;
        let Ok(outcome) = outcome else {
            panic!("bid failed");
        };

        let deleted = service.sweep(at("2024-05-02", 9)).await;
        assert_eq!(deleted, 1);
        assert!(service.book().resolve_bid(outcome.bid.id).await.is_err());

        let bidder_feed = service.notifications_for(&buyer(1).id).await;
        assert!(bidder_feed.iter().any(|n| n.kind() == "listing_expired"));
        let seller_feed = service.notifications_for(&seller().id).await;
        assert!(seller_feed.iter().any(|n| n.kind() == "listing_expired"));
    }

    #[tokio::test]
    async fn sweep_emits_expiry_events() {
        let service = make_service(StubMode::Success);
        let mut rx = service.event_bus().subscribe();
        let _ = seed_listing(&service, "2024-05-01", MealType::Snacks).await;

        let deleted = service.sweep(at("2024-05-01", 20)).await;
        assert_eq!(deleted, 1);

        // Notifications for seller precede the expiry event; drain until
        // the listing_expired event arrives.
        let mut saw_expired = false;
        while let Ok(event) = rx.try_recv() {
            if event.event_type_str() == "listing_expired" {
                saw_expired = true;
            }
        }
        assert!(saw_expired);
    }
}
