//! Write-once settlement artifacts and per-user notification feeds.
//!
//! [`SettlementLedger`] holds the records the settlement state machine
//! produces exactly once per sale: the immutable [`TransactionRecord`],
//! the buyer-facing [`PurchaseRecord`], and the durable notification
//! feed. Nothing here is ever mutated after insertion; "active" status
//! of a purchase is computed dynamically against the market date at
//! query time, never stored.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::notification::Notification;
use super::{ListingId, MealType, PurchaseId, TransactionId, UserId, UserProfile};

/// Immutable historical record of a completed sale.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionRecord {
    /// Unique transaction identifier.
    pub id: TransactionId,
    /// The listing that was settled (retired at settlement).
    pub listing_id: ListingId,
    /// Calendar date of the sold meal.
    pub meal_date: NaiveDate,
    /// Meal slot of the sold meal.
    pub meal_type: MealType,
    /// Mess/venue name.
    pub mess: String,
    /// Price the accepted bid actually paid.
    pub sold_price: u32,
    /// The listing's original minimum price.
    pub listing_price: u32,
    /// Buyer identity at settlement time.
    pub buyer: UserProfile,
    /// Seller identity at settlement time.
    pub seller: UserProfile,
    /// When the listing was originally created.
    pub listed_at: DateTime<Utc>,
    /// When settlement completed.
    pub settled_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Time from listing creation to settlement. Reporting only.
    #[must_use]
    pub fn time_to_sale(&self) -> chrono::Duration {
        self.settled_at - self.listed_at
    }
}

/// Buyer-facing record of a redeemable meal, created at settlement.
///
/// Separate from [`TransactionRecord`] so "currently redeemable" meals
/// can be distinguished from historical ones. Never deleted; it ages
/// out of the active view once its meal date passes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseRecord {
    /// Unique purchase identifier.
    pub id: PurchaseId,
    /// The transaction this purchase belongs to.
    pub transaction_id: TransactionId,
    /// Redemption token transferred from the seller's registration
    /// credential. `None` when the token fetch failed at settlement
    /// time (degraded-but-recorded sale).
    pub redemption_token: Option<String>,
    /// Meal date; the purchase is active while this is >= today.
    pub meal_date: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Projection of a purchase joined with its transaction, for the
/// buyer's active-meals view.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PurchaseView {
    /// Purchase identifier.
    pub purchase_id: PurchaseId,
    /// Transaction identifier.
    pub transaction_id: TransactionId,
    /// Meal date.
    pub meal_date: NaiveDate,
    /// Meal slot.
    pub meal_type: MealType,
    /// Mess/venue name.
    pub mess: String,
    /// Price paid.
    pub sold_price: u32,
    /// Seller display name (for pickup coordination).
    pub seller_name: String,
    /// Redemption token, if one was captured at settlement.
    pub redemption_token: Option<String>,
    /// When the purchase was created.
    pub purchased_at: DateTime<Utc>,
}

/// In-memory store of write-once settlement artifacts.
#[derive(Debug, Default)]
pub struct SettlementLedger {
    transactions: RwLock<Vec<TransactionRecord>>,
    purchases: RwLock<Vec<PurchaseRecord>>,
    notifications: RwLock<HashMap<UserId, Vec<Notification>>>,
}

impl SettlementLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction record.
    pub async fn record_transaction(&self, record: TransactionRecord) {
        self.transactions.write().await.push(record);
    }

    /// Appends a purchase record.
    pub async fn record_purchase(&self, record: PurchaseRecord) {
        self.purchases.write().await.push(record);
    }

    /// Appends a notification to the recipient's feed.
    pub async fn record_notification(&self, notification: Notification) {
        let mut feeds = self.notifications.write().await;
        feeds
            .entry(notification.user_id.clone())
            .or_default()
            .push(notification);
    }

    /// The buyer's active purchases: meal date >= `today`, newest first.
    ///
    /// The filter runs at query time because "active" changes purely as
    /// a function of the calendar date.
    pub async fn active_purchases(&self, buyer: &UserId, today: NaiveDate) -> Vec<PurchaseView> {
        let transactions = self.transactions.read().await;
        let purchases = self.purchases.read().await;
        let mut views: Vec<PurchaseView> = purchases
            .iter()
            .filter(|p| p.meal_date >= today)
            .filter_map(|p| {
                transactions
                    .iter()
                    .find(|t| t.id == p.transaction_id && t.buyer.id == *buyer)
                    .map(|t| PurchaseView {
                        purchase_id: p.id,
                        transaction_id: t.id,
                        meal_date: p.meal_date,
                        meal_type: t.meal_type,
                        mess: t.mess.clone(),
                        sold_price: t.sold_price,
                        seller_name: t.seller.name.clone(),
                        redemption_token: p.redemption_token.clone(),
                        purchased_at: p.created_at,
                    })
            })
            .collect();
        views.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        views
    }

    /// Transaction history where the user was buyer or seller, newest
    /// first.
    pub async fn transactions_for(&self, user: &UserId) -> Vec<TransactionRecord> {
        let transactions = self.transactions.read().await;
        let mut records: Vec<TransactionRecord> = transactions
            .iter()
            .filter(|t| t.buyer.id == *user || t.seller.id == *user)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.settled_at.cmp(&a.settled_at));
        records
    }

    /// The user's notification feed, newest first.
    pub async fn notifications_for(&self, user: &UserId) -> Vec<Notification> {
        let feeds = self.notifications.read().await;
        let mut feed = feeds.get(user).cloned().unwrap_or_default();
        feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        feed
    }

    /// Total number of recorded transactions.
    pub async fn transaction_count(&self) -> usize {
        self.transactions.read().await.len()
    }
}
