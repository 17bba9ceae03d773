//! DTOs for the caller-scoped account views: purchases, transaction
//! history, and the notification feed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{MealType, Notification, PurchaseView, TransactionId, TransactionRecord};

/// Response body for `GET /purchases`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseListResponse {
    /// Active purchases (meal date >= today), newest first.
    pub data: Vec<PurchaseView>,
}

/// One historical transaction, as seen by a participant.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionDto {
    /// Transaction identifier.
    pub transaction_id: TransactionId,
    /// Meal date of the sold slot.
    pub meal_date: NaiveDate,
    /// Meal slot.
    pub meal_type: MealType,
    /// Mess/venue name.
    pub mess: String,
    /// Final sale price.
    pub sold_price: u32,
    /// The listing's original minimum price.
    pub listing_price: u32,
    /// Buyer display name.
    pub buyer_name: String,
    /// Seller display name.
    pub seller_name: String,
    /// When settlement completed.
    pub settled_at: DateTime<Utc>,
    /// Seconds from listing creation to settlement. Reporting only.
    pub time_to_sale_secs: i64,
}

impl From<&TransactionRecord> for TransactionDto {
    fn from(record: &TransactionRecord) -> Self {
        Self {
            transaction_id: record.id,
            meal_date: record.meal_date,
            meal_type: record.meal_type,
            mess: record.mess.clone(),
            sold_price: record.sold_price,
            listing_price: record.listing_price,
            buyer_name: record.buyer.name.clone(),
            seller_name: record.seller.name.clone(),
            settled_at: record.settled_at,
            time_to_sale_secs: record.time_to_sale().num_seconds(),
        }
    }
}

/// Response body for `GET /transactions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionListResponse {
    /// Transactions involving the caller, newest first.
    pub data: Vec<TransactionDto>,
}

/// Response body for `GET /notifications`.
#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationListResponse {
    /// The caller's feed, newest first.
    pub data: Vec<Notification>,
}
