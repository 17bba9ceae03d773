//! Settlement DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{PurchaseId, TransactionId};
use crate::service::SettlementOutcome;

/// Response body for `POST /listings/{id}/bids/{bid_id}/pay`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettlementResponse {
    /// The recorded transaction.
    pub transaction_id: TransactionId,
    /// The recorded purchase.
    pub purchase_id: PurchaseId,
    /// Final sale price.
    pub sold_price: u32,
    /// Whether the purchase carries a redemption token. `false` marks
    /// a degraded settlement (token fetch failed, sale still recorded).
    pub token_available: bool,
}

impl From<SettlementOutcome> for SettlementResponse {
    fn from(outcome: SettlementOutcome) -> Self {
        Self {
            transaction_id: outcome.transaction_id,
            purchase_id: outcome.purchase_id,
            sold_price: outcome.sold_price,
            token_available: outcome.token_available,
        }
    }
}
