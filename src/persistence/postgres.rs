//! PostgreSQL implementation of the persistence mirror.
//!
//! The in-memory books stay authoritative; this layer mirrors the
//! write-once settlement artifacts (transactions, purchases,
//! notifications) and appends domain events to an event log. Every
//! caller treats a failed mirror write as non-fatal.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::config::MarketConfig;
use crate::domain::{Notification, PurchaseRecord, TransactionRecord};
use crate::error::MarketError;

/// PostgreSQL-backed persistence mirror using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a lazily-connecting pool from configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] if the connection
    /// string cannot be parsed.
    pub fn connect(config: &MarketConfig) -> Result<Self, MarketError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect_lazy(&config.database_url)
            .map_err(|e| MarketError::PersistenceError(e.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Mirrors a transaction record.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] on database failure.
    pub async fn insert_transaction(&self, record: &TransactionRecord) -> Result<(), MarketError> {
        sqlx::query(
            "INSERT INTO transactions \
             (id, listing_id, meal_date, meal_type, mess, sold_price, listing_price, \
              buyer_id, buyer_name, seller_id, seller_name, listed_at, settled_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(record.id.as_uuid())
        .bind(record.listing_id.as_uuid())
        .bind(record.meal_date)
        .bind(record.meal_type.as_str())
        .bind(&record.mess)
        .bind(i64::from(record.sold_price))
        .bind(i64::from(record.listing_price))
        .bind(record.buyer.id.as_str())
        .bind(&record.buyer.name)
        .bind(record.seller.id.as_str())
        .bind(&record.seller.name)
        .bind(record.listed_at)
        .bind(record.settled_at)
        .execute(&self.pool)
        .await
        .map_err(|e| MarketError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Mirrors a purchase record.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] on database failure.
    pub async fn insert_purchase(&self, record: &PurchaseRecord) -> Result<(), MarketError> {
        sqlx::query(
            "INSERT INTO purchases \
             (id, transaction_id, redemption_token, meal_date, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id.as_uuid())
        .bind(record.transaction_id.as_uuid())
        .bind(record.redemption_token.as_deref())
        .bind(record.meal_date)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| MarketError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Mirrors a notification-feed entry.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] on database failure
    /// or if the payload cannot be serialized.
    pub async fn insert_notification(&self, notification: &Notification) -> Result<(), MarketError> {
        let payload = serde_json::to_value(&notification.payload)
            .map_err(|e| MarketError::PersistenceError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO notifications (id, user_id, title, message, payload, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(notification.id)
        .bind(notification.user_id.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(payload)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| MarketError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Appends an event to the event log.
    ///
    /// # Errors
    ///
    /// Returns a [`MarketError::PersistenceError`] on database failure.
    pub async fn save_event(
        &self,
        listing_id: Option<Uuid>,
        event_type: &str,
        payload: &serde_json::Value,
    ) -> Result<i64, MarketError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO events (listing_id, event_type, payload) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(listing_id)
        .bind(event_type)
        .bind(payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| MarketError::PersistenceError(e.to_string()))?;

        Ok(row)
    }
}
