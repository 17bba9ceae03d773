//! Expiry policy for perishable meal slots.
//!
//! A listing sells a single meal slot that stops being redeemable at a
//! fixed wall-clock cutoff. Every expiry decision — the request-path
//! checks and the sweep — goes through [`is_expired`] with a timestamp
//! taken from one pinned-offset [`MarketClock`], so two hosts can never
//! disagree about whether a slot is over.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};

use super::MealType;

/// Pure expiry predicate.
///
/// A listing is expired when its meal date is strictly before `now`'s
/// date, or when the date matches and the hour of day has reached the
/// meal's service-end hour. Monotonic in `now`: once expired, a slot
/// stays expired at every later instant.
#[must_use]
pub fn is_expired(meal_date: NaiveDate, meal: MealType, now: DateTime<FixedOffset>) -> bool {
    let today = now.date_naive();
    meal_date < today || (meal_date == today && now.hour() >= meal.service_end_hour())
}

/// Clock pinned to the single canonical market timezone.
///
/// Wraps a fixed UTC offset from configuration. All callers that need
/// "now" or "today" for an expiry or active-purchase decision take it
/// from here rather than from the ambient host locale.
#[derive(Debug, Clone, Copy)]
pub struct MarketClock {
    offset: FixedOffset,
}

impl MarketClock {
    /// Creates a clock for the given UTC offset in minutes (e.g. 330
    /// for IST).
    ///
    /// # Errors
    ///
    /// Returns an error string if the offset is out of range (must be
    /// within ±24 hours).
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, String> {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60))
            .ok_or_else(|| format!("invalid UTC offset: {minutes} minutes"))?;
        Ok(Self { offset })
    }

    /// The current instant in the pinned market timezone.
    #[must_use]
    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// The current calendar date in the pinned market timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// The pinned offset.
    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }
}
