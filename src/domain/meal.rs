//! Meal slot enumeration and per-meal service windows.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The four mess service slots, plus a conservative fallback.
///
/// `Unknown` is only ever produced by deserializing a meal name this
/// build does not recognize; it is treated as ending at 23:00 so an
/// unrecognized slot is never expired early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    /// Morning service.
    Breakfast,
    /// Midday service.
    Lunch,
    /// Evening snacks service.
    Snacks,
    /// Night service.
    Dinner,
    /// Unrecognized meal name; expires at end of day.
    #[serde(other)]
    Unknown,
}

impl MealType {
    /// The hour of day (0–23, pinned market timezone) at which this
    /// meal's service window closes.
    #[must_use]
    pub const fn service_end_hour(self) -> u32 {
        match self {
            Self::Breakfast => 10,
            Self::Lunch => 15,
            Self::Snacks => 19,
            Self::Dinner => 22,
            Self::Unknown => 23,
        }
    }

    /// Returns the meal type as a static string slice.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Snacks => "snacks",
            Self::Dinner => "dinner",
            Self::Unknown => "unknown",
        }
    }

    /// The four real service slots, in serving order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Breakfast, Self::Lunch, Self::Snacks, Self::Dinner]
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
