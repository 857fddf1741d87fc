//! Timestamp utilities

use chrono::{DateTime, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Today's date in UTC, used to stamp new uploads
pub fn today() -> NaiveDate {
    now().date_naive()
}
