//! Shared primitive types, defaults, and date helpers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Generated sale identifier.
pub type SaleId = uuid::Uuid;
/// Units of stock or units sold.
pub type Quantity = u32;

/// Calendar format of every stored sale date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Client recorded on a sale when the caller does not name one.
pub const DEFAULT_CLIENT: &str = "Sin nombre";

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Current date in the local time zone.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Inclusive calendar range used to filter statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First included day.
    pub start: NaiveDate,
    /// Last included day.
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range from two days. A reversed range contains nothing.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Returns true when `date` falls within the range, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// A range no date falls in.
    pub fn unmatched() -> Self {
        Self::new(NaiveDate::MAX, NaiveDate::MIN)
    }

    /// Parses optional `start`/`end` query bounds.
    ///
    /// Filtering applies only when both bounds are present; an empty value
    /// counts as absent, and a single bound yields `None`. When both are
    /// present but either fails to parse, the range matches nothing.
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        let (Some(start), Some(end)) = (
            start.filter(|s| !s.is_empty()),
            end.filter(|s| !s.is_empty()),
        ) else {
            return None;
        };

        match (parse_date(start), parse_date(end)) {
            (Some(start), Some(end)) => Some(Self::new(start, end)),
            _ => {
                tracing::debug!(start, end, "unparsable date bound, range matches nothing");
                Some(Self::unmatched())
            }
        }
    }
}
