//! Date-range selection for filtering event views.
//!
//! [`DateRangeSelector`] models the picker control: a popover that is opened,
//! edited through presets or free-form `YYYY-MM-DD` text, and then applied or
//! cancelled. It is pure in-memory state; "today" is supplied by the caller.
//!
//! ```
//! use chrono::NaiveDate;
//! use shoplog_core::{DateRangePreset, DateRangeSelector};
//!
//! let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let mut selector = DateRangeSelector::new(today);
//!
//! selector.open();
//! selector.select_preset(DateRangePreset::Last7Days).unwrap();
//! let range = selector.apply().unwrap();
//!
//! assert_eq!(range.start().to_string(), "2024-03-08");
//! assert_eq!(range.end().to_string(), "2024-03-14");
//! ```

mod format;
mod preset;
mod selector;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use format::{format_ymd, is_valid_ymd, parse_ymd};
pub use preset::{DateRangePreset, RangeLabel};
pub use selector::{DateRangeSelector, SelectorError, SelectorState};

/// An inclusive range of calendar days with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, returning `None` when `end` precedes `start`.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// A range covering exactly one day.
    #[must_use]
    pub const fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Create a range, moving `end` up to `start` if they are out of order.
    #[must_use]
    pub fn clamped(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range (inclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `day` falls inside the range.
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted() {
        assert!(DateRange::new(day(2024, 3, 10), day(2024, 3, 1)).is_none());
        assert!(DateRange::new(day(2024, 3, 1), day(2024, 3, 1)).is_some());
    }

    #[test]
    fn test_clamped_snaps_end() {
        let range = DateRange::clamped(day(2024, 3, 10), day(2024, 3, 1));
        assert_eq!(range, DateRange::single(day(2024, 3, 10)));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = DateRange::new(day(2024, 3, 1), day(2024, 3, 10)).unwrap();
        assert!(range.contains(day(2024, 3, 1)));
        assert!(range.contains(day(2024, 3, 10)));
        assert!(!range.contains(day(2024, 3, 11)));
    }
}
