//! Named date-range presets.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::DateRange;

/// Quick-pick ranges offered next to the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRangePreset {
    /// The current day.
    Today,
    /// The previous day.
    Yesterday,
    /// The seven days before today, not including today.
    #[serde(rename = "last7days")]
    Last7Days,
}

impl DateRangePreset {
    /// All presets in display order.
    pub const ALL: [Self; 3] = [Self::Today, Self::Yesterday, Self::Last7Days];

    /// Stable identifier used in URLs and option lists.
    #[must_use]
    pub const fn alias(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "last7days",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::Last7Days => "Last 7 days",
        }
    }

    /// Look up a preset by alias or title.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.alias() == name || p.title() == name)
    }

    /// The concrete days this preset covers relative to `today`.
    #[must_use]
    pub fn range(self, today: NaiveDate) -> DateRange {
        let days_ago = |n: u64| today.checked_sub_days(Days::new(n)).unwrap_or(today);
        match self {
            Self::Today => DateRange::single(today),
            Self::Yesterday => DateRange::single(days_ago(1)),
            Self::Last7Days => DateRange::clamped(days_ago(7), days_ago(1)),
        }
    }

    /// The preset whose period is exactly `range`, if any.
    #[must_use]
    pub fn matching(range: DateRange, today: NaiveDate) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.range(today) == range)
    }
}

/// What the picker's activator button shows for the active range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeLabel {
    /// The range equals a named preset.
    Preset(DateRangePreset),
    /// Any other range.
    Custom,
}

impl RangeLabel {
    /// Classify `range` against the presets for `today`.
    #[must_use]
    pub fn for_range(range: DateRange, today: NaiveDate) -> Self {
        DateRangePreset::matching(range, today).map_or(Self::Custom, Self::Preset)
    }

    /// Alias used to mark the selected option.
    #[must_use]
    pub const fn alias(self) -> &'static str {
        match self {
            Self::Preset(preset) => preset.alias(),
            Self::Custom => "custom",
        }
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
    fn test_preset_ranges() {
        let today = day(2024, 3, 1);
        assert_eq!(
            DateRangePreset::Today.range(today),
            DateRange::single(today)
        );
        assert_eq!(
            DateRangePreset::Yesterday.range(today),
            DateRange::single(day(2024, 2, 29))
        );
        let last7 = DateRangePreset::Last7Days.range(today);
        assert_eq!(last7.start(), day(2024, 2, 23));
        assert_eq!(last7.end(), day(2024, 2, 29));
    }

    #[test]
    fn test_from_name_accepts_alias_and_title() {
        assert_eq!(
            DateRangePreset::from_name("last7days"),
            Some(DateRangePreset::Last7Days)
        );
        assert_eq!(
            DateRangePreset::from_name("Yesterday"),
            Some(DateRangePreset::Yesterday)
        );
        assert_eq!(DateRangePreset::from_name("last30days"), None);
    }

    #[test]
    fn test_label_for_range() {
        let today = day(2024, 3, 15);
        assert_eq!(
            RangeLabel::for_range(DateRange::single(day(2024, 3, 14)), today),
            RangeLabel::Preset(DateRangePreset::Yesterday)
        );
        assert_eq!(
            RangeLabel::for_range(DateRange::single(day(2024, 3, 1)), today),
            RangeLabel::Custom
        );
    }

    #[test]
    fn test_serde_alias() {
        let json = serde_json::to_string(&DateRangePreset::Last7Days).unwrap();
        assert_eq!(json, "\"last7days\"");
    }
}
