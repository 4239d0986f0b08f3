//! The date-range picker state machine.
//!
//! ```text
//! Idle ──open──► Open ──apply──► Applied
//!                  │
//!                  └──cancel──► Cancelled
//! ```
//!
//! `Applied` and `Cancelled` are closed states; `open` may be called again
//! from either. Edits only happen while `Open` and only touch the pending
//! range; the committed range changes on `apply`.

use chrono::{Datelike, NaiveDate};

use super::{DateRange, DateRangePreset, RangeLabel, format_ymd, parse_ymd};

/// Lifecycle of the picker popover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// Popover closed, nothing has happened yet.
    Idle,
    /// Popover open, pending edits in progress.
    Open,
    /// Pending range was committed; the host should re-fetch.
    Applied,
    /// Pending edits were discarded.
    Cancelled,
}

/// Errors from operating the selector in the wrong state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The popover must be open to edit or apply.
    #[error("date range selector is not open")]
    NotOpen,
}

/// Stateful date-range picker.
///
/// Keeps the committed range, the pending range being edited, and the raw
/// text of the two date inputs. Invalid text is held verbatim until the
/// inputs lose focus, at which point it reverts to the pending range.
#[derive(Debug, Clone)]
pub struct DateRangeSelector {
    today: NaiveDate,
    state: SelectorState,
    committed: DateRange,
    pending: DateRange,
    start_text: String,
    end_text: String,
    visible_month: (i32, u32),
}

impl DateRangeSelector {
    /// Create a selector whose committed range is the "Today" preset.
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self::with_committed(today, DateRangePreset::Today.range(today))
    }

    /// Create a selector seeded with a previously applied range.
    #[must_use]
    pub fn with_committed(today: NaiveDate, committed: DateRange) -> Self {
        Self {
            today,
            state: SelectorState::Idle,
            committed,
            pending: committed,
            start_text: format_ymd(committed.start()),
            end_text: format_ymd(committed.end()),
            visible_month: month_of(committed.start()),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SelectorState {
        self.state
    }

    /// Whether the popover is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == SelectorState::Open
    }

    /// The last applied range.
    #[must_use]
    pub const fn committed(&self) -> DateRange {
        self.committed
    }

    /// The range being edited.
    #[must_use]
    pub const fn pending(&self) -> DateRange {
        self.pending
    }

    /// Raw text of the start input.
    #[must_use]
    pub fn start_text(&self) -> &str {
        &self.start_text
    }

    /// Raw text of the end input.
    #[must_use]
    pub fn end_text(&self) -> &str {
        &self.end_text
    }

    /// `(year, month)` of the first calendar month shown.
    #[must_use]
    pub const fn visible_month(&self) -> (i32, u32) {
        self.visible_month
    }

    /// Preset or custom classification of the pending range.
    #[must_use]
    pub fn label(&self) -> RangeLabel {
        RangeLabel::for_range(self.pending, self.today)
    }

    /// Text for the activator button: the preset title, or both days spelled out.
    #[must_use]
    pub fn button_text(&self) -> String {
        match RangeLabel::for_range(self.committed, self.today) {
            RangeLabel::Preset(preset) => preset.title().to_string(),
            RangeLabel::Custom => format!(
                "{} - {}",
                self.committed.start().format("%a %b %d %Y"),
                self.committed.end().format("%a %b %d %Y")
            ),
        }
    }

    /// Open the popover, starting the pending range from the committed one.
    ///
    /// Opening an already-open selector keeps its pending edits.
    pub fn open(&mut self) {
        if self.is_open() {
            return;
        }
        self.state = SelectorState::Open;
        self.set_pending(self.committed);
    }

    /// Open if closed, cancel if open.
    pub fn toggle(&mut self) {
        if self.is_open() {
            self.cancel();
        } else {
            self.open();
        }
    }

    /// Replace the pending range with a preset's period.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::NotOpen`] unless the popover is open.
    pub fn select_preset(&mut self, preset: DateRangePreset) -> Result<(), SelectorError> {
        self.require_open()?;
        self.set_pending(preset.range(self.today));
        Ok(())
    }

    /// Replace the pending range with a span picked on the calendar.
    ///
    /// The two days may be given in either order.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::NotOpen`] unless the popover is open.
    pub fn select_range(&mut self, a: NaiveDate, b: NaiveDate) -> Result<(), SelectorError> {
        self.require_open()?;
        self.set_pending(DateRange::clamped(a.min(b), a.max(b)));
        Ok(())
    }

    /// Type into the start input.
    ///
    /// A valid date moves the pending start; if it lands after the pending end,
    /// the end is snapped to it. Invalid text is kept as typed and the pending
    /// range is left alone. Returns whether the text was accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::NotOpen`] unless the popover is open.
    pub fn edit_start(&mut self, text: &str) -> Result<bool, SelectorError> {
        self.require_open()?;
        self.start_text = text.to_string();
        let Some(start) = parse_ymd(text) else {
            return Ok(false);
        };
        self.set_pending(DateRange::clamped(start, self.pending.end()));
        Ok(true)
    }

    /// Type into the end input.
    ///
    /// A valid date moves the pending end. The start bound wins ordering
    /// conflicts: an end before the pending start is snapped up to the start.
    /// Invalid text is kept as typed. Returns whether the text was accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::NotOpen`] unless the popover is open.
    pub fn edit_end(&mut self, text: &str) -> Result<bool, SelectorError> {
        self.require_open()?;
        self.end_text = text.to_string();
        let Some(end) = parse_ymd(text) else {
            return Ok(false);
        };
        self.set_pending(DateRange::clamped(self.pending.start(), end));
        Ok(true)
    }

    /// Inputs lost focus: any invalid text reverts to the pending range.
    pub fn blur(&mut self) {
        if parse_ymd(&self.start_text).is_none() {
            self.start_text = format_ymd(self.pending.start());
        }
        if parse_ymd(&self.end_text).is_none() {
            self.end_text = format_ymd(self.pending.end());
        }
    }

    /// Navigate the calendar to another month.
    pub fn show_month(&mut self, year: i32, month: u32) {
        if (1..=12).contains(&month) {
            self.visible_month = (year, month);
        }
    }

    /// Commit the pending range and close.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::NotOpen`] unless the popover is open.
    pub fn apply(&mut self) -> Result<DateRange, SelectorError> {
        self.require_open()?;
        self.committed = self.pending;
        self.state = SelectorState::Applied;
        Ok(self.committed)
    }

    /// Discard pending edits and close.
    pub fn cancel(&mut self) {
        self.set_pending(self.committed);
        self.state = SelectorState::Cancelled;
    }

    const fn require_open(&self) -> Result<(), SelectorError> {
        match self.state {
            SelectorState::Open => Ok(()),
            _ => Err(SelectorError::NotOpen),
        }
    }

    /// Set the pending range, resync both inputs, and keep the end month in view.
    fn set_pending(&mut self, range: DateRange) {
        self.pending = range;
        self.start_text = format_ymd(range.start());
        self.end_text = format_ymd(range.end());

        // Two months are shown side by side; jump only when the end falls outside them.
        let (year, month) = self.visible_month;
        let (end_year, end_month) = month_of(range.end());
        let diff = i64::from(end_month) - i64::from(month) + 12 * i64::from(end_year - year);
        if !(0..=1).contains(&diff) {
            self.visible_month = (end_year, end_month);
        }
    }
}

fn month_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}
