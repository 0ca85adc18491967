//! Half-open time windows and window generators.

use chrono::{DateTime, TimeDelta, Utc};

/// An immutable half-open time interval `[begin, end)` in UTC.
///
/// Windows are the unit of rollup aggregation. They are only ever
/// produced by the generators in this module; a stored rollup row keeps
/// the window begin as its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window, validating that begin < end.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval would be empty or inverted.
    pub fn new(begin: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if begin >= end {
            return Err(WindowError::Empty { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Returns the one-day window containing the given instant.
    #[must_use]
    pub fn day_of(instant: DateTime<Utc>) -> Self {
        let begin = start_of_day(instant);
        Self {
            begin,
            end: begin + TimeDelta::days(1),
        }
    }

    /// Returns the inclusive start of the window.
    #[must_use]
    pub const fn begin(&self) -> DateTime<Utc> {
        self.begin
    }

    /// Returns the exclusive end of the window.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns true if the instant falls inside `[begin, end)`.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.begin && instant < self.end
    }

    /// Returns the window duration.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.begin
    }

    /// Returns an iterator over the one-hour sub-windows of this window.
    ///
    /// The window begin must be hour-aligned for the slices to line up
    /// with wall-clock hours; day windows always are.
    #[must_use]
    pub const fn hours(&self) -> HourSlices {
        HourSlices {
            current: self.begin,
            end: self.end,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// Truncates an instant to the start of its UTC day.
#[must_use]
pub fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time")
        .and_utc()
}

/// Error for invalid window bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// Begin is at or after end.
    #[error("empty window: {begin} >= {end}")]
    Empty {
        /// The inclusive start.
        begin: DateTime<Utc>,
        /// The exclusive end.
        end: DateTime<Utc>,
    },
}

/// Lazy, finite iterator over consecutive one-day windows.
///
/// Yields `[d, d+1)` for each day `d` from `first` while the window end
/// stays at or before `horizon`. The iterator is a plain value; cloning
/// it restarts the sequence.
#[derive(Debug, Clone)]
pub struct DayWindows {
    current: DateTime<Utc>,
    horizon: DateTime<Utc>,
}

impl DayWindows {
    /// Creates a day-window generator.
    ///
    /// `first` is truncated to its day start; `horizon` is truncated to
    /// its day start and acts as the inclusive bound on window ends, so
    /// the day containing `horizon` itself is never yielded.
    #[must_use]
    pub fn until(first: DateTime<Utc>, horizon: DateTime<Utc>) -> Self {
        Self {
            current: start_of_day(first),
            horizon: start_of_day(horizon),
        }
    }
}

impl Iterator for DayWindows {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.current + TimeDelta::days(1);
        if end > self.horizon {
            return None;
        }
        let window = TimeWindow {
            begin: self.current,
            end,
        };
        self.current = end;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let days = (self.horizon - self.current).num_days().max(0) as usize;
        (days, Some(days))
    }
}

impl ExactSizeIterator for DayWindows {}

/// Iterator over the one-hour sub-windows of a window.
#[derive(Debug, Clone)]
pub struct HourSlices {
    current: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Iterator for HourSlices {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.current + TimeDelta::hours(1);
        if end > self.end {
            return None;
        }
        let window = TimeWindow {
            begin: self.current,
            end,
        };
        self.current = end;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let hours = (self.end - self.current).num_hours().max(0) as usize;
        (hours, Some(hours))
    }
}

impl ExactSizeIterator for HourSlices {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_window_half_open() {
        let window = TimeWindow::day_of(day(2024, 3, 5));
        assert!(window.contains(window.begin()));
        assert!(!window.contains(window.end()));
        assert!(window.contains(window.end() - TimeDelta::milliseconds(1)));
    }

    #[test]
    fn test_window_rejects_inverted() {
        assert!(TimeWindow::new(day(2024, 3, 6), day(2024, 3, 5)).is_err());
        assert!(TimeWindow::new(day(2024, 3, 5), day(2024, 3, 5)).is_err());
    }

    #[test]
    fn test_start_of_day() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 14, 37, 45).unwrap();
        assert_eq!(start_of_day(instant), day(2024, 3, 5));
    }

    #[test]
    fn test_day_windows_excludes_horizon_day() {
        let windows: Vec<_> = DayWindows::until(day(2024, 1, 1), day(2024, 1, 4)).collect();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].begin(), day(2024, 1, 1));
        assert_eq!(windows[2].end(), day(2024, 1, 4));
    }

    #[test]
    fn test_day_windows_restartable() {
        let generator = DayWindows::until(day(2024, 1, 1), day(2024, 1, 10));
        let first: Vec<_> = generator.clone().collect();
        let second: Vec<_> = generator.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 9);
    }

    #[test]
    fn test_day_windows_empty_when_horizon_reached() {
        let mut generator = DayWindows::until(day(2024, 1, 5), day(2024, 1, 5));
        assert!(generator.next().is_none());
        assert_eq!(generator.len(), 0);
    }

    #[test]
    fn test_hour_slices() {
        let window = TimeWindow::day_of(day(2024, 1, 1));
        let hours: Vec<_> = window.hours().collect();
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[0].begin(), day(2024, 1, 1));
        assert_eq!(hours[23].end(), day(2024, 1, 2));
        assert!(hours.iter().all(|h| h.duration() == TimeDelta::hours(1)));
    }
}
