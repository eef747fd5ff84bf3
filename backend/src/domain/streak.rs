//! Streak aggregation over a challenge's day records.
//!
//! The aggregation is a single scan over `(day_number, completed)` pairs in
//! ascending day order:
//!
//! - a running `streak` grows on every completed record and resets to zero on
//!   every incomplete one; a missing day number does not reset it;
//! - `longest_streak` is the running maximum of `streak`;
//! - `current_streak` is captured at each run boundary (the final record, or
//!   a record followed by a day-number gap greater than one) when that record
//!   is completed and `streak > 0`; otherwise the last captured value stays.

use serde::{Deserialize, Serialize};

/// Default number of days in a program.
pub const DEFAULT_PROGRAM_LENGTH: u32 = 75;

/// Completion flag of one recorded day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCompletion {
    /// 1-based day of the program.
    pub day_number: u32,
    /// Whether the day was marked complete.
    pub completed: bool,
}

impl DayCompletion {
    pub fn new(day_number: u32, completed: bool) -> Self {
        Self {
            day_number,
            completed,
        }
    }
}

/// Derived progress metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    /// Length of the run closed at the latest record or gap.
    pub current_streak: u32,
    /// Longest run of consecutive completed days.
    pub longest_streak: u32,
    /// Number of completed records.
    pub completed_days: u32,
    /// Percentage of the program completed, in `0.0..=100.0` for sane input.
    pub completion_rate: f64,
    /// Program length, independent of the challenge's current day.
    pub total_days: u32,
}

/// Summarise `days`, which must be sorted by ascending day number.
///
/// # Examples
/// ```
/// use hardinfinity::domain::{DayCompletion, summarise_streaks};
///
/// let days = [
///     DayCompletion::new(1, true),
///     DayCompletion::new(2, true),
///     DayCompletion::new(3, false),
///     DayCompletion::new(4, true),
/// ];
/// let summary = summarise_streaks(&days, 75);
/// assert_eq!(summary.longest_streak, 2);
/// assert_eq!(summary.current_streak, 1);
/// assert_eq!(summary.completed_days, 3);
/// ```
pub fn summarise_streaks(days: &[DayCompletion], program_length: u32) -> StreakSummary {
    let mut streak = 0_u32;
    let mut longest_streak = 0_u32;
    let mut current_streak = 0_u32;
    let mut completed_days = 0_u32;

    let mut iter = days.iter().peekable();
    while let Some(day) = iter.next() {
        if day.completed {
            completed_days = completed_days.saturating_add(1);
            streak = streak.saturating_add(1);
            longest_streak = longest_streak.max(streak);
        } else {
            streak = 0;
        }

        let at_boundary = iter
            .peek()
            .is_none_or(|next| next.day_number > day.day_number.saturating_add(1));
        if at_boundary && day.completed && streak > 0 {
            current_streak = streak;
        }
    }

    StreakSummary {
        current_streak,
        longest_streak,
        completed_days,
        completion_rate: completion_rate(completed_days, program_length),
        total_days: program_length,
    }
}

fn completion_rate(completed_days: u32, program_length: u32) -> f64 {
    if program_length == 0 {
        return 0.0;
    }
    f64::from(completed_days) / f64::from(program_length) * 100.0
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the streak rules.
    use rstest::rstest;

    use super::*;

    fn days(pairs: &[(u32, bool)]) -> Vec<DayCompletion> {
        pairs
            .iter()
            .map(|(day, completed)| DayCompletion::new(*day, *completed))
            .collect()
    }

    #[rstest]
    #[case(&[], 0, 0, 0)]
    #[case(&[(1, true), (2, true), (3, false), (4, true)], 1, 2, 3)]
    #[case(&[(1, true), (2, true)], 2, 2, 2)]
    #[case(&[(1, true), (3, true)], 2, 2, 2)]
    #[case(&[(1, true), (2, true), (3, false)], 0, 2, 2)]
    #[case(&[(1, true), (2, true), (5, false)], 2, 2, 2)]
    #[case(&[(1, false), (2, false)], 0, 0, 0)]
    #[case(&[(1, true), (2, true), (3, true), (4, false), (5, true)], 1, 3, 4)]
    fn aggregates_streaks(
        #[case] input: &[(u32, bool)],
        #[case] current: u32,
        #[case] longest: u32,
        #[case] completed: u32,
    ) {
        let summary = summarise_streaks(&days(input), DEFAULT_PROGRAM_LENGTH);

        assert_eq!(summary.current_streak, current, "current streak");
        assert_eq!(summary.longest_streak, longest, "longest streak");
        assert_eq!(summary.completed_days, completed, "completed days");
    }

    #[rstest]
    fn gap_boundary_captures_the_run_before_the_gap() {
        // Without a gap nothing is captured before the trailing incomplete day.
        let summary = summarise_streaks(
            &days(&[(1, true), (2, true), (3, true), (4, false)]),
            DEFAULT_PROGRAM_LENGTH,
        );
        assert_eq!(summary.current_streak, 0);

        let summary = summarise_streaks(
            &days(&[(1, true), (2, true), (4, false)]),
            DEFAULT_PROGRAM_LENGTH,
        );
        assert_eq!(summary.current_streak, 2);
    }

    #[rstest]
    fn completion_rate_uses_program_length() {
        let summary = summarise_streaks(&days(&[(1, true), (2, true), (3, true)]), 75);

        assert_eq!(summary.total_days, 75);
        assert!((summary.completion_rate - 4.0).abs() < 1e-9);
    }

    #[rstest]
    fn zero_length_program_reports_zero_rate() {
        let summary = summarise_streaks(&days(&[(1, true)]), 0);
        assert!(summary.completion_rate.abs() < f64::EPSILON);
    }
}
