//! Match lifecycle derived from the schedule and the current time.

use chrono::{DateTime, Duration, Utc};
use trufan_api::Match;

/// How long before the start a prediction locks.
pub const LOCK_LEAD_HOURS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    NotStarted,
    Quarter,
    Half,
    ThreeQuarter,
    EndPhase,
    Completed,
}

impl MatchStatus {
    pub fn label(self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "Not started",
            MatchStatus::Quarter => "Started",
            MatchStatus::Half => "25%+ done",
            MatchStatus::ThreeQuarter => "50%+ done",
            MatchStatus::EndPhase => "75%+ done",
            MatchStatus::Completed => "Completed",
        }
    }

    /// Opening clause of the unlock cost explanation.
    pub fn progress_note(self) -> &'static str {
        match self {
            MatchStatus::NotStarted => "Since the match is about to start in less than an hour,",
            MatchStatus::Quarter => "Since the match has already started,",
            MatchStatus::Half => "Since the match is more than 25% done,",
            MatchStatus::ThreeQuarter => "Since the match is more than 50% done,",
            MatchStatus::EndPhase => "Since the match is more than 75% done,",
            MatchStatus::Completed => "Since the match is over,",
        }
    }

    fn from_percent(percent: u8) -> Self {
        match percent {
            0..25 => MatchStatus::Quarter,
            25..50 => MatchStatus::Half,
            50..75 => MatchStatus::ThreeQuarter,
            75..100 => MatchStatus::EndPhase,
            _ => MatchStatus::Completed,
        }
    }
}

pub fn lock_lead() -> Duration {
    Duration::hours(LOCK_LEAD_HOURS)
}

/// Percent complete and status for a match. `end` of `None` means
/// `start + 3h`.
pub fn compute_status(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    completed: bool,
    now: DateTime<Utc>,
) -> (u8, MatchStatus) {
    let end = end.unwrap_or_else(|| start + Duration::hours(trufan_api::DEFAULT_MATCH_HOURS));

    if completed || now > end {
        return (100, MatchStatus::Completed);
    }
    if now < start {
        return (0, MatchStatus::NotStarted);
    }

    let total = (end - start).num_minutes();
    if total <= 0 {
        return (100, MatchStatus::Completed);
    }
    let elapsed = (now - start).num_minutes().clamp(0, total);
    // round(100 * elapsed / total), halves rounded up
    let percent = ((200 * elapsed + total) / (2 * total)).clamp(0, 100) as u8;
    (percent, MatchStatus::from_percent(percent))
}

pub fn status_of(game: &Match, now: DateTime<Utc>) -> (u8, MatchStatus) {
    compute_status(game.start, game.end, game.completed, now)
}

pub fn lock_threshold(start: DateTime<Utc>) -> DateTime<Utc> {
    start - lock_lead()
}

/// Locked from `start - 1h` onwards. Independent of [`MatchStatus`], which
/// still reports `NotStarted` for the last hour before the start.
pub fn is_locked(start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= lock_threshold(start)
}

/// True while `now` needs re-sampling for this match, `[start - 1h, end]`.
pub fn in_refresh_window(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let end = end.unwrap_or_else(|| start + Duration::hours(trufan_api::DEFAULT_MATCH_HOURS));
    now >= lock_threshold(start) && now <= end
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 9, 19, 14, 0, 0).unwrap()
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        start() + Duration::minutes(minutes)
    }

    #[test]
    fn before_start_is_not_started() {
        assert_eq!(compute_status(start(), None, false, at(-5)), (0, MatchStatus::NotStarted));
    }

    #[test]
    fn completed_flag_wins_over_clock() {
        assert_eq!(compute_status(start(), None, true, at(-600)), (100, MatchStatus::Completed));
    }

    #[test]
    fn past_end_is_completed() {
        let end = Some(at(120));
        assert_eq!(compute_status(start(), end, false, at(121)), (100, MatchStatus::Completed));
    }

    #[test]
    fn progress_buckets_over_default_three_hours() {
        // 180 minutes total
        assert_eq!(compute_status(start(), None, false, at(0)), (0, MatchStatus::Quarter));
        assert_eq!(compute_status(start(), None, false, at(44)), (24, MatchStatus::Quarter));
        assert_eq!(compute_status(start(), None, false, at(45)), (25, MatchStatus::Half));
        assert_eq!(compute_status(start(), None, false, at(90)), (50, MatchStatus::ThreeQuarter));
        assert_eq!(compute_status(start(), None, false, at(135)), (75, MatchStatus::EndPhase));
        assert_eq!(compute_status(start(), None, false, at(180)), (100, MatchStatus::Completed));
    }

    #[test]
    fn percent_rounds_to_nearest() {
        // 1/180 of the way through is 0.55%, rounds to 1
        let end = Some(at(180));
        assert_eq!(compute_status(start(), end, false, at(1)).0, 1);
        // 89/180 = 49.4%
        assert_eq!(compute_status(start(), end, false, at(89)), (49, MatchStatus::Half));
    }

    #[test]
    fn zero_length_match_is_completed_once_started() {
        let end = Some(start());
        assert_eq!(compute_status(start(), end, false, start()), (100, MatchStatus::Completed));
    }

    #[test]
    fn lock_boundary_is_one_hour_before_start() {
        let threshold = start() - Duration::hours(1);
        let just_before = threshold - Duration::milliseconds(1);
        let just_after = threshold + Duration::milliseconds(1);

        assert!(!is_locked(start(), just_before));
        assert_eq!(compute_status(start(), None, false, just_before).1, MatchStatus::NotStarted);

        assert!(is_locked(start(), threshold));
        assert!(is_locked(start(), just_after));
        // locked, yet the status has not moved
        assert_eq!(compute_status(start(), None, false, just_after).1, MatchStatus::NotStarted);
    }

    #[test]
    fn refresh_window_spans_lock_to_end() {
        assert!(!in_refresh_window(start(), None, at(-61)));
        assert!(in_refresh_window(start(), None, at(-60)));
        assert!(in_refresh_window(start(), None, at(179)));
        assert!(!in_refresh_window(start(), None, at(181)));
    }

    #[test]
    fn status_of_reads_match_fields() {
        let game = Match { start: start(), completed: true, ..Default::default() };
        assert_eq!(status_of(&game, at(-300)).1, MatchStatus::Completed);
    }
}
