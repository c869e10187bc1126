//! Prediction lock and budget engine.
//!
//! Everything in here is synchronous and free of I/O. Callers pass `now`
//! explicitly so the same inputs always give the same answer.

pub mod clock;
pub mod editor;
pub mod ledger;
pub mod wallet;

use trufan_api::{Match, Prediction};

/// A scheduled match paired with the user's pick for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserMatch {
    pub game: Match,
    pub prediction: Prediction,
}

impl UserMatch {
    pub fn new(game: Match, prediction: Prediction) -> Self {
        Self { game, prediction }
    }
}

/// Pair a schedule with a saved prediction list by position. Missing
/// entries become empty predictions.
pub fn pair_up(schedule: &[Match], predictions: &[Prediction]) -> Vec<UserMatch> {
    schedule
        .iter()
        .enumerate()
        .map(|(i, game)| {
            UserMatch::new(game.clone(), predictions.get(i).cloned().unwrap_or_default())
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::UserMatch;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use trufan_api::{Match, Prediction};

    pub fn kickoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 9, 19, 14, 0, 0).unwrap()
    }

    /// `n` matches a day apart starting at [`kickoff`].
    pub fn schedule(n: usize) -> Vec<Match> {
        (0..n)
            .map(|i| Match {
                start: kickoff() + Duration::days(i as i64),
                end: None,
                left: format!("L{i}"),
                right: format!("R{i}"),
                ..Default::default()
            })
            .collect()
    }

    pub fn user_matches(n: usize) -> Vec<UserMatch> {
        schedule(n)
            .into_iter()
            .map(|game| UserMatch::new(game, Prediction::default()))
            .collect()
    }
}
