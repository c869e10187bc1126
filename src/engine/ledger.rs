//! Confidence budget: each weight may be used `ceil(N / 5)` times across
//! the `N` matches of a schedule.

use chrono::{DateTime, Utc};

use super::UserMatch;
use super::clock;

pub const CONFIDENCE_WEIGHTS: [u8; 5] = [20, 40, 60, 80, 100];
pub const UNSET_CONFIDENCE: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceScore {
    pub score: u8,
    /// Negative only when an existing assignment already overdraws the weight.
    pub remaining: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfidenceLedger {
    pub scores: [ConfidenceScore; 5],
}

pub fn max_uses_per_weight(match_count: usize) -> i32 {
    match_count.div_ceil(CONFIDENCE_WEIGHTS.len()) as i32
}

pub fn is_valid_weight(weight: u8) -> bool {
    CONFIDENCE_WEIGHTS.contains(&weight)
}

/// Rebuild the ledger from scratch. Unset and unknown confidences are not
/// counted.
pub fn recompute(user_matches: &[UserMatch]) -> ConfidenceLedger {
    let cap = max_uses_per_weight(user_matches.len());
    let scores = CONFIDENCE_WEIGHTS.map(|score| {
        let used = user_matches
            .iter()
            .filter(|um| um.prediction.confidence == score)
            .count() as i32;
        ConfidenceScore { score, remaining: cap - used }
    });
    ConfidenceLedger { scores }
}

/// Give every skipped match the cheapest weight still available, one match
/// at a time from the first index, and return the resulting ledger.
///
/// A match is skipped when it is completed or past its lock threshold, has
/// no team picked and no confidence yet. The team stays empty: a missed
/// match still spends budget.
pub fn auto_assign_skipped(user_matches: &mut [UserMatch], now: DateTime<Utc>) -> ConfidenceLedger {
    let mut ledger = recompute(user_matches);
    for um in user_matches.iter_mut() {
        let locked_out = um.game.completed || clock::is_locked(um.game.start, now);
        let untouched =
            um.prediction.team.is_empty() && um.prediction.confidence == UNSET_CONFIDENCE;
        if !(locked_out && untouched) {
            continue;
        }
        let weight = ledger.minimum_assignable();
        if weight == UNSET_CONFIDENCE {
            break;
        }
        um.prediction.confidence = weight;
        ledger.consume(weight);
    }
    ledger
}

impl ConfidenceLedger {
    pub fn remaining(&self, weight: u8) -> Option<i32> {
        self.scores
            .iter()
            .find(|s| s.score == weight)
            .map(|s| s.remaining)
    }

    pub fn can_assign(&self, weight: u8) -> bool {
        self.remaining(weight).is_some_and(|r| r > 0)
    }

    /// Smallest weight with capacity left, or `0` when all are used up.
    pub fn minimum_assignable(&self) -> u8 {
        self.scores
            .iter()
            .find(|s| s.remaining > 0)
            .map(|s| s.score)
            .unwrap_or(UNSET_CONFIDENCE)
    }

    pub fn consume(&mut self, weight: u8) {
        if let Some(entry) = self.scores.iter_mut().find(|s| s.score == weight) {
            entry.remaining -= 1;
        }
    }

    pub fn total_remaining(&self) -> i32 {
        self.scores.iter().map(|s| s.remaining.max(0)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{kickoff, user_matches};
    use chrono::Duration;

    fn assign(ums: &mut [UserMatch], index: usize, team: &str, confidence: u8) {
        ums[index].prediction.team = team.into();
        ums[index].prediction.confidence = confidence;
    }

    #[test]
    fn cap_rounds_up() {
        assert_eq!(max_uses_per_weight(0), 0);
        assert_eq!(max_uses_per_weight(1), 1);
        assert_eq!(max_uses_per_weight(5), 1);
        assert_eq!(max_uses_per_weight(10), 2);
        assert_eq!(max_uses_per_weight(11), 3);
        assert_eq!(max_uses_per_weight(56), 12);
    }

    #[test]
    fn ten_matches_allow_two_of_each() {
        let mut ums = user_matches(10);
        let ledger = recompute(&ums);
        assert!(ledger.scores.iter().all(|s| s.remaining == 2));
        assert_eq!(ledger.minimum_assignable(), 20);

        assign(&mut ums, 0, "L0", 20);
        assign(&mut ums, 1, "L1", 20);
        let ledger = recompute(&ums);
        assert_eq!(ledger.remaining(20), Some(0));
        assert!(!ledger.can_assign(20));
        assert_eq!(ledger.minimum_assignable(), 40);
    }

    #[test]
    fn scores_stay_in_weight_order() {
        let ledger = recompute(&user_matches(7));
        let weights: Vec<u8> = ledger.scores.iter().map(|s| s.score).collect();
        assert_eq!(weights, CONFIDENCE_WEIGHTS.to_vec());
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut ums = user_matches(6);
        assign(&mut ums, 2, "L2", 60);
        assign(&mut ums, 4, "", 100);
        assert_eq!(recompute(&ums), recompute(&ums));
    }

    #[test]
    fn existing_overdraw_is_reported_not_corrected() {
        let mut ums = user_matches(5);
        assign(&mut ums, 0, "L0", 80);
        assign(&mut ums, 1, "L1", 80);
        let ledger = recompute(&ums);
        assert_eq!(ledger.remaining(80), Some(-1));
        assert!(!ledger.can_assign(80));
        assert_eq!(ums[1].prediction.confidence, 80);
    }

    #[test]
    fn unknown_weights_are_rejected() {
        let ledger = recompute(&user_matches(5));
        assert!(!ledger.can_assign(0));
        assert!(!ledger.can_assign(30));
        assert_eq!(ledger.remaining(30), None);
        assert!(!is_valid_weight(0));
        assert!(is_valid_weight(100));
    }

    #[test]
    fn exhausted_ledger_has_no_minimum() {
        let mut ums = user_matches(5);
        for (i, w) in CONFIDENCE_WEIGHTS.iter().enumerate() {
            assign(&mut ums, i, "x", *w);
        }
        assert_eq!(recompute(&ums).minimum_assignable(), UNSET_CONFIDENCE);
    }

    #[test]
    fn skipped_matches_consume_budget_left_to_right() {
        // five matches, one use per weight; the first three are in the past
        let mut ums = user_matches(5);
        assign(&mut ums, 1, "L1", 20);
        let now = kickoff() + Duration::days(2) + Duration::hours(2);

        let ledger = auto_assign_skipped(&mut ums, now);

        assert_eq!(ums[0].prediction.confidence, 40);
        assert_eq!(ums[0].prediction.team, "");
        assert_eq!(ums[1].prediction.confidence, 20);
        assert_eq!(ums[2].prediction.confidence, 60);
        assert_eq!(ums[3].prediction.confidence, UNSET_CONFIDENCE);
        assert_eq!(ums[4].prediction.confidence, UNSET_CONFIDENCE);
        assert_eq!(ledger, recompute(&ums));
        assert_eq!(ledger.minimum_assignable(), 80);
    }

    #[test]
    fn match_inside_lock_hour_counts_as_skipped() {
        let mut ums = user_matches(1);
        let now = kickoff() - Duration::minutes(30);
        auto_assign_skipped(&mut ums, now);
        assert_eq!(ums[0].prediction.confidence, 20);
    }

    #[test]
    fn completed_flag_counts_as_skipped_even_in_future() {
        let mut ums = user_matches(2);
        ums[1].game.completed = true;
        auto_assign_skipped(&mut ums, kickoff() - Duration::days(1));
        assert_eq!(ums[0].prediction.confidence, UNSET_CONFIDENCE);
        assert_eq!(ums[1].prediction.confidence, 20);
    }

    #[test]
    fn auto_assignment_is_stable_across_reloads() {
        let mut ums = user_matches(10);
        let now = kickoff() + Duration::days(4);
        let first = auto_assign_skipped(&mut ums, now);
        let snapshot = ums.clone();
        let second = auto_assign_skipped(&mut ums, now);
        assert_eq!(first, second);
        assert_eq!(ums, snapshot);
    }

    #[test]
    fn auto_assignment_may_use_last_slot_and_then_stops() {
        // six matches all in the past: cap is 2, so weights fill 20,20,40,40,60,60
        let mut ums = user_matches(6);
        let now = kickoff() + Duration::days(10);
        let ledger = auto_assign_skipped(&mut ums, now);
        let got: Vec<u8> = ums.iter().map(|u| u.prediction.confidence).collect();
        assert_eq!(got, vec![20, 20, 40, 40, 60, 60]);
        assert_eq!(ledger.remaining(20), Some(0));
        assert_eq!(ledger.total_remaining(), 4);
    }
}
