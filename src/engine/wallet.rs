//! Power-play points and free hits, the two currencies that unlock a
//! locked prediction.

use chrono::{DateTime, Utc};
use trufan_api::{FreeHit, ScoreDelta, ScoreRecord};

use super::clock::MatchStatus;

/// Points needed to unlock a match in the given state. `None` means the
/// match cannot be bought back with points.
pub fn unlock_cost(status: MatchStatus) -> Option<i64> {
    match status {
        MatchStatus::NotStarted | MatchStatus::Quarter => Some(100),
        MatchStatus::Half => Some(500),
        MatchStatus::ThreeQuarter => Some(1000),
        MatchStatus::EndPhase | MatchStatus::Completed => None,
    }
}

/// Free hits are only accepted up to the half-way mark.
pub fn free_hit_allowed(status: MatchStatus) -> bool {
    !matches!(
        status,
        MatchStatus::ThreeQuarter | MatchStatus::EndPhase | MatchStatus::Completed
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payment {
    /// Consume the free hit earned on this schedule index.
    FreeHit { match_index: usize },
    Points(i64),
}

/// What unlocking would cost right now, shown before the user commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockQuote {
    pub status: MatchStatus,
    pub cost: Option<i64>,
    /// `None` when the wallet cannot pay.
    pub payment: Option<Payment>,
    pub free_hits_available: usize,
    pub next_expiry: Option<DateTime<Utc>>,
}

impl UnlockQuote {
    pub fn can_unlock(&self) -> bool {
        self.payment.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("a completed match cannot be unlocked")]
    Completed,
    #[error("not enough power-play points: {remaining} left, {cost} needed")]
    InsufficientPoints { remaining: i64, cost: i64 },
    #[error("no valid free hit for a match at this stage")]
    NoFreeHit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerPlayWallet {
    pub total: i64,
    pub remaining: i64,
    pub free_hits: Vec<FreeHit>,
    pub used_free_hits: Vec<usize>,
}

impl PowerPlayWallet {
    pub fn new(total: i64) -> Self {
        Self { total, remaining: total, ..Default::default() }
    }

    /// Wallet for a league budget of `total` points given the user's score
    /// record, if they have one yet.
    pub fn from_score(total: i64, record: Option<&ScoreRecord>) -> Self {
        match record {
            Some(r) => Self {
                total,
                remaining: total - r.used_power_play_points,
                free_hits: r.free_hits.clone(),
                used_free_hits: r.used_free_hits.clone(),
            },
            None => Self::new(total),
        }
    }

    pub fn used_points(&self) -> i64 {
        self.total - self.remaining
    }

    /// Unexpired free hits whose match has not been redeemed, soonest expiry
    /// first.
    pub fn valid_free_hits(&self, now: DateTime<Utc>) -> Vec<&FreeHit> {
        let mut valid: Vec<&FreeHit> = self
            .free_hits
            .iter()
            .filter(|fh| fh.expiry > now && !self.used_free_hits.contains(&fh.match_index))
            .collect();
        // stable, so equal expiries keep list order
        valid.sort_by_key(|fh| fh.expiry);
        valid
    }

    pub fn free_hit_eligible(&self, status: MatchStatus, now: DateTime<Utc>) -> bool {
        free_hit_allowed(status) && !self.valid_free_hits(now).is_empty()
    }

    pub fn can_afford(&self, status: MatchStatus) -> bool {
        unlock_cost(status).is_some_and(|cost| self.remaining - cost >= 0)
    }

    pub fn can_unlock(&self, status: MatchStatus, now: DateTime<Utc>) -> bool {
        status != MatchStatus::Completed
            && (self.can_afford(status) || self.free_hit_eligible(status, now))
    }

    /// Price an unlock. A usable free hit is preferred over points.
    pub fn quote(&self, status: MatchStatus, now: DateTime<Utc>) -> UnlockQuote {
        let valid = self.valid_free_hits(now);
        let cost = unlock_cost(status);

        let payment = if status == MatchStatus::Completed {
            None
        } else if let Some(fh) = valid.first().filter(|_| free_hit_allowed(status)) {
            Some(Payment::FreeHit { match_index: fh.match_index })
        } else if self.can_afford(status) {
            cost.map(Payment::Points)
        } else {
            None
        };

        UnlockQuote {
            status,
            cost,
            payment,
            free_hits_available: valid.len(),
            next_expiry: valid.first().map(|fh| fh.expiry),
        }
    }

    /// Pay for one unlock and report how it was paid.
    pub fn spend(&mut self, status: MatchStatus, now: DateTime<Utc>) -> Result<Payment, WalletError> {
        if status == MatchStatus::Completed {
            return Err(WalletError::Completed);
        }
        match self.quote(status, now).payment {
            Some(Payment::FreeHit { match_index }) => {
                self.used_free_hits.push(match_index);
                Ok(Payment::FreeHit { match_index })
            }
            Some(Payment::Points(cost)) => {
                self.remaining -= cost;
                Ok(Payment::Points(cost))
            }
            None => match unlock_cost(status) {
                Some(cost) => Err(WalletError::InsufficientPoints { remaining: self.remaining, cost }),
                None => Err(WalletError::NoFreeHit),
            },
        }
    }

    /// Totals to merge into the stored score record.
    pub fn score_delta(&self) -> ScoreDelta {
        ScoreDelta {
            used_power_play_points: self.used_points(),
            used_free_hits: self.used_free_hits.clone(),
        }
    }
}
