//! Per-match edit state for one user's prediction set.
//!
//! A slot is `Editable` until its lock threshold, then `Locked`. A locked
//! slot can be reopened for a single change through the unlock flow, which
//! charges the wallet on confirm.

use chrono::{DateTime, Utc};
use log::debug;
use trufan_api::{Match, Prediction, ScoreDelta};

use super::clock::{self, MatchStatus};
use super::ledger::{self, ConfidenceLedger, UNSET_CONFIDENCE};
use super::wallet::{Payment, PowerPlayWallet, UnlockQuote, WalletError};
use super::{UserMatch, pair_up};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockDraft {
    pub prediction: Prediction,
    pub quote: UnlockQuote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Editable,
    Locked,
    UnlockPending(UnlockDraft),
}

impl SlotState {
    pub fn is_locked(&self) -> bool {
        matches!(self, SlotState::Locked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no match at index {0}")]
    NoSuchMatch(usize),
    #[error("match {0} is locked")]
    Locked(usize),
    #[error("match {0} is already editable")]
    AlreadyEditable(usize),
    #[error("match {0} is completed")]
    Completed(usize),
    #[error("{team} is not playing in match {index}")]
    UnknownTeam { index: usize, team: String },
    #[error("{0} is not a confidence weight")]
    InvalidWeight(u8),
    #[error("confidence {0} is used up")]
    WeightExhausted(u8),
    #[error("cannot afford to unlock match {0}")]
    CannotUnlock(usize),
    #[error("match {0} has no unlock in progress")]
    NoUnlockPending(usize),
    #[error("prediction for match {0} was not changed")]
    Unchanged(usize),
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

pub type EditResult<T> = Result<T, EditError>;

/// Outcome of a confirmed unlock; the caller persists both the prediction
/// set and the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockReceipt {
    pub index: usize,
    pub prediction: Prediction,
    pub payment: Payment,
}

#[derive(Debug, Clone)]
pub struct PredictionEditor {
    user_matches: Vec<UserMatch>,
    states: Vec<SlotState>,
    /// Confidence being dragged, not yet committed.
    confidence_cache: Vec<Option<u8>>,
    ledger: ConfidenceLedger,
    wallet: PowerPlayWallet,
    dirty: bool,
    /// Wallet totals after an unlock the server has not confirmed yet.
    pending_delta: Option<ScoreDelta>,
}

impl PredictionEditor {
    /// Pair the schedule with saved predictions, fill in skipped matches and
    /// lock everything past its threshold.
    pub fn load(
        schedule: Vec<Match>,
        saved: &[Prediction],
        wallet: PowerPlayWallet,
        now: DateTime<Utc>,
    ) -> Self {
        let mut user_matches = pair_up(&schedule, saved);
        let before: Vec<u8> = user_matches.iter().map(|um| um.prediction.confidence).collect();
        let ledger = ledger::auto_assign_skipped(&mut user_matches, now);

        let assigned = user_matches
            .iter()
            .zip(before)
            .filter(|(um, old)| um.prediction.confidence != *old)
            .count();
        if assigned > 0 {
            debug!("auto-assigned confidence to {assigned} skipped match(es)");
        }

        let states = user_matches
            .iter()
            .map(|um| {
                if um.game.completed || clock::is_locked(um.game.start, now) {
                    SlotState::Locked
                } else {
                    SlotState::Editable
                }
            })
            .collect();

        Self {
            confidence_cache: vec![None; user_matches.len()],
            user_matches,
            states,
            ledger,
            wallet,
            dirty: assigned > 0,
            pending_delta: None,
        }
    }

    pub fn len(&self) -> usize {
        self.user_matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_matches.is_empty()
    }

    pub fn user_matches(&self) -> &[UserMatch] {
        &self.user_matches
    }

    pub fn state(&self, index: usize) -> Option<&SlotState> {
        self.states.get(index)
    }

    pub fn ledger(&self) -> &ConfidenceLedger {
        &self.ledger
    }

    pub fn wallet(&self) -> &PowerPlayWallet {
        &self.wallet
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn pending_delta(&self) -> Option<&ScoreDelta> {
        self.pending_delta.as_ref()
    }

    /// Clear the dirty flag. The pending wallet delta is only dropped when
    /// `saved` is the one that went out; a later unlock keeps its own.
    pub fn mark_saved(&mut self, saved: Option<&ScoreDelta>) {
        self.dirty = false;
        if saved.is_some() && saved == self.pending_delta.as_ref() {
            self.pending_delta = None;
        }
    }

    pub fn predictions(&self) -> Vec<Prediction> {
        self.user_matches.iter().map(|um| um.prediction.clone()).collect()
    }

    pub fn status(&self, index: usize, now: DateTime<Utc>) -> Option<(u8, MatchStatus)> {
        self.user_matches
            .get(index)
            .map(|um| clock::status_of(&um.game, now))
    }

    pub fn any_in_refresh_window(&self, now: DateTime<Utc>) -> bool {
        self.user_matches
            .iter()
            .any(|um| clock::in_refresh_window(um.game.start, um.game.end, now))
    }

    /// Lock thresholds still ahead of `now` for slots that are editable.
    pub fn lock_deadlines(&self, now: DateTime<Utc>) -> Vec<(usize, DateTime<Utc>)> {
        self.user_matches
            .iter()
            .zip(&self.states)
            .enumerate()
            .filter(|(_, (_, state))| matches!(state, SlotState::Editable))
            .map(|(i, (um, _))| (i, clock::lock_threshold(um.game.start)))
            .filter(|(_, at)| *at > now)
            .collect()
    }

    /// Prediction as the user currently sees it: the draft while unlocking,
    /// otherwise the saved one, with any dragged confidence applied.
    pub fn preview(&self, index: usize) -> Option<Prediction> {
        let mut prediction = match self.states.get(index)? {
            SlotState::UnlockPending(draft) => draft.prediction.clone(),
            _ => self.user_matches.get(index)?.prediction.clone(),
        };
        if let Some(Some(weight)) = self.confidence_cache.get(index) {
            prediction.confidence = *weight;
        }
        Some(prediction)
    }

    /// Pick `team`, or clear the whole prediction when `team` is already
    /// picked. A fresh pick gets the cheapest available confidence.
    pub fn toggle_team(&mut self, index: usize, team: &str) -> EditResult<()> {
        let game = self.game(index)?;
        if !game.is_playing(team) {
            return Err(EditError::UnknownTeam { index, team: team.to_owned() });
        }
        let minimum = self.ledger.minimum_assignable();

        let target = self.target_mut(index)?;
        if target.team == team {
            *target = Prediction::default();
        } else {
            target.team = team.to_owned();
            if target.confidence == UNSET_CONFIDENCE {
                target.confidence = minimum;
            }
        }
        self.after_edit(index);
        Ok(())
    }

    pub fn set_man_of_match(&mut self, index: usize, player: &str) -> EditResult<()> {
        let target = self.target_mut(index)?;
        target.mom = player.to_owned();
        self.after_edit(index);
        Ok(())
    }

    /// Live value while adjusting; nothing is validated until commit.
    pub fn drag_confidence(&mut self, index: usize, weight: u8) -> EditResult<()> {
        self.target_mut(index)?;
        if !ledger::is_valid_weight(weight) {
            return Err(EditError::InvalidWeight(weight));
        }
        self.confidence_cache[index] = Some(weight);
        Ok(())
    }

    /// Apply the dragged confidence. The cache is dropped whether or not
    /// the weight was accepted.
    pub fn commit_confidence(&mut self, index: usize) -> EditResult<u8> {
        self.target_mut(index)?;
        match self.confidence_cache[index].take() {
            Some(weight) => self.set_confidence(index, weight).map(|_| weight),
            None => Ok(self.preview(index).map(|p| p.confidence).unwrap_or_default()),
        }
    }

    pub fn set_confidence(&mut self, index: usize, weight: u8) -> EditResult<()> {
        if !ledger::is_valid_weight(weight) {
            return Err(EditError::InvalidWeight(weight));
        }
        let current = self.user_matches.get(index).map(|um| um.prediction.confidence);
        // re-selecting the slot's own weight does not draw from the budget
        let available = self.ledger.can_assign(weight) || current == Some(weight);
        let target = self.target_mut(index)?;
        if !available {
            return Err(EditError::WeightExhausted(weight));
        }
        target.confidence = weight;
        self.after_edit(index);
        Ok(())
    }

    /// Lock an editable slot whose threshold has passed. Slots with an
    /// unlock in progress are left alone. Returns whether anything changed.
    pub fn lock_due(&mut self, index: usize, now: DateTime<Utc>) -> bool {
        let Some(um) = self.user_matches.get(index) else {
            return false;
        };
        let due = um.game.completed || clock::is_locked(um.game.start, now);
        if due && matches!(self.states[index], SlotState::Editable) {
            self.states[index] = SlotState::Locked;
            self.confidence_cache[index] = None;
            debug!("match {index} locked");
            true
        } else {
            false
        }
    }

    pub fn quote(&self, index: usize, now: DateTime<Utc>) -> EditResult<UnlockQuote> {
        let (_, status) = self.status(index, now).ok_or(EditError::NoSuchMatch(index))?;
        Ok(self.wallet.quote(status, now))
    }

    /// Open a locked slot for a single paid change and return the price.
    pub fn begin_unlock(&mut self, index: usize, now: DateTime<Utc>) -> EditResult<UnlockQuote> {
        let game = self.game(index)?;
        if matches!(self.states[index], SlotState::Editable) {
            return Err(EditError::AlreadyEditable(index));
        }
        let (_, status) = clock::status_of(&game, now);
        if status == MatchStatus::Completed {
            return Err(EditError::Completed(index));
        }
        let quote = self.wallet.quote(status, now);
        if !quote.can_unlock() {
            return Err(EditError::CannotUnlock(index));
        }

        let prediction = self.user_matches[index].prediction.clone();
        self.confidence_cache[index] = None;
        self.states[index] = SlotState::UnlockPending(UnlockDraft { prediction, quote: quote.clone() });
        Ok(quote)
    }

    /// Drop the draft; nothing is charged.
    pub fn cancel_unlock(&mut self, index: usize) -> EditResult<()> {
        self.game(index)?;
        if !matches!(self.states[index], SlotState::UnlockPending(_)) {
            return Err(EditError::NoUnlockPending(index));
        }
        self.states[index] = SlotState::Locked;
        self.confidence_cache[index] = None;
        Ok(())
    }

    /// Charge the wallet and write the draft back. The price is taken at
    /// confirm time, so a match that moved on since the dialog opened costs
    /// the current rate. On error the draft stays open.
    pub fn confirm_unlock(&mut self, index: usize, now: DateTime<Utc>) -> EditResult<UnlockReceipt> {
        let game = self.game(index)?;
        let SlotState::UnlockPending(draft) = &self.states[index] else {
            return Err(EditError::NoUnlockPending(index));
        };
        if draft.prediction == self.user_matches[index].prediction {
            return Err(EditError::Unchanged(index));
        }
        let prediction = draft.prediction.clone();

        let (_, status) = clock::status_of(&game, now);
        let payment = self.wallet.spend(status, now)?;

        self.user_matches[index].prediction = prediction.clone();
        self.states[index] = SlotState::Locked;
        self.confidence_cache[index] = None;
        self.ledger = ledger::recompute(&self.user_matches);
        self.dirty = true;
        self.pending_delta = Some(self.wallet.score_delta());
        debug!("match {index} unlocked with {payment:?}");

        Ok(UnlockReceipt { index, prediction, payment })
    }

    /// Take server-side results for matches. Newly completed slots lock.
    pub fn merge_results(&mut self, schedule: &[Match]) -> bool {
        let mut changed = false;
        for (i, (um, update)) in self.user_matches.iter_mut().zip(schedule).enumerate() {
            let before = (um.game.completed, um.game.winner.clone(), um.game.mom.clone());
            um.game.merge_result(update);
            if before != (um.game.completed, um.game.winner.clone(), um.game.mom.clone()) {
                changed = true;
            }
            if um.game.completed && !self.states[i].is_locked() {
                self.states[i] = SlotState::Locked;
                self.confidence_cache[i] = None;
                changed = true;
            }
        }
        changed
    }

    fn game(&self, index: usize) -> EditResult<Match> {
        self.user_matches
            .get(index)
            .map(|um| um.game.clone())
            .ok_or(EditError::NoSuchMatch(index))
    }

    /// The prediction an edit applies to: the draft while unlocking, the
    /// live one while editable.
    fn target_mut(&mut self, index: usize) -> EditResult<&mut Prediction> {
        let state = self.states.get_mut(index).ok_or(EditError::NoSuchMatch(index))?;
        match state {
            SlotState::Editable => Ok(&mut self.user_matches[index].prediction),
            SlotState::UnlockPending(draft) => Ok(&mut draft.prediction),
            SlotState::Locked => Err(EditError::Locked(index)),
        }
    }

    fn after_edit(&mut self, index: usize) {
        if matches!(self.states[index], SlotState::Editable) {
            self.ledger = ledger::recompute(&self.user_matches);
            self.dirty = true;
        }
    }
}
