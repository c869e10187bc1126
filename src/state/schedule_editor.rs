//! Admin editing of the tournament schedule: times, winner, man of the
//! match and the finished flag.

use chrono::Duration;
use trufan_api::Match;

/// Start and end move in steps of this many minutes.
pub const TIME_STEP_MINUTES: i64 = 15;
pub const NO_MOM: &str = "none";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    Start,
    End,
    Winner,
    ManOfMatch,
    Finished,
}

impl Field {
    const ALL: [Field; 5] = [Field::Start, Field::End, Field::Winner, Field::ManOfMatch, Field::Finished];

    pub fn label(self) -> &'static str {
        match self {
            Field::Start => "Start",
            Field::End => "End",
            Field::Winner => "Winner",
            Field::ManOfMatch => "Man of the match",
            Field::Finished => "Finished",
        }
    }

    fn step(self, forward: bool) -> Self {
        let i = Field::ALL.iter().position(|f| *f == self).unwrap_or_default();
        let n = Field::ALL.len();
        Field::ALL[if forward { (i + 1) % n } else { (i + n - 1) % n }]
    }
}

#[derive(Debug, Default)]
pub struct ScheduleEditorState {
    pub tournament: String,
    pub matches: Vec<Match>,
    pub selected: usize,
    pub field: Field,
    pub dirty: bool,
}

impl ScheduleEditorState {
    pub fn load(&mut self, tournament: &str, matches: Vec<Match>) {
        self.tournament = tournament.to_owned();
        self.matches = matches;
        self.selected = self.selected.min(self.matches.len().saturating_sub(1));
        self.dirty = false;
    }

    /// Take server results unless there are local edits to keep.
    pub fn merge_results(&mut self, matches: &[Match]) {
        if self.dirty {
            return;
        }
        for (current, update) in self.matches.iter_mut().zip(matches) {
            current.merge_result(update);
        }
    }

    pub fn selected_match(&self) -> Option<&Match> {
        self.matches.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.matches.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn next_field(&mut self) {
        self.field = self.field.step(true);
    }

    pub fn prev_field(&mut self) {
        self.field = self.field.step(false);
    }

    /// Moves the start time, never past an explicit end.
    pub fn shift_start(&mut self, steps: i64) {
        self.edit(|m| {
            let start = m.start + Duration::minutes(steps * TIME_STEP_MINUTES);
            m.start = match m.end {
                Some(end) => start.min(end),
                None => start,
            };
        });
    }

    /// Moves the end time; an unset end starts from the default length.
    pub fn shift_end(&mut self, steps: i64) {
        self.edit(|m| {
            let end = m.effective_end() + Duration::minutes(steps * TIME_STEP_MINUTES);
            m.end = Some(end.max(m.start));
        });
    }

    pub fn clear_end(&mut self) {
        self.edit(|m| {
            m.end = None;
            m.completed = false;
        });
    }

    /// Picking a winner also marks the match finished.
    pub fn set_winner(&mut self, team: &str) {
        self.edit(|m| {
            if m.is_playing(team) {
                m.winner = team.to_owned();
                m.completed = true;
            }
        });
    }

    pub fn clear_winner(&mut self) {
        self.edit(|m| {
            m.winner.clear();
            m.mom = NO_MOM.to_owned();
            m.completed = false;
        });
    }

    /// No winner, then the left team, then the right team.
    pub fn cycle_winner(&mut self) {
        let Some(m) = self.selected_match() else {
            return;
        };
        if m.winner.is_empty() {
            let left = m.left.clone();
            self.set_winner(&left);
        } else if m.winner == m.left {
            let right = m.right.clone();
            self.set_winner(&right);
        } else {
            self.clear_winner();
        }
    }

    pub fn set_man_of_match(&mut self, player: &str) {
        self.edit(|m| m.mom = player.to_owned());
    }

    /// Finished can only be ticked once man of the match, end time and
    /// winner are all in.
    pub fn toggle_finished(&mut self) -> bool {
        let mut accepted = false;
        self.edit(|m| {
            let want = !m.completed;
            let ready = m.mom != NO_MOM && m.end.is_some() && !m.winner.is_empty();
            m.completed = ready && want;
            accepted = m.completed == want;
        });
        accepted
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn edit(&mut self, f: impl FnOnce(&mut Match)) {
        if let Some(m) = self.matches.get_mut(self.selected) {
            let before = m.clone();
            f(m);
            if *m != before {
                self.dirty = true;
            }
        }
    }
}
