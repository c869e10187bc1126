use trufan_api::{ScoreRecord, TournamentScores};

use crate::state::app_state::Query;

/// Only the top of each table is shown.
pub const TOP_N: usize = 10;
pub const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Board {
    #[default]
    Survivor,
    Confidence,
}

impl Board {
    pub fn label(self) -> &'static str {
        match self {
            Board::Survivor => "Survivor",
            Board::Confidence => "Confidence",
        }
    }

    fn rank(self, record: &ScoreRecord) -> u32 {
        match self {
            Board::Survivor => record.survivor_rank,
            Board::Confidence => record.confidence_rank,
        }
    }
}

#[derive(Debug, Default)]
pub struct LeaderboardState {
    pub scores: Query<TournamentScores>,
    pub league_name: String,
    pub board: Board,
    pub page: usize,
}

impl LeaderboardState {
    pub fn toggle_board(&mut self) {
        self.board = match self.board {
            Board::Survivor => Board::Confidence,
            Board::Confidence => Board::Survivor,
        };
        self.page = 0;
    }

    pub fn rows(&self) -> Vec<&ScoreRecord> {
        self.scores
            .ready()
            .and_then(|s| s.league(&self.league_name))
            .map(|l| ranked(&l.scores, self.board))
            .unwrap_or_default()
    }

    pub fn page_rows(&self) -> Vec<(usize, &ScoreRecord)> {
        self.rows()
            .into_iter()
            .enumerate()
            .skip(self.page * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.rows().len().div_ceil(PAGE_SIZE).max(1)
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.page_count() {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }
}

/// Stable sort by the board's rank, then the first [`TOP_N`].
pub fn ranked(scores: &[ScoreRecord], board: Board) -> Vec<&ScoreRecord> {
    let mut rows: Vec<&ScoreRecord> = scores.iter().collect();
    rows.sort_by_key(|r| board.rank(r));
    rows.truncate(TOP_N);
    rows
}
