use crate::app::MenuItem;
use crate::engine::editor::PredictionEditor;
use crate::state::leaderboard::LeaderboardState;
use crate::state::league_forms::LeagueForm;
use crate::state::schedule_editor::ScheduleEditorState;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use trufan_api::{League, LeagueMember, UserLeagues};

/// How long a notification stays on screen.
pub const NOTIFICATION_SECS: i64 = 6;

/// Async data as the UI sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Query<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Query::Idle
    }
}

impl<T> Query<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Query::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Query::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Query::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Query::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
    pub expires: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Leagues tab
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct LeaguesState {
    pub leagues: Query<UserLeagues>,
    pub selected: usize,
    /// Keyed by league name.
    pub members: HashMap<String, Query<Vec<LeagueMember>>>,
    /// Open create or member form; it takes all typing.
    pub form: Option<LeagueForm>,
}

impl LeaguesState {
    pub fn all(&self) -> Vec<&League> {
        self.leagues.ready().map(UserLeagues::all).unwrap_or_default()
    }

    pub fn selected_league(&self) -> Option<&League> {
        self.all().get(self.selected).copied()
    }

    pub fn is_admin_of(&self, league: &League) -> bool {
        self.leagues.ready().is_some_and(|l| {
            l.admin_leagues
                .iter()
                .any(|a| a.league_name == league.league_name && a.tournament == league.tournament)
        })
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.all().len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Predictions tab
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ActiveLeague {
    pub league: League,
    pub editor: PredictionEditor,
}

#[derive(Debug, Default)]
pub struct PredictionsState {
    pub active: Query<ActiveLeague>,
    pub selected: usize,
    pub scroll_offset: u16,
}

impl PredictionsState {
    pub fn editor(&self) -> Option<&PredictionEditor> {
        self.active.ready().map(|a| &a.editor)
    }

    pub fn editor_mut(&mut self) -> Option<&mut PredictionEditor> {
        self.active.ready_mut().map(|a| &mut a.editor)
    }

    pub fn league(&self) -> Option<&League> {
        self.active.ready().map(|a| &a.league)
    }

    pub fn select_next(&mut self) {
        let len = self.editor().map(PredictionEditor::len).unwrap_or_default();
        if self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

// ---------------------------------------------------------------------------
// Player lists, fetched once per team
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PlayerCache {
    players: HashMap<String, Vec<String>>,
    requested: HashSet<String>,
}

impl PlayerCache {
    /// Marks `team` as requested; true the first time only.
    pub fn request(&mut self, team: &str) -> bool {
        !team.is_empty() && !self.players.contains_key(team) && self.requested.insert(team.to_owned())
    }

    pub fn insert(&mut self, team: String, players: Vec<String>) {
        self.requested.remove(&team);
        self.players.insert(team, players);
    }

    /// Forget a failed request so it can be retried.
    pub fn forget_requests(&mut self) {
        self.requested.clear();
    }

    pub fn get(&self, team: &str) -> Option<&[String]> {
        self.players.get(team).map(Vec::as_slice)
    }

    /// Choices for a pick between two teams, `first` then both squads.
    pub fn options(&self, first: &str, left: &str, right: &str) -> Vec<String> {
        std::iter::once(first.to_owned())
            .chain(self.get(left).unwrap_or_default().iter().cloned())
            .chain(self.get(right).unwrap_or_default().iter().cloned())
            .collect()
    }
}

/// Next entry after `current` in `options`, wrapping; the first entry when
/// `current` is not listed.
pub fn cycle_option(options: &[String], current: &str, forward: bool) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let n = options.len();
    let next = match options.iter().position(|o| o == current) {
        Some(i) if forward => (i + 1) % n,
        Some(i) => (i + n - 1) % n,
        None => 0,
    };
    options.get(next).cloned()
}

// ---------------------------------------------------------------------------
// Root app state
// ---------------------------------------------------------------------------

pub struct AppState {
    pub active_tab: MenuItem,
    pub previous_tab: MenuItem,
    pub show_logs: bool,
    pub last_error: Option<String>,
    pub notification: Option<Notification>,
    /// Re-sampled by the clock tick.
    pub now: DateTime<Utc>,
    pub leagues: LeaguesState,
    pub predictions: PredictionsState,
    pub leaderboard: LeaderboardState,
    pub schedule_editor: ScheduleEditorState,
    pub players: PlayerCache,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_tab: MenuItem::default(),
            previous_tab: MenuItem::default(),
            show_logs: false,
            last_error: None,
            notification: None,
            now: Utc::now(),
            leagues: LeaguesState::default(),
            predictions: PredictionsState::default(),
            leaderboard: LeaderboardState::default(),
            schedule_editor: ScheduleEditorState::default(),
            players: PlayerCache::default(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&mut self, message: impl Into<String>, is_error: bool) {
        self.notification = Some(Notification {
            message: message.into(),
            is_error,
            expires: self.now + Duration::seconds(NOTIFICATION_SECS),
        });
    }

    /// Drop the notification once it has expired. Returns whether it did.
    pub fn expire_notification(&mut self) -> bool {
        if self.notification.as_ref().is_some_and(|n| n.expires <= self.now) {
            self.notification = None;
            return true;
        }
        false
    }
}
