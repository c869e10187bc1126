use crate::state::network::LoadingState;
use crossterm::event::KeyEvent;
use trufan_api::{
    League, LeagueMember, Match, NewLeague, PredictionSet, Schedule, ScoreDelta,
    TournamentScores, UserLeagues,
};

#[derive(Debug, Clone)]
pub enum NetworkRequest {
    LoadLeagues,
    LoadMembers { tournament: String, league_name: String },
    CreateLeague { league: NewLeague },
    SaveMembers { tournament: String, league_name: String, members: Vec<String> },
    /// Schedule, the user's predictions and the tournament scores in one go.
    OpenLeague { league: League },
    SavePredictions { set: PredictionSet },
    /// Predictions and the wallet spend of an unlock, saved together.
    SaveUnlock { set: PredictionSet, delta: ScoreDelta },
    LoadScores { tournament: String },
    RefreshSchedule { tournament: String },
    SaveSchedule { tournament: String, schedule: Vec<Match> },
    LoadPlayers { tournament: String, team: String },
}

/// Which request a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Leagues,
    Members,
    CreateLeague,
    SaveMembers,
    League,
    SavePredictions,
    SaveUnlock,
    Scores,
    RefreshSchedule,
    SaveSchedule,
    Players,
}

impl NetworkRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            NetworkRequest::LoadLeagues => RequestKind::Leagues,
            NetworkRequest::LoadMembers { .. } => RequestKind::Members,
            NetworkRequest::CreateLeague { .. } => RequestKind::CreateLeague,
            NetworkRequest::SaveMembers { .. } => RequestKind::SaveMembers,
            NetworkRequest::OpenLeague { .. } => RequestKind::League,
            NetworkRequest::SavePredictions { .. } => RequestKind::SavePredictions,
            NetworkRequest::SaveUnlock { .. } => RequestKind::SaveUnlock,
            NetworkRequest::LoadScores { .. } => RequestKind::Scores,
            NetworkRequest::RefreshSchedule { .. } => RequestKind::RefreshSchedule,
            NetworkRequest::SaveSchedule { .. } => RequestKind::SaveSchedule,
            NetworkRequest::LoadPlayers { .. } => RequestKind::Players,
        }
    }
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    LeaguesLoaded { leagues: UserLeagues },
    MembersLoaded { league_name: String, members: Vec<LeagueMember> },
    LeagueCreated { league_name: String },
    MembersSaved { league_name: String, members: Vec<String> },
    LeagueOpened {
        league: League,
        schedule: Schedule,
        predictions: PredictionSet,
        scores: TournamentScores,
    },
    /// `delta` is the wallet state that was written with the predictions.
    PredictionsSaved { delta: Option<ScoreDelta> },
    ScoresLoaded { scores: TournamentScores },
    /// Only results are taken from a refresh; fixtures stay as loaded.
    ScheduleRefreshed { schedule: Schedule },
    ScheduleSaved,
    PlayersLoaded { team: String, players: Vec<String> },
    Error { request: RequestKind, message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    /// Re-sample the clock. Never edits predictions.
    ClockTick,
    LockDeadline { index: usize },
}
