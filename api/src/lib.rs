pub mod client;
pub mod wire;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Matches without a published end time are assumed to last this long.
pub const DEFAULT_MATCH_HOURS: i64 = 3;

// ---------------------------------------------------------------------------
// Domain types, mirroring the League API's camelCase JSON
// ---------------------------------------------------------------------------

/// One scheduled contest. Only `completed`, `winner` and `mom` change after
/// the schedule is published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub start: DateTime<Utc>,
    #[serde(default, with = "wire::optional_timestamp")]
    pub end: Option<DateTime<Utc>>,
    pub left: String,
    pub right: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub winner: String,
    /// Man of the match, `""` or `"none"` until the result is in.
    #[serde(default)]
    pub mom: String,
}

impl Match {
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end
            .unwrap_or_else(|| self.start + Duration::hours(DEFAULT_MATCH_HOURS))
    }

    pub fn is_playing(&self, team: &str) -> bool {
        !team.is_empty() && (self.left == team || self.right == team)
    }

    /// Copy the fields the server is allowed to change after publication.
    pub fn merge_result(&mut self, update: &Match) {
        self.completed = update.completed;
        self.winner = update.winner.clone();
        self.mom = update.mom.clone();
    }
}

/// A user's pick for one match. Empty strings and a zero confidence mean
/// "no pick".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub mom: String,
    #[serde(default)]
    pub confidence: u8,
}

impl Prediction {
    pub fn is_empty(&self) -> bool {
        self.team.is_empty() && self.mom.is_empty() && self.confidence == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionSet {
    #[serde(default)]
    pub tournament: String,
    #[serde(default)]
    pub league_name: String,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub tournament: String,
    #[serde(default)]
    pub modified: String,
    #[serde(default)]
    pub schedule: Vec<Match>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub league_name: String,
    #[serde(default)]
    pub description: String,
    pub tournament: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub created: Option<String>,
    /// Power-play budget every member of the league starts with.
    #[serde(default)]
    pub power_play_points: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLeagues {
    #[serde(default)]
    pub admin_leagues: Vec<League>,
    #[serde(default)]
    pub user_leagues: Vec<League>,
}

impl UserLeagues {
    /// Admin leagues first, then memberships, without duplicates.
    pub fn all(&self) -> Vec<&League> {
        let mut out: Vec<&League> = Vec::new();
        for league in self.admin_leagues.iter().chain(self.user_leagues.iter()) {
            let seen = out.iter().any(|l| {
                l.league_name == league.league_name && l.tournament == league.tournament
            });
            if !seen {
                out.push(league);
            }
        }
        out
    }

    /// Index of a league within [`UserLeagues::all`].
    pub fn position(&self, tournament: &str, league_name: &str) -> Option<usize> {
        self.all()
            .iter()
            .position(|l| l.tournament == tournament && l.league_name == league_name)
    }
}

/// Body of a league creation. The creator becomes its admin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLeague {
    pub league_name: String,
    pub description: String,
    pub tournament: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueMember {
    pub league_name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPlayers {
    #[serde(default)]
    pub tournament: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub players: Vec<String>,
}

/// Single-use unlock token earned by calling the man of the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeHit {
    /// Schedule index of the match that earned the free hit.
    #[serde(rename = "match")]
    pub match_index: usize,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreRecord {
    pub user_id: String,
    /// `"{tournament}/{leagueName}"`
    pub tournament_league: String,
    pub username: String,
    pub strikes: u32,
    pub lost_matches: Vec<usize>,
    pub confidence_score: i64,
    pub remaining_points: i64,
    pub survivor_rank: u32,
    pub confidence_rank: u32,
    pub used_power_play_points: i64,
    pub free_hits: Vec<FreeHit>,
    pub used_free_hits: Vec<usize>,
}

impl ScoreRecord {
    pub fn league_name(&self) -> &str {
        self.tournament_league
            .split_once('/')
            .map(|(_, league)| league)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueScores {
    pub league_name: String,
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentScores {
    #[serde(default)]
    pub tournament: String,
    #[serde(default)]
    pub leagues: Vec<LeagueScores>,
}

impl TournamentScores {
    pub fn league(&self, league_name: &str) -> Option<&LeagueScores> {
        self.leagues.iter().find(|l| l.league_name == league_name)
    }

    pub fn find_user(&self, league_name: &str, user_id: &str) -> Option<&ScoreRecord> {
        self.league(league_name)?
            .scores
            .iter()
            .find(|s| s.user_id == user_id)
    }
}

/// Wallet changes merged into the user's score record after an unlock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreDelta {
    pub used_power_play_points: i64,
    pub used_free_hits: Vec<usize>,
}
