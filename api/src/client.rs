use crate::wire::{ItemEnvelope, MembersBody, PredictionsBody, QueryResult, ScheduleBody};
use crate::{
    LeagueMember, Match, NewLeague, PredictionSet, Schedule, ScoreDelta, TeamPlayers,
    TournamentScores, UserLeagues,
};
use log::debug;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

const MISSING_ITEM: &str = "No such Item exists";
const ALREADY_EXISTS: &str = "Already Exists";

/// Client for the TruFan League API.
#[derive(Debug, Clone)]
pub struct LeagueApi {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl Default for LeagueApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error for {1}: {0}")]
    Network(#[source] reqwest::Error, String),
    #[error("API error for {url}: HTTP {status}")]
    Api { status: u16, url: String },
    #[error("Parse error for {1}: {0}")]
    Parsing(#[source] reqwest::Error, String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

impl LeagueApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .user_agent("trufan/0.1 (terminal client)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn fetch_user_leagues(&self, user: &str) -> ApiResult<UserLeagues> {
        let raw: QueryResult<UserLeagues> = self.get(&format!("/get-leagues/{user}")).await?;
        Ok(raw.items.into_iter().next().unwrap_or_default())
    }

    pub async fn fetch_league_members(
        &self,
        tournament: &str,
        league_name: &str,
    ) -> ApiResult<Vec<LeagueMember>> {
        let raw: QueryResult<LeagueMember> = self
            .get(&format!("/get-league-members/{tournament}/{league_name}"))
            .await?;
        Ok(raw.items)
    }

    /// Create a league administered by `league.user_id`. A taken name is
    /// [`ApiError::AlreadyExists`].
    pub async fn create_league(&self, league: &NewLeague) -> ApiResult<()> {
        self.post("/create-league", league).await
    }

    /// Replace the member list of a league.
    pub async fn set_league_members(
        &self,
        tournament: &str,
        league_name: &str,
        members: &[String],
    ) -> ApiResult<()> {
        self.post(
            &format!("/set-league-members/{tournament}/{league_name}"),
            &MembersBody { members },
        )
        .await
    }

    pub async fn fetch_schedule(&self, tournament: &str) -> ApiResult<Schedule> {
        let raw: ItemEnvelope<Schedule> = self.get(&format!("/get-schedule/{tournament}")).await?;
        raw.into_item()
            .ok_or_else(|| ApiError::NotFound(format!("no schedule published for {tournament}")))
    }

    /// Replace the whole schedule. Last write wins; there is no version check.
    pub async fn update_schedule(&self, tournament: &str, schedule: &[Match]) -> ApiResult<()> {
        self.post(
            &format!("/update-schedule/{tournament}"),
            &ScheduleBody { schedule },
        )
        .await
    }

    /// The user's predictions for a league. A user who never saved gets an
    /// empty set rather than an error.
    pub async fn fetch_predictions(
        &self,
        tournament: &str,
        league_name: &str,
        user: &str,
    ) -> ApiResult<PredictionSet> {
        let raw: ItemEnvelope<PredictionSet> = self
            .get(&format!(
                "/get-survivor-prediction/{tournament}/{league_name}/{user}"
            ))
            .await?;
        Ok(raw.into_item().unwrap_or_else(|| PredictionSet {
            tournament: tournament.to_owned(),
            league_name: league_name.to_owned(),
            ..Default::default()
        }))
    }

    pub async fn save_predictions(&self, set: &PredictionSet, user: &str) -> ApiResult<()> {
        self.post(
            &format!(
                "/set-survivor-prediction/{}/{}/{user}",
                set.tournament, set.league_name
            ),
            &PredictionsBody { predictions: &set.predictions },
        )
        .await
    }

    pub async fn fetch_players(&self, tournament: &str, team: &str) -> ApiResult<Vec<String>> {
        let raw: ItemEnvelope<TeamPlayers> =
            self.get(&format!("/get-players/{tournament}/{team}")).await?;
        Ok(raw.into_item().map(|t| t.players).unwrap_or_default())
    }

    pub async fn fetch_scores(&self, tournament: &str, user: &str) -> ApiResult<TournamentScores> {
        let raw: ItemEnvelope<TournamentScores> =
            self.get(&format!("/get-scores/{tournament}/{user}")).await?;
        Ok(raw.into_item().unwrap_or_else(|| TournamentScores {
            tournament: tournament.to_owned(),
            leagues: Vec::new(),
        }))
    }

    /// Merge power-play spending into the user's score record.
    pub async fn update_score(
        &self,
        tournament: &str,
        league_name: &str,
        user: &str,
        delta: &ScoreDelta,
    ) -> ApiResult<()> {
        self.post(
            &format!("/update-score/{tournament}/{league_name}/{user}"),
            delta,
        )
        .await
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.timeout(self.timeout);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn get<T: Default + DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .request(self.client.get(&url))
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parsing(e, url));
        }

        let body = response.text().await.unwrap_or_default();
        if is_missing_item(status, &body) {
            debug!("GET {url} answered {status}, using empty value");
            Ok(T::default())
        } else {
            Err(ApiError::Api { status: status.as_u16(), url })
        }
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .request(self.client.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.clone()))?;

        let status = response.status();
        if status.is_success() {
            debug!("POST {url} ok");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() && body.contains(ALREADY_EXISTS) {
            Err(ApiError::AlreadyExists(url))
        } else {
            Err(ApiError::Api { status: status.as_u16(), url })
        }
    }
}

/// The API answers a lookup of an absent record with 404, or with 400 and
/// "No such Item exists". Every other failure is a real error.
fn is_missing_item(status: StatusCode, body: &str) -> bool {
    status == StatusCode::NOT_FOUND
        || (status == StatusCode::BAD_REQUEST && body.contains(MISSING_ITEM))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prediction;
    use mockito::Matcher;
    use serde_json::json;

    const SCHEDULE_BODY: &str = r#"{"result":{"Item":{"tournament":"IPL","modified":"2020-09-01","schedule":[
        {"start":"2020-09-19T14:00:00.000Z","end":"2020-09-19T17:30:00.000Z","left":"MI","right":"CSK","completed":true,"winner":"CSK","mom":"Ambati Rayudu"},
        {"start":"2020-09-20T14:00:00.000Z","end":"","left":"DC","right":"KXIP","completed":false,"winner":"","mom":""}]}}}"#;

    #[tokio::test]
    async fn fetch_schedule_maps_matches() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/get-schedule/IPL")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SCHEDULE_BODY)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let schedule = api.fetch_schedule("IPL").await.unwrap();
        mock.assert_async().await;

        assert_eq!(schedule.schedule.len(), 2);
        assert!(schedule.schedule[0].completed);
        assert_eq!(schedule.schedule[0].winner, "CSK");
        assert!(schedule.schedule[1].end.is_none());
    }

    #[tokio::test]
    async fn missing_prediction_record_is_an_empty_set() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get-survivor-prediction/IPL/office/fan")
            .with_status(400)
            .with_body(r#"{"error":{"message":"No such Item exists"}}"#)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let set = api.fetch_predictions("IPL", "office", "fan").await.unwrap();
        assert!(set.predictions.is_empty());
        assert_eq!(set.league_name, "office");
    }

    #[tokio::test]
    async fn refused_read_is_an_error_not_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get-leagues/fan")
            .with_status(401)
            .with_body(r#"{"message":"Unauthorized"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/get-survivor-prediction/IPL/office/fan")
            .with_status(403)
            .create_async()
            .await;
        server
            .mock("GET", "/get-players/IPL/MI")
            .with_status(400)
            .with_body(r#"{"error":{"message":"bad team"}}"#)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url()).with_token(Some("expired".into()));
        let err = api.fetch_user_leagues("fan").await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 401, .. }), "got {err}");
        let err = api.fetch_predictions("IPL", "office", "fan").await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 403, .. }), "got {err}");
        let err = api.fetch_players("IPL", "MI").await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 400, .. }), "got {err}");
    }

    #[tokio::test]
    async fn not_found_read_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get-players/IPL/RCB")
            .with_status(404)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        assert!(api.fetch_players("IPL", "RCB").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn server_error_on_read_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get-scores/IPL/fan")
            .with_status(502)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let err = api.fetch_scores("IPL", "fan").await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 502, .. }), "got {err}");
    }

    #[tokio::test]
    async fn save_predictions_posts_only_the_prediction_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/set-survivor-prediction/IPL/office/fan")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::Json(json!({
                "predictions": [
                    {"team": "MI", "mom": "", "confidence": 40},
                    {"team": "", "mom": "", "confidence": 0}
                ]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let api = LeagueApi::new(server.url()).with_token(Some("secret".into()));
        let set = PredictionSet {
            tournament: "IPL".into(),
            league_name: "office".into(),
            predictions: vec![
                Prediction { team: "MI".into(), mom: String::new(), confidence: 40 },
                Prediction::default(),
            ],
            user_id: None,
        };
        api.save_predictions(&set, "fan").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_save_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/update-score/IPL/office/fan")
            .with_status(403)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let delta = ScoreDelta { used_power_play_points: 100, used_free_hits: vec![3] };
        let err = api.update_score("IPL", "office", "fan", &delta).await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn score_delta_is_sent_camel_cased() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/update-score/IPL/office/fan")
            .match_body(Matcher::Json(json!({
                "usedPowerPlayPoints": 600,
                "usedFreeHits": [3, 7]
            })))
            .with_status(200)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let delta = ScoreDelta { used_power_play_points: 600, used_free_hits: vec![3, 7] };
        api.update_score("IPL", "office", "fan", &delta).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_league_posts_the_new_league() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/create-league")
            .match_body(Matcher::Json(json!({
                "leagueName": "office",
                "description": "lunch table",
                "tournament": "IPL",
                "userId": "fan"
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let league = NewLeague {
            league_name: "office".into(),
            description: "lunch table".into(),
            tournament: "IPL".into(),
            user_id: "fan".into(),
        };
        api.create_league(&league).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn taken_league_name_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/create-league")
            .with_status(400)
            .with_body(r#"{"error":{"message":"Already Exists"}}"#)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let err = api.create_league(&NewLeague::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::AlreadyExists(_)), "got {err}");
    }

    #[tokio::test]
    async fn set_league_members_posts_the_full_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/set-league-members/IPL/office")
            .match_body(Matcher::Json(json!({ "members": ["fan", "mum@example.com"] })))
            .with_status(200)
            .with_body(r#"{"result":{"Items":[]}}"#)
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let members = vec!["fan".to_string(), "mum@example.com".to_string()];
        api.set_league_members("IPL", "office", &members).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn user_leagues_unwraps_first_item() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get-leagues/fan")
            .with_status(200)
            .with_body(
                r#"{"Count":1,"ScannedCount":1,"Items":[{
                    "adminLeagues":[{"leagueName":"office","tournament":"IPL","userId":"fan","powerPlayPoints":1500}],
                    "userLeagues":[{"leagueName":"family","tournament":"IPL","userId":"mum"}]}]}"#,
            )
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let leagues = api.fetch_user_leagues("fan").await.unwrap();
        assert_eq!(leagues.admin_leagues[0].power_play_points, 1500);
        assert_eq!(leagues.user_leagues[0].power_play_points, 0);
        assert_eq!(leagues.all().len(), 2);
    }

    #[tokio::test]
    async fn players_and_scores_parse() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get-players/IPL/MI")
            .with_status(200)
            .with_body(r#"{"result":{"Item":{"tournament":"IPL","team":"MI","players":["Rohit Sharma","Jasprit Bumrah"]}}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/get-scores/IPL/fan")
            .with_status(200)
            .with_body(
                r#"{"result":{"Item":{"tournament":"IPL","leagues":[{"leagueName":"office","scores":[
                    {"userId":"fan","tournamentLeague":"IPL/office","username":"fan","strikes":1,
                     "usedPowerPlayPoints":100,"freeHits":[{"match":3,"expiry":"2020-10-01T10:00:00Z"}],
                     "usedFreeHits":[]}]}]}}}"#,
            )
            .create_async()
            .await;

        let api = LeagueApi::new(server.url());
        let players = api.fetch_players("IPL", "MI").await.unwrap();
        assert_eq!(players, vec!["Rohit Sharma", "Jasprit Bumrah"]);

        let scores = api.fetch_scores("IPL", "fan").await.unwrap();
        let me = scores.find_user("office", "fan").unwrap();
        assert_eq!(me.used_power_play_points, 100);
        assert_eq!(me.free_hits[0].match_index, 3);
        assert_eq!(me.survivor_rank, 0);
    }
}
