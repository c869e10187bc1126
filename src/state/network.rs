use crate::state::messages::{NetworkRequest, NetworkResponse};
use log::{debug, error, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use trufan_api::client::{ApiResult, LeagueApi};
use trufan_api::{League, Match, PredictionSet, ScoreDelta};

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

pub struct NetworkWorker {
    client: LeagueApi,
    user: String,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        client: LeagueApi,
        user: String,
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            client,
            user,
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            // background refreshes don't spin
            let quiet = matches!(request, NetworkRequest::RefreshSchedule { .. });
            if !quiet {
                self.start_loading_animation().await;
            }

            let kind = request.kind();
            let result = self.handle(request).await;

            debug!("network request {kind:?} complete");
            if !quiet {
                self.stop_loading_animation(result.is_ok()).await;
            }

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                request: kind,
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle(&self, request: NetworkRequest) -> ApiResult<NetworkResponse> {
        match request {
            NetworkRequest::LoadLeagues => {
                let leagues = self.client.fetch_user_leagues(&self.user).await?;
                Ok(NetworkResponse::LeaguesLoaded { leagues })
            }
            NetworkRequest::LoadMembers { tournament, league_name } => {
                let members = self
                    .client
                    .fetch_league_members(&tournament, &league_name)
                    .await?;
                Ok(NetworkResponse::MembersLoaded { league_name, members })
            }
            NetworkRequest::CreateLeague { league } => {
                self.client.create_league(&league).await?;
                info!("created {}/{}", league.tournament, league.league_name);
                Ok(NetworkResponse::LeagueCreated { league_name: league.league_name })
            }
            NetworkRequest::SaveMembers { tournament, league_name, members } => {
                self.client
                    .set_league_members(&tournament, &league_name, &members)
                    .await?;
                info!("{league_name} now has {} members", members.len());
                Ok(NetworkResponse::MembersSaved { league_name, members })
            }
            NetworkRequest::OpenLeague { league } => self.handle_open_league(league).await,
            NetworkRequest::SavePredictions { set } => {
                self.handle_save_predictions(set, None).await
            }
            NetworkRequest::SaveUnlock { set, delta } => {
                self.handle_save_predictions(set, Some(delta)).await
            }
            NetworkRequest::LoadScores { tournament } => {
                let scores = self.client.fetch_scores(&tournament, &self.user).await?;
                Ok(NetworkResponse::ScoresLoaded { scores })
            }
            NetworkRequest::RefreshSchedule { tournament } => {
                debug!("refreshing schedule for {tournament}");
                let schedule = self.client.fetch_schedule(&tournament).await?;
                Ok(NetworkResponse::ScheduleRefreshed { schedule })
            }
            NetworkRequest::SaveSchedule { tournament, schedule } => {
                self.handle_save_schedule(tournament, schedule).await
            }
            NetworkRequest::LoadPlayers { tournament, team } => {
                let players = self.client.fetch_players(&tournament, &team).await?;
                Ok(NetworkResponse::PlayersLoaded { team, players })
            }
        }
    }

    async fn handle_open_league(&self, league: League) -> ApiResult<NetworkResponse> {
        debug!("opening {}/{}", league.tournament, league.league_name);
        let schedule = self.client.fetch_schedule(&league.tournament).await?;
        let predictions = self
            .client
            .fetch_predictions(&league.tournament, &league.league_name, &self.user)
            .await?;
        let scores = self.client.fetch_scores(&league.tournament, &self.user).await?;
        Ok(NetworkResponse::LeagueOpened { league, schedule, predictions, scores })
    }

    async fn handle_save_predictions(
        &self,
        set: PredictionSet,
        delta: Option<ScoreDelta>,
    ) -> ApiResult<NetworkResponse> {
        self.client.save_predictions(&set, &self.user).await?;
        if let Some(delta) = &delta {
            self.client
                .update_score(&set.tournament, &set.league_name, &self.user, delta)
                .await?;
        }
        info!("saved {} predictions for {}", set.predictions.len(), set.league_name);
        Ok(NetworkResponse::PredictionsSaved { delta })
    }

    async fn handle_save_schedule(
        &self,
        tournament: String,
        schedule: Vec<Match>,
    ) -> ApiResult<NetworkResponse> {
        self.client.update_schedule(&tournament, &schedule).await?;
        info!("saved {} matches for {tournament}", schedule.len());
        Ok(NetworkResponse::ScheduleSaved)
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}
