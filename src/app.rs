use crate::engine::editor::{EditError, PredictionEditor, SlotState};
use crate::engine::ledger::CONFIDENCE_WEIGHTS;
use crate::engine::wallet::{Payment, PowerPlayWallet};
use crate::state::app_settings::AppSettings;
use crate::state::app_state::{ActiveLeague, AppState, Query, cycle_option};
use crate::state::league_forms::{CreateLeagueForm, LeagueForm, MembersForm};
use crate::state::messages::{NetworkRequest, NetworkResponse, RequestKind, UiEvent};
use crate::state::refresher::PeriodicRefresher;
use crate::state::schedule_editor::{Field, NO_MOM};
use crate::state::scheduler::Scheduler;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use trufan_api::{
    League, LeagueMember, PredictionSet, Schedule, ScoreDelta, TournamentScores, UserLeagues,
};

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Leagues,
    Predictions,
    Leaderboard,
    Schedule,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub timers: Scheduler,
    ui_events: mpsc::Sender<UiEvent>,
}

impl App {
    pub fn new(settings: AppSettings, ui_events: mpsc::Sender<UiEvent>) -> Self {
        log::set_max_level(settings.log_level);
        tui_logger::set_default_level(settings.log_level);

        Self {
            state: AppState::new(),
            settings,
            timers: Scheduler::new(),
            ui_events,
        }
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    /// Apply a response and return any follow-up requests.
    pub fn on_network_response(&mut self, response: NetworkResponse) -> Vec<NetworkRequest> {
        match response {
            NetworkResponse::LoadingStateChanged { .. } => Vec::new(),
            NetworkResponse::LeaguesLoaded { leagues } => self.on_leagues_loaded(leagues),
            NetworkResponse::MembersLoaded { league_name, members } => {
                self.state.leagues.members.insert(league_name, Query::Ready(members));
                Vec::new()
            }
            NetworkResponse::LeagueOpened { league, schedule, predictions, scores } => {
                self.on_league_opened(league, schedule, predictions, scores);
                Vec::new()
            }
            NetworkResponse::LeagueCreated { league_name } => {
                self.state.leagues.form = None;
                self.state.notify(format!("League {league_name} created"), false);
                vec![self.reload_leagues()]
            }
            NetworkResponse::MembersSaved { league_name, members } => {
                self.on_members_saved(league_name, members);
                Vec::new()
            }
            NetworkResponse::PredictionsSaved { delta } => {
                self.on_predictions_saved(delta);
                Vec::new()
            }
            NetworkResponse::ScoresLoaded { scores } => {
                self.state.leaderboard.scores = Query::Ready(scores);
                Vec::new()
            }
            NetworkResponse::ScheduleRefreshed { schedule } => {
                self.on_schedule_refreshed(schedule);
                Vec::new()
            }
            NetworkResponse::ScheduleSaved => {
                self.state.schedule_editor.mark_saved();
                self.state.notify("Schedule saved", false);
                Vec::new()
            }
            NetworkResponse::PlayersLoaded { team, players } => {
                debug!("{} players for {team}", players.len());
                self.state.players.insert(team, players);
                Vec::new()
            }
            NetworkResponse::Error { request, message } => {
                self.on_error(request, message);
                Vec::new()
            }
        }
    }

    pub fn on_leagues_loaded(&mut self, leagues: UserLeagues) -> Vec<NetworkRequest> {
        self.state.last_error = None;
        self.state.leagues.leagues = Query::Ready(leagues);

        if let Some((tournament, league_name)) = self.settings.start_league.clone() {
            let position = self
                .state
                .leagues
                .leagues
                .ready()
                .and_then(|l| l.position(&tournament, &league_name));
            match position {
                Some(i) => {
                    self.state.leagues.selected = i;
                    return self.open_selected_league().into_iter().collect();
                }
                None => warn!("{user} is not in {tournament}/{league_name}", user = self.settings.user),
            }
        }
        self.load_selected_members().into_iter().collect()
    }

    pub fn on_league_opened(
        &mut self,
        league: League,
        schedule: Schedule,
        predictions: PredictionSet,
        scores: TournamentScores,
    ) {
        self.state.now = Utc::now();
        let record = scores.find_user(&league.league_name, &self.settings.user);
        let wallet = PowerPlayWallet::from_score(league.power_play_points, record);
        let editor = PredictionEditor::load(
            schedule.schedule.clone(),
            &predictions.predictions,
            wallet,
            self.state.now,
        );
        info!(
            "opened {}/{} with {} matches",
            league.tournament,
            league.league_name,
            editor.len()
        );

        self.state.schedule_editor.load(&league.tournament, schedule.schedule);
        self.state.leaderboard.league_name = league.league_name.clone();
        self.state.leaderboard.page = 0;
        self.state.leaderboard.scores = Query::Ready(scores);
        self.state.predictions.selected = 0;
        self.state.predictions.active = Query::Ready(ActiveLeague { league, editor });
    }

    /// Start the clock tick, the schedule refresher and a lock timer for
    /// every editable match of the open league.
    pub fn arm_timers(&mut self, network_requests: &mpsc::Sender<NetworkRequest>) {
        self.timers.cancel_all();
        let Some(active) = self.state.predictions.active.ready() else {
            return;
        };

        self.timers.every(
            "clock",
            self.settings.clock_interval,
            self.ui_events.clone(),
            UiEvent::ClockTick,
        );
        let refresher = PeriodicRefresher::new(
            network_requests.clone(),
            active.league.tournament.clone(),
            self.settings.refresh_interval,
        );
        self.timers.spawn("refresh", refresher.run());

        for (index, at) in active.editor.lock_deadlines(self.state.now) {
            self.timers.at(
                format!("lock {index}"),
                at,
                self.ui_events.clone(),
                UiEvent::LockDeadline { index },
            );
        }
        debug!("armed timers: {:?}", self.timers.labels());
    }

    pub fn on_predictions_saved(&mut self, delta: Option<ScoreDelta>) {
        if let Some(editor) = self.state.predictions.editor_mut() {
            editor.mark_saved(delta.as_ref());
        }
        let message = match delta {
            Some(_) => "Predictions and power plays saved",
            None => "Predictions saved",
        };
        self.state.notify(message, false);
    }

    pub fn on_members_saved(&mut self, league_name: String, members: Vec<String>) {
        if matches!(&self.state.leagues.form, Some(LeagueForm::Members(f)) if f.league.league_name == league_name)
        {
            self.state.leagues.form = None;
        }
        let members = members
            .into_iter()
            .map(|user_id| LeagueMember { league_name: league_name.clone(), user_id })
            .collect();
        self.state.leagues.members.insert(league_name, Query::Ready(members));
        self.state.notify("Members saved", false);
    }

    pub fn on_schedule_refreshed(&mut self, schedule: Schedule) {
        self.state.schedule_editor.merge_results(&schedule.schedule);
        if let Some(editor) = self.state.predictions.editor_mut()
            && editor.merge_results(&schedule.schedule)
        {
            debug!("schedule refresh brought new results");
        }
    }

    pub fn on_error(&mut self, request: RequestKind, message: String) {
        warn!("{request:?} failed: {message}");
        match request {
            RequestKind::Leagues => self.state.leagues.leagues = Query::Failed(message.clone()),
            RequestKind::League => {
                self.state.predictions.active = Query::Failed(message.clone());
            }
            RequestKind::Members => {
                if let Some(league) = self.state.leagues.selected_league() {
                    let name = league.league_name.clone();
                    self.state.leagues.members.insert(name, Query::Failed(message.clone()));
                }
            }
            RequestKind::Scores => self.state.leaderboard.scores = Query::Failed(message.clone()),
            RequestKind::SavePredictions | RequestKind::SaveUnlock => {
                self.state.notify(format!("Save failed, s to retry: {message}"), true);
            }
            RequestKind::CreateLeague => {
                self.state.notify(format!("Could not create league: {message}"), true);
            }
            RequestKind::SaveMembers => {
                self.state.notify(format!("Could not save members: {message}"), true);
            }
            RequestKind::SaveSchedule => {
                self.state.notify(format!("Schedule save failed: {message}"), true);
            }
            RequestKind::Players => self.state.players.forget_requests(),
            RequestKind::RefreshSchedule => {}
        }
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Timer events
    // -----------------------------------------------------------------------

    /// Re-sample `now` and lock every match past its threshold, whether or
    /// not its lock timer has fired. Timers run on a monotonic clock that
    /// stops during suspend. Returns how many matches locked and the save
    /// for any unsaved edits they carried.
    pub fn sync_clock(&mut self, now: DateTime<Utc>) -> (usize, Option<NetworkRequest>) {
        self.state.now = now;
        let Some(editor) = self.state.predictions.editor_mut() else {
            return (0, None);
        };
        let locked = (0..editor.len()).filter(|&i| editor.lock_due(i, now)).count();
        if locked > 0 && editor.is_dirty() {
            info!("{locked} match(es) locked with unsaved changes, saving");
            return (locked, self.save_predictions());
        }
        (locked, None)
    }

    /// Returns whether the screen needs a redraw (a match is near or in
    /// play, something locked, or a notification timed out) and any save
    /// the lock called for.
    pub fn on_clock_tick(&mut self) -> (bool, Option<NetworkRequest>) {
        let (locked, save) = self.sync_clock(Utc::now());
        let expired = self.state.expire_notification();
        let now = self.state.now;
        let live = self
            .state
            .predictions
            .editor()
            .is_some_and(|e| e.any_in_refresh_window(now));
        (expired || live || locked > 0, save)
    }

    /// Lock the match and save if there are unsaved edits.
    pub fn on_lock_deadline(&mut self, index: usize) -> Option<NetworkRequest> {
        debug!("lock timer for match {index}");
        self.sync_clock(Utc::now()).1
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        if next == MenuItem::Schedule && !self.settings.admin {
            self.state.notify("Schedule editing needs --admin", true);
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    /// Stop every timer; called on exit.
    pub fn shutdown(&mut self) {
        self.timers.cancel_all();
    }

    // -----------------------------------------------------------------------
    // Leagues
    // -----------------------------------------------------------------------

    pub fn reload_leagues(&mut self) -> NetworkRequest {
        self.state.leagues.leagues = Query::Loading;
        self.state.leagues.members.clear();
        NetworkRequest::LoadLeagues
    }

    pub fn league_down(&mut self) -> Option<NetworkRequest> {
        self.state.leagues.select_next();
        self.load_selected_members()
    }

    pub fn league_up(&mut self) -> Option<NetworkRequest> {
        self.state.leagues.select_prev();
        self.load_selected_members()
    }

    fn load_selected_members(&mut self) -> Option<NetworkRequest> {
        let league = self.state.leagues.selected_league()?.clone();
        if self.state.leagues.members.contains_key(&league.league_name) {
            return None;
        }
        self.state
            .leagues
            .members
            .insert(league.league_name.clone(), Query::Loading);
        Some(NetworkRequest::LoadMembers {
            tournament: league.tournament,
            league_name: league.league_name,
        })
    }

    /// Switch to the highlighted league. Timers of the previous one stop.
    pub fn open_selected_league(&mut self) -> Option<NetworkRequest> {
        let league = self.state.leagues.selected_league()?.clone();
        self.timers.cancel_all();
        self.state.predictions.active = Query::Loading;
        self.state.leaderboard.scores = Query::Loading;
        self.update_tab(MenuItem::Predictions);
        Some(NetworkRequest::OpenLeague { league })
    }

    /// Open the new-league form on the highlighted league's tournament.
    pub fn begin_create_league(&mut self) {
        let tournament = self
            .state
            .leagues
            .selected_league()
            .map(|l| l.tournament.clone())
            .or_else(|| self.settings.start_league.as_ref().map(|(t, _)| t.clone()))
            .unwrap_or_default();
        self.state.leagues.form = Some(LeagueForm::Create(CreateLeagueForm::new(&tournament)));
    }

    /// Open the member editor of the highlighted league. Admins only, and
    /// only once its current members are known.
    pub fn begin_manage_members(&mut self) -> Option<NetworkRequest> {
        let mut league = self.state.leagues.selected_league()?.clone();
        if !self.state.leagues.is_admin_of(&league) {
            self.state.notify("Only the league admin can manage members", true);
            return None;
        }
        if league.user_id.is_empty() {
            league.user_id = self.settings.user.clone();
        }
        match self.state.leagues.members.get(&league.league_name) {
            Some(Query::Ready(members)) => {
                let form = MembersForm::new(league, members);
                self.state.leagues.form = Some(LeagueForm::Members(form));
                None
            }
            Some(Query::Loading) => {
                self.state.notify("Members are still loading", true);
                None
            }
            _ => {
                self.state.leagues.members.remove(&league.league_name);
                self.load_selected_members()
            }
        }
    }

    pub fn close_league_form(&mut self) {
        self.state.leagues.form = None;
    }

    pub fn league_form_input(&mut self, c: char) {
        match &mut self.state.leagues.form {
            Some(LeagueForm::Create(form)) => form.push(c),
            Some(LeagueForm::Members(form)) => form.push(c),
            None => {}
        }
    }

    pub fn league_form_backspace(&mut self) {
        match &mut self.state.leagues.form {
            Some(LeagueForm::Create(form)) => form.pop(),
            Some(LeagueForm::Members(form)) => form.pop(),
            None => {}
        }
    }

    pub fn league_form_next_field(&mut self) {
        if let Some(LeagueForm::Create(form)) = &mut self.state.leagues.form {
            form.next_field();
        }
    }

    pub fn league_form_select(&mut self, down: bool) {
        if let Some(LeagueForm::Members(form)) = &mut self.state.leagues.form {
            if down {
                form.select_next();
            } else {
                form.select_prev();
            }
        }
    }

    pub fn league_form_remove(&mut self) {
        if let Some(LeagueForm::Members(form)) = &mut self.state.leagues.form {
            form.remove_selected();
        }
    }

    /// Enter: send the create form. In the member editor a typed id is
    /// added to the list; with nothing typed the list is saved.
    pub fn league_form_submit(&mut self) -> Option<NetworkRequest> {
        let user = self.settings.user.clone();
        let submitted = match self.state.leagues.form.as_mut()? {
            LeagueForm::Create(form) => form
                .to_new_league(&user)
                .map(|league| NetworkRequest::CreateLeague { league }),
            LeagueForm::Members(form) => {
                if !form.input.trim().is_empty() {
                    form.add();
                    return None;
                }
                Ok(NetworkRequest::SaveMembers {
                    tournament: form.league.tournament.clone(),
                    league_name: form.league.league_name.clone(),
                    members: form.members.clone(),
                })
            }
        };
        match submitted {
            Ok(request) => Some(request),
            Err(problem) => {
                self.state.notify(problem, true);
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Predictions
    // -----------------------------------------------------------------------

    pub fn match_down(&mut self) {
        self.state.predictions.select_next();
    }

    pub fn match_up(&mut self) {
        self.state.predictions.select_prev();
    }

    pub fn selected_slot(&self) -> Option<&SlotState> {
        self.state
            .predictions
            .editor()?
            .state(self.state.predictions.selected)
    }

    pub fn unlock_open(&self) -> bool {
        matches!(self.selected_slot(), Some(SlotState::UnlockPending(_)))
    }

    /// `left == true` picks the left-hand team.
    pub fn pick_team(&mut self, left: bool) {
        let index = self.state.predictions.selected;
        let Some(editor) = self.state.predictions.editor_mut() else {
            return;
        };
        let Some(um) = editor.user_matches().get(index) else {
            return;
        };
        let team = if left { um.game.left.clone() } else { um.game.right.clone() };
        ignore(editor.toggle_team(index, &team));
    }

    /// Step the dragged confidence through the weights.
    pub fn adjust_confidence(&mut self, up: bool) {
        let index = self.state.predictions.selected;
        let Some(editor) = self.state.predictions.editor_mut() else {
            return;
        };
        let current = editor.preview(index).map(|p| p.confidence).unwrap_or_default();
        let position = CONFIDENCE_WEIGHTS.iter().position(|w| *w == current);
        let next = match (position, up) {
            (None, true) => CONFIDENCE_WEIGHTS[0],
            (None, false) => CONFIDENCE_WEIGHTS[CONFIDENCE_WEIGHTS.len() - 1],
            (Some(i), true) => CONFIDENCE_WEIGHTS[(i + 1).min(CONFIDENCE_WEIGHTS.len() - 1)],
            (Some(i), false) => CONFIDENCE_WEIGHTS[i.saturating_sub(1)],
        };
        ignore(editor.drag_confidence(index, next));
    }

    pub fn commit_confidence(&mut self) {
        let index = self.state.predictions.selected;
        if let Some(editor) = self.state.predictions.editor_mut() {
            ignore(editor.commit_confidence(index));
        }
    }

    /// Cycle man of the match through both squads. Squads not fetched yet
    /// are requested first.
    pub fn cycle_man_of_match(&mut self, forward: bool) -> Vec<NetworkRequest> {
        let index = self.state.predictions.selected;
        let Some(active) = self.state.predictions.active.ready() else {
            return Vec::new();
        };
        let Some(um) = active.editor.user_matches().get(index) else {
            return Vec::new();
        };
        let tournament = active.league.tournament.clone();
        let (left, right) = (um.game.left.clone(), um.game.right.clone());
        let current = active.editor.preview(index).map(|p| p.mom).unwrap_or_default();

        let missing = self.request_players(&tournament, &[&left, &right]);
        if !missing.is_empty() {
            return missing;
        }

        let options = self.state.players.options("", &left, &right);
        if let Some(player) = cycle_option(&options, &current, forward)
            && let Some(editor) = self.state.predictions.editor_mut()
        {
            ignore(editor.set_man_of_match(index, &player));
        }
        Vec::new()
    }

    pub fn begin_unlock(&mut self) {
        let index = self.state.predictions.selected;
        let now = self.state.now;
        let Some(editor) = self.state.predictions.editor_mut() else {
            return;
        };
        match editor.begin_unlock(index, now) {
            Ok(_) => {}
            Err(EditError::CannotUnlock(_)) => {
                self.state.notify("Not enough power-play points or free hits", true);
            }
            Err(e) => debug!("unlock ignored: {e}"),
        }
    }

    pub fn cancel_unlock(&mut self) {
        let index = self.state.predictions.selected;
        if let Some(editor) = self.state.predictions.editor_mut() {
            ignore(editor.cancel_unlock(index));
        }
    }

    /// Pay for the unlock and save predictions and wallet together.
    pub fn confirm_unlock(&mut self) -> Option<NetworkRequest> {
        let index = self.state.predictions.selected;
        self.state.now = Utc::now();
        let now = self.state.now;
        let editor = self.state.predictions.editor_mut()?;
        match editor.confirm_unlock(index, now) {
            Ok(receipt) => {
                let paid = match receipt.payment {
                    Payment::FreeHit { match_index } => format!("free hit from match #{}", match_index + 1),
                    Payment::Points(points) => format!("{points} points"),
                };
                info!("unlocked match {} using {paid}", index + 1);
                self.save_predictions()
            }
            Err(EditError::Wallet(e)) => {
                self.state.notify(e.to_string(), true);
                None
            }
            Err(e) => {
                debug!("confirm ignored: {e}");
                None
            }
        }
    }

    /// Save the prediction set, together with the wallet while an unlock
    /// has not reached the server.
    pub fn save_predictions(&mut self) -> Option<NetworkRequest> {
        let active = self.state.predictions.active.ready()?;
        let set = prediction_set(&active.league, &active.editor);
        Some(match active.editor.pending_delta() {
            Some(delta) => NetworkRequest::SaveUnlock { set, delta: delta.clone() },
            None => NetworkRequest::SavePredictions { set },
        })
    }

    pub fn refresh_schedule(&self) -> Option<NetworkRequest> {
        let tournament = self.state.predictions.league()?.tournament.clone();
        Some(NetworkRequest::RefreshSchedule { tournament })
    }

    // -----------------------------------------------------------------------
    // Leaderboard
    // -----------------------------------------------------------------------

    pub fn reload_scores(&mut self) -> Option<NetworkRequest> {
        let tournament = self.state.predictions.league()?.tournament.clone();
        self.state.leaderboard.scores = Query::Loading;
        Some(NetworkRequest::LoadScores { tournament })
    }

    // -----------------------------------------------------------------------
    // Schedule editor
    // -----------------------------------------------------------------------

    pub fn cycle_schedule_mom(&mut self, forward: bool) -> Vec<NetworkRequest> {
        let editor = &self.state.schedule_editor;
        let Some(m) = editor.selected_match() else {
            return Vec::new();
        };
        let tournament = editor.tournament.clone();
        let (left, right, current) = (m.left.clone(), m.right.clone(), m.mom.clone());

        let missing = self.request_players(&tournament, &[&left, &right]);
        if !missing.is_empty() {
            return missing;
        }
        let options = self.state.players.options(NO_MOM, &left, &right);
        if let Some(player) = cycle_option(&options, &current, forward) {
            self.state.schedule_editor.set_man_of_match(&player);
        }
        Vec::new()
    }

    /// Step the focused field of the selected match.
    pub fn adjust_schedule_field(&mut self, forward: bool) -> Vec<NetworkRequest> {
        let steps = if forward { 1 } else { -1 };
        let editor = &mut self.state.schedule_editor;
        match editor.field {
            Field::Start => editor.shift_start(steps),
            Field::End => editor.shift_end(steps),
            Field::Winner => editor.cycle_winner(),
            Field::ManOfMatch => return self.cycle_schedule_mom(forward),
            Field::Finished => self.toggle_schedule_finished(),
        }
        Vec::new()
    }

    pub fn clear_schedule_field(&mut self) {
        let editor = &mut self.state.schedule_editor;
        match editor.field {
            Field::End => editor.clear_end(),
            Field::Winner => editor.clear_winner(),
            Field::ManOfMatch => editor.set_man_of_match(NO_MOM),
            Field::Start | Field::Finished => {}
        }
    }

    pub fn toggle_schedule_finished(&mut self) {
        if !self.state.schedule_editor.toggle_finished() {
            self.state
                .notify("A finished match needs an end time, a winner and a man of the match", true);
        }
    }

    pub fn save_schedule(&mut self) -> Option<NetworkRequest> {
        let editor = &self.state.schedule_editor;
        if editor.matches.is_empty() {
            return None;
        }
        Some(NetworkRequest::SaveSchedule {
            tournament: editor.tournament.clone(),
            schedule: editor.matches.clone(),
        })
    }

    fn request_players(&mut self, tournament: &str, teams: &[&str]) -> Vec<NetworkRequest> {
        let mut requests = Vec::new();
        for team in teams {
            if self.state.players.get(team).is_some() || !self.state.players.request(team) {
                continue;
            }
            requests.push(NetworkRequest::LoadPlayers {
                tournament: tournament.to_owned(),
                team: team.to_string(),
            });
        }
        requests
    }
}

fn prediction_set(league: &League, editor: &PredictionEditor) -> PredictionSet {
    PredictionSet {
        tournament: league.tournament.clone(),
        league_name: league.league_name.clone(),
        predictions: editor.predictions(),
        user_id: None,
    }
}

/// Rejected edits leave state untouched; they are only logged.
fn ignore<T>(result: Result<T, EditError>) {
    if let Err(e) = result {
        debug!("edit rejected: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use trufan_api::{LeagueScores, Match, ScoreRecord};

    fn member(user_id: &str) -> LeagueMember {
        LeagueMember { league_name: "office".into(), user_id: user_id.into() }
    }

    fn app() -> App {
        let (tx, _rx) = mpsc::channel(8);
        App::new(AppSettings { user: "fan".into(), ..Default::default() }, tx)
    }

    fn league() -> League {
        League {
            league_name: "office".into(),
            tournament: "IPL".into(),
            power_play_points: 1000,
            ..Default::default()
        }
    }

    fn future_schedule() -> Schedule {
        let start = Utc::now() + Duration::days(2);
        Schedule {
            tournament: "IPL".into(),
            modified: String::new(),
            schedule: (0..3)
                .map(|i| Match {
                    start: start + Duration::days(i),
                    left: format!("L{i}"),
                    right: format!("R{i}"),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn scores() -> TournamentScores {
        TournamentScores {
            tournament: "IPL".into(),
            leagues: vec![LeagueScores {
                league_name: "office".into(),
                scores: vec![ScoreRecord {
                    user_id: "fan".into(),
                    used_power_play_points: 300,
                    ..Default::default()
                }],
            }],
        }
    }

    fn opened() -> App {
        let mut app = app();
        app.on_league_opened(league(), future_schedule(), PredictionSet::default(), scores());
        app
    }

    #[test]
    fn opening_a_league_builds_the_wallet_from_scores() {
        let app = opened();
        let editor = app.state.predictions.editor().unwrap();
        assert_eq!(editor.len(), 3);
        assert_eq!(editor.wallet().remaining, 700);
        assert_eq!(app.state.leaderboard.league_name, "office");
        assert_eq!(app.state.schedule_editor.matches.len(), 3);
    }

    #[test]
    fn start_league_opens_on_load() {
        let mut app = app();
        app.settings.start_league = Some(("IPL".into(), "office".into()));
        let requests = app.on_leagues_loaded(UserLeagues {
            admin_leagues: vec![],
            user_leagues: vec![
                League { league_name: "family".into(), tournament: "IPL".into(), ..Default::default() },
                league(),
            ],
        });
        assert_eq!(app.state.leagues.selected, 1);
        assert!(matches!(requests.as_slice(), [NetworkRequest::OpenLeague { league }] if league.league_name == "office"));
        assert!(app.state.predictions.active.is_loading());
        assert_eq!(app.state.active_tab, MenuItem::Predictions);
    }

    #[test]
    fn leagues_load_members_of_highlighted() {
        let mut app = app();
        let requests = app.on_leagues_loaded(UserLeagues { admin_leagues: vec![league()], user_leagues: vec![] });
        assert!(matches!(requests.as_slice(), [NetworkRequest::LoadMembers { .. }]));
        // already loading, not asked twice
        assert!(app.league_down().is_none());
    }

    #[test]
    fn pick_and_save() {
        let mut app = opened();
        app.pick_team(true);
        app.adjust_confidence(true);
        app.commit_confidence();

        let Some(NetworkRequest::SavePredictions { set }) = app.save_predictions() else {
            panic!("expected a save request");
        };
        assert_eq!(set.league_name, "office");
        assert_eq!(set.predictions[0].team, "L0");
        assert_eq!(set.predictions[0].confidence, 40);
        assert!(set.predictions[1].is_empty());

        app.on_network_response(NetworkResponse::PredictionsSaved { delta: None });
        assert!(!app.state.predictions.editor().unwrap().is_dirty());
        assert!(app.state.notification.as_ref().is_some_and(|n| !n.is_error));
    }

    #[test]
    fn failed_save_keeps_local_state() {
        let mut app = opened();
        app.pick_team(false);
        app.on_network_response(NetworkResponse::Error {
            request: RequestKind::SavePredictions,
            message: "HTTP 500".into(),
        });
        let editor = app.state.predictions.editor().unwrap();
        assert!(editor.is_dirty());
        assert_eq!(editor.user_matches()[0].prediction.team, "R0");
        assert!(app.state.notification.as_ref().is_some_and(|n| n.is_error));
    }

    #[test]
    fn mom_cycle_requests_squads_first() {
        let mut app = opened();
        let requests = app.cycle_man_of_match(true);
        assert_eq!(requests.len(), 2);
        assert!(app.cycle_man_of_match(true).is_empty());

        app.on_network_response(NetworkResponse::PlayersLoaded { team: "L0".into(), players: vec!["a".into()] });
        app.on_network_response(NetworkResponse::PlayersLoaded { team: "R0".into(), players: vec!["b".into()] });
        app.cycle_man_of_match(true);
        app.cycle_man_of_match(true);
        assert_eq!(app.state.predictions.editor().unwrap().user_matches()[0].prediction.mom, "b");
    }

    #[tokio::test]
    async fn lock_deadline_auto_saves_dirty_predictions() {
        let mut app = app();
        let start = Utc::now() + Duration::minutes(30);
        let mut schedule = future_schedule();
        schedule.schedule[1].start = start;
        app.on_league_opened(league(), schedule, PredictionSet::default(), scores());
        // match 1 is already inside its lock hour
        assert!(app.state.predictions.editor().unwrap().state(1).unwrap().is_locked());

        app.pick_team(true);
        assert!(app.on_lock_deadline(0).is_none());

        let (tx, _rx) = mpsc::channel(8);
        app.arm_timers(&tx);
        assert!(app.timers.labels().contains(&"clock"));
        assert!(app.timers.labels().contains(&"lock 0"));
        assert!(!app.timers.labels().contains(&"lock 1"));

        app.shutdown();
        assert_eq!(app.timers.active(), 0);
    }

    #[test]
    fn lock_deadline_saves_when_dirty() {
        let mut app = app();
        let mut schedule = future_schedule();
        schedule.schedule[0].start = Utc::now() + Duration::hours(1) + Duration::milliseconds(200);
        app.on_league_opened(league(), schedule, PredictionSet::default(), scores());
        app.pick_team(true);
        std::thread::sleep(std::time::Duration::from_millis(250));
        assert!(matches!(app.on_lock_deadline(0), Some(NetworkRequest::SavePredictions { .. })));
        assert!(app.state.predictions.editor().unwrap().state(0).unwrap().is_locked());
        // nothing left to lock
        assert!(app.on_lock_deadline(0).is_none());
    }

    #[test]
    fn unlock_confirm_sends_wallet_delta() {
        let mut app = app();
        let mut schedule = future_schedule();
        schedule.schedule[0].start = Utc::now() - Duration::minutes(10);
        app.on_league_opened(league(), schedule, PredictionSet::default(), scores());

        app.begin_unlock();
        assert!(app.unlock_open());
        app.pick_team(false);
        let Some(NetworkRequest::SaveUnlock { set, delta }) = app.confirm_unlock() else {
            panic!("expected an unlock save");
        };
        assert_eq!(set.predictions[0].team, "R0");
        assert_eq!(delta.used_power_play_points, 400);
        assert!(!app.unlock_open());
    }

    #[test]
    fn failed_unlock_save_is_retried_with_the_wallet() {
        let mut app = app();
        let mut schedule = future_schedule();
        schedule.schedule[0].start = Utc::now() - Duration::minutes(10);
        app.on_league_opened(league(), schedule, PredictionSet::default(), scores());

        app.begin_unlock();
        app.pick_team(false);
        let Some(NetworkRequest::SaveUnlock { delta, .. }) = app.confirm_unlock() else {
            panic!("expected an unlock save");
        };
        app.on_network_response(NetworkResponse::Error {
            request: RequestKind::SaveUnlock,
            message: "HTTP 500".into(),
        });
        assert_eq!(app.state.predictions.editor().unwrap().wallet().remaining, 600);

        let Some(NetworkRequest::SaveUnlock { delta: retried, .. }) = app.save_predictions() else {
            panic!("a retry must carry the wallet change");
        };
        assert_eq!(retried, delta);

        app.on_network_response(NetworkResponse::PredictionsSaved { delta: Some(retried) });
        assert!(matches!(app.save_predictions(), Some(NetworkRequest::SavePredictions { .. })));
    }

    #[test]
    fn clock_locks_matches_whose_timer_never_fired() {
        let mut app = opened();
        let start = app.state.predictions.editor().unwrap().user_matches()[0].game.start;

        // e.g. after waking from suspend, no lock timer has run
        let (locked, save) = app.sync_clock(start - Duration::minutes(30));
        assert_eq!(locked, 1);
        assert!(save.is_none());
        app.pick_team(true);
        let editor = app.state.predictions.editor().unwrap();
        assert!(editor.state(0).unwrap().is_locked());
        assert!(editor.user_matches()[0].prediction.is_empty());
        assert!(!editor.state(1).unwrap().is_locked());

        let mut app = opened();
        app.pick_team(true);
        let (_, save) = app.sync_clock(start - Duration::minutes(30));
        assert!(matches!(save, Some(NetworkRequest::SavePredictions { .. })));
    }

    #[test]
    fn create_league_waits_for_the_server() {
        let mut app = app();
        app.on_leagues_loaded(UserLeagues { admin_leagues: vec![league()], user_leagues: vec![] });
        app.begin_create_league();
        assert!(app.league_form_submit().is_none());
        assert!(app.state.notification.as_ref().is_some_and(|n| n.is_error));

        "friday-five".chars().for_each(|c| app.league_form_input(c));
        let Some(NetworkRequest::CreateLeague { league: created }) = app.league_form_submit() else {
            panic!("expected a create request");
        };
        assert_eq!(created.league_name, "friday-five");
        assert_eq!(created.tournament, "IPL");
        assert_eq!(created.user_id, "fan");
        assert!(app.state.leagues.form.is_some());

        let follow_ups = app.on_network_response(NetworkResponse::LeagueCreated {
            league_name: "friday-five".into(),
        });
        assert!(matches!(follow_ups.as_slice(), [NetworkRequest::LoadLeagues]));
        assert!(app.state.leagues.form.is_none());
    }

    #[test]
    fn only_admins_manage_members() {
        let mut app = app();
        app.on_leagues_loaded(UserLeagues { admin_leagues: vec![], user_leagues: vec![league()] });
        assert!(app.begin_manage_members().is_none());
        assert!(app.state.leagues.form.is_none());
    }

    #[test]
    fn member_edits_are_saved_as_a_full_list() {
        let mut app = app();
        app.on_leagues_loaded(UserLeagues { admin_leagues: vec![league()], user_leagues: vec![] });
        // members still loading
        assert!(app.begin_manage_members().is_none());
        assert!(app.state.leagues.form.is_none());

        app.on_network_response(NetworkResponse::MembersLoaded {
            league_name: "office".into(),
            members: vec![member("fan")],
        });
        assert!(app.begin_manage_members().is_none());
        "mum".chars().for_each(|c| app.league_form_input(c));
        assert!(app.league_form_submit().is_none());

        let Some(NetworkRequest::SaveMembers { league_name, members, .. }) = app.league_form_submit() else {
            panic!("expected a member save");
        };
        assert_eq!(members, vec!["fan", "mum"]);

        app.on_network_response(NetworkResponse::MembersSaved { league_name, members });
        assert!(app.state.leagues.form.is_none());
        assert!(matches!(app.state.leagues.members.get("office"), Some(Query::Ready(m)) if m.len() == 2));
    }

    #[test]
    fn schedule_tab_is_admin_only() {
        let mut app = app();
        app.update_tab(MenuItem::Schedule);
        assert_eq!(app.state.active_tab, MenuItem::Leagues);
        app.settings.admin = true;
        app.update_tab(MenuItem::Schedule);
        assert_eq!(app.state.active_tab, MenuItem::Schedule);
    }

    #[test]
    fn refresh_merges_results_only() {
        let mut app = opened();
        let mut refreshed = future_schedule();
        refreshed.schedule[0].completed = true;
        refreshed.schedule[0].winner = "L0".into();
        refreshed.schedule[0].left = "XX".into();
        app.on_network_response(NetworkResponse::ScheduleRefreshed { schedule: refreshed });

        let game = &app.state.predictions.editor().unwrap().user_matches()[0].game;
        assert!(game.completed);
        assert_eq!(game.left, "L0");
    }
}
