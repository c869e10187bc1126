use crate::app::{App, MenuItem};
use crate::state::messages::NetworkRequest;
use chrono::Utc;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) {
    let mut guard = app.lock().await;
    let mut requests: Vec<NetworkRequest> = Vec::new();
    let (_, save) = guard.sync_clock(Utc::now());
    requests.extend(save);
    guard.state.expire_notification();

    // An open league form takes every key except quit.
    let quit = key_event.code == Char('c') && key_event.modifiers == KeyModifiers::CONTROL;
    if guard.state.active_tab == MenuItem::Leagues && guard.state.leagues.form.is_some() && !quit {
        match key_event.code {
            KeyCode::Esc => guard.close_league_form(),
            KeyCode::Enter => requests.extend(guard.league_form_submit()),
            KeyCode::Tab => guard.league_form_next_field(),
            KeyCode::Backspace => guard.league_form_backspace(),
            KeyCode::Delete => guard.league_form_remove(),
            KeyCode::Down => guard.league_form_select(true),
            KeyCode::Up => guard.league_form_select(false),
            Char(c) => guard.league_form_input(c),
            _ => {}
        }
        drop(guard);
        send_all(network_requests, requests).await;
        return;
    }

    // The unlock dialog captures confirm and cancel; picks still go to the draft.
    if guard.state.active_tab == MenuItem::Predictions && guard.unlock_open() {
        match key_event.code {
            Char('y') | KeyCode::Enter => {
                requests.extend(guard.confirm_unlock());
                drop(guard);
                send_all(network_requests, requests).await;
                return;
            }
            Char('n') | KeyCode::Esc => {
                guard.cancel_unlock();
                drop(guard);
                send_all(network_requests, requests).await;
                return;
            }
            _ => {}
        }
    }

    match (guard.state.active_tab, key_event.code, key_event.modifiers) {
        // Quit
        (_, Char('q'), _) | (_, Char('c'), KeyModifiers::CONTROL) => {
            guard.shutdown();
            crate::cleanup_terminal();
            std::process::exit(0);
        }

        // Tab switching
        (_, Char('1'), _) => guard.update_tab(MenuItem::Leagues),
        (_, Char('2'), _) => guard.update_tab(MenuItem::Predictions),
        (_, Char('3'), _) => guard.update_tab(MenuItem::Leaderboard),
        (_, Char('4'), _) => guard.update_tab(MenuItem::Schedule),
        (_, Char('?'), _) => guard.update_tab(MenuItem::Help),
        (MenuItem::Help, KeyCode::Esc, _) => guard.exit_help(),

        // Leagues
        (MenuItem::Leagues, Char('j') | KeyCode::Down, _) => requests.extend(guard.league_down()),
        (MenuItem::Leagues, Char('k') | KeyCode::Up, _) => requests.extend(guard.league_up()),
        (MenuItem::Leagues, KeyCode::Enter, _) => requests.extend(guard.open_selected_league()),
        (MenuItem::Leagues, Char('r'), _) => requests.push(guard.reload_leagues()),
        (MenuItem::Leagues, Char('n'), _) => guard.begin_create_league(),
        (MenuItem::Leagues, Char('i'), _) => requests.extend(guard.begin_manage_members()),

        // Predictions
        (MenuItem::Predictions, Char('j') | KeyCode::Down, _) => guard.match_down(),
        (MenuItem::Predictions, Char('k') | KeyCode::Up, _) => guard.match_up(),
        (MenuItem::Predictions, Char('a') | KeyCode::Left, _) => guard.pick_team(true),
        (MenuItem::Predictions, Char('d') | KeyCode::Right, _) => guard.pick_team(false),
        (MenuItem::Predictions, Char('+') | Char('='), _) => guard.adjust_confidence(true),
        (MenuItem::Predictions, Char('-'), _) => guard.adjust_confidence(false),
        (MenuItem::Predictions, Char('c') | KeyCode::Enter, _) => guard.commit_confidence(),
        (MenuItem::Predictions, Char('m'), _) => requests.extend(guard.cycle_man_of_match(true)),
        (MenuItem::Predictions, Char('M'), _) => requests.extend(guard.cycle_man_of_match(false)),
        (MenuItem::Predictions, Char('e'), _) => guard.begin_unlock(),
        (MenuItem::Predictions, Char('s'), _) => requests.extend(guard.save_predictions()),
        (MenuItem::Predictions, Char('r'), _) => requests.extend(guard.refresh_schedule()),

        // Leaderboard
        (MenuItem::Leaderboard, KeyCode::Tab, _) => guard.state.leaderboard.toggle_board(),
        (MenuItem::Leaderboard, Char('l') | KeyCode::Right, _) => {
            guard.state.leaderboard.next_page()
        }
        (MenuItem::Leaderboard, Char('h') | KeyCode::Left, _) => {
            guard.state.leaderboard.prev_page()
        }
        (MenuItem::Leaderboard, Char('r'), _) => requests.extend(guard.reload_scores()),

        // Schedule editor
        (MenuItem::Schedule, Char('j') | KeyCode::Down, _) => {
            guard.state.schedule_editor.select_next()
        }
        (MenuItem::Schedule, Char('k') | KeyCode::Up, _) => {
            guard.state.schedule_editor.select_prev()
        }
        (MenuItem::Schedule, KeyCode::Tab, _) => guard.state.schedule_editor.next_field(),
        (MenuItem::Schedule, KeyCode::BackTab, _) => guard.state.schedule_editor.prev_field(),
        (MenuItem::Schedule, Char('l') | Char('+') | KeyCode::Right, _) => {
            requests.extend(guard.adjust_schedule_field(true))
        }
        (MenuItem::Schedule, Char('h') | Char('-') | KeyCode::Left, _) => {
            requests.extend(guard.adjust_schedule_field(false))
        }
        (MenuItem::Schedule, KeyCode::Backspace | KeyCode::Delete, _) => {
            guard.clear_schedule_field()
        }
        (MenuItem::Schedule, Char('w'), _) => guard.state.schedule_editor.cycle_winner(),
        (MenuItem::Schedule, Char('m'), _) => requests.extend(guard.cycle_schedule_mom(true)),
        (MenuItem::Schedule, Char('x'), _) => guard.toggle_schedule_finished(),
        (MenuItem::Schedule, Char('s'), _) => requests.extend(guard.save_schedule()),

        // Global
        (_, Char('f'), _) => guard.toggle_full_screen(),
        (_, Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }

    drop(guard);
    send_all(network_requests, requests).await;
}

async fn send_all(network_requests: &mpsc::Sender<NetworkRequest>, requests: Vec<NetworkRequest>) {
    for request in requests {
        let _ = network_requests.send(request).await;
    }
}
