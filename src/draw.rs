use chrono::{DateTime, Local, Utc};
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::components::league_dialog::LeagueDialog;
use crate::components::status_bar::StatusBar;
use crate::components::unlock_dialog::UnlockDialog;
use crate::engine::UserMatch;
use crate::engine::clock::{self, MatchStatus};
use crate::engine::editor::{PredictionEditor, SlotState};
use crate::engine::wallet::Payment;
use crate::state::app_state::Query;
use crate::state::leaderboard::Board;
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::schedule_editor::Field;
use crate::ui::layout::LayoutAreas;

static TABS: &[&str; 4] = &["Leagues", "Predictions", "Leaderboard", "Schedule"];

const HELP_TEXT: &str = "\
Global      1-4 switch tab   ? help   \" logs   f full screen   q quit

Leagues     j/k move   Enter open league   r reload
            n new league   i invite or remove members (admins)

Predictions j/k move   a/d pick left/right team   +/- drag confidence
            c or Enter commit confidence   m/M man of the match
            e unlock a locked match (y confirm, Esc cancel)
            s save   r refresh results

Leaderboard Tab survivor/confidence   h/l page   r reload

Schedule    j/k move   Tab/Shift-Tab field   h/l adjust   Backspace clear
            w winner   m man of the match   x finished   s save";

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Leagues => draw_leagues(f, layout.main, app),
            MenuItem::Predictions => draw_predictions(f, layout.main, app),
            MenuItem::Leaderboard => draw_leaderboard(f, layout.main, app),
            MenuItem::Schedule => draw_schedule(f, layout.main, app),
            MenuItem::Help => draw_placeholder(f, layout.main, HELP_TEXT),
        }
        if app.state.active_tab == MenuItem::Leagues
            && let Some(form) = &app.state.leagues.form
        {
            f.render_widget(LeagueDialog { form }, layout.main);
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }
        draw_footer(f, layout.footer, app);
        draw_loading_spinner(f, f.area(), app, loading);
    });
    if let Err(e) = result {
        log::error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab = match app.state.active_tab {
        MenuItem::Help => app.state.previous_tab,
        other => other,
    };
    let tab_index = match tab {
        MenuItem::Leagues | MenuItem::Help => 0,
        MenuItem::Predictions => 1,
        MenuItem::Leaderboard => 2,
        MenuItem::Schedule => 3,
    };

    let visible = if app.settings.admin { TABS.len() } else { TABS.len() - 1 };
    let titles: Vec<Line> = TABS.iter().take(visible).map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

// ---------------------------------------------------------------------------
// Leagues
// ---------------------------------------------------------------------------

fn draw_leagues(f: &mut Frame, area: Rect, app: &App) {
    let [list_area, members_area] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);

    let block = default_border(Color::White).title(format!(" Leagues of {} ", app.settings.user));
    let inner = block.inner(list_area);
    f.render_widget(block, list_area);

    let leagues = &app.state.leagues;
    if let Some(msg) = query_message(&leagues.leagues, "leagues") {
        draw_message(f, inner, &msg);
        return;
    }
    let all = leagues.all();
    if all.is_empty() {
        draw_message(f, inner, "You are not in any league yet");
        return;
    }

    let open = app.state.predictions.league();
    let lines: Vec<Line> = all
        .iter()
        .enumerate()
        .map(|(i, league)| {
            let marker = if i == leagues.selected { ">" } else { " " };
            let mut spans = vec![Span::raw(format!(
                "{marker} {} / {}",
                league.tournament, league.league_name
            ))];
            if leagues.is_admin_of(league) {
                spans.push(Span::styled("  [admin]", Style::default().fg(Color::Cyan)));
            }
            if open.is_some_and(|o| o.tournament == league.tournament && o.league_name == league.league_name) {
                spans.push(Span::styled("  [open]", Style::default().fg(Color::Green)));
            }
            Line::from(spans)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);

    let Some(selected) = leagues.selected_league() else {
        return;
    };
    let block = default_border(Color::DarkGray).title(format!(" {} ", selected.league_name));
    let inner = block.inner(members_area);
    f.render_widget(block, members_area);

    let mut lines = Vec::new();
    if !selected.description.is_empty() {
        lines.push(Line::from(Span::styled(
            selected.description.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    lines.push(Line::from(format!("Power-play points: {}", selected.power_play_points)));
    lines.push(Line::from(""));
    match leagues.members.get(&selected.league_name) {
        Some(Query::Ready(members)) => {
            lines.push(Line::from(format!("{} member(s)", members.len())));
            lines.extend(members.iter().map(|m| Line::from(format!("  {}", m.user_id))));
        }
        Some(Query::Failed(err)) => lines.push(Line::from(Span::styled(
            format!("Members failed to load: {err}"),
            Style::default().fg(Color::Red),
        ))),
        _ => lines.push(Line::from("Loading members...")),
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

fn draw_predictions(f: &mut Frame, area: Rect, app: &mut App) {
    let now = app.state.now;
    let Some(active) = app.state.predictions.active.ready() else {
        let msg = match &app.state.predictions.active {
            Query::Idle => "Pick a league on the Leagues tab and press Enter".to_string(),
            other => query_message(other, "league").unwrap_or_default(),
        };
        draw_placeholder(f, area, &msg);
        return;
    };

    let block = default_border(Color::White).title(format!(
        " {} / {} ",
        active.league.tournament, active.league.league_name
    ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let editor = &active.editor;
    let [status_area, list_area, detail_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(5),
    ])
    .areas(inner);

    f.render_widget(
        StatusBar {
            ledger: editor.ledger(),
            wallet: editor.wallet(),
            now,
            dirty: editor.is_dirty(),
        },
        status_area,
    );

    if editor.is_empty() {
        draw_message(f, list_area, "No matches scheduled yet");
        return;
    }

    let selected = app.state.predictions.selected;
    let rows = list_area.height.max(1) as usize;
    let offset = visible_offset(app.state.predictions.scroll_offset as usize, selected, rows);

    let lines: Vec<Line> = editor
        .user_matches()
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(i, um)| {
            let prediction = editor.preview(i).unwrap_or_default();
            let slot = editor.state(i);
            match_line(i, um, &prediction, slot, i == selected, now)
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list_area);

    draw_match_detail(f, detail_area, selected, editor, now);

    if let Some(SlotState::UnlockPending(draft)) = editor.state(selected)
        && let Some(um) = editor.user_matches().get(selected)
    {
        f.render_widget(
            UnlockDialog {
                index: selected,
                game: &um.game,
                draft: &draft.prediction,
                quote: &draft.quote,
                points_left: editor.wallet().remaining,
            },
            list_area,
        );
    }

    app.state.predictions.scroll_offset = offset as u16;
}

/// First visible row that keeps `selected` on screen, moving as little as possible.
fn visible_offset(current: usize, selected: usize, rows: usize) -> usize {
    if selected < current {
        selected
    } else if selected >= current + rows {
        selected + 1 - rows
    } else {
        current
    }
}

fn match_line<'a>(
    index: usize,
    um: &UserMatch,
    prediction: &trufan_api::Prediction,
    slot: Option<&SlotState>,
    selected: bool,
    now: DateTime<Utc>,
) -> Line<'a> {
    let marker = if selected { ">" } else { " " };
    let (_, status) = clock::status_of(&um.game, now);
    let game = &um.game;

    let slot_style = match slot {
        Some(SlotState::Editable) => Style::default().fg(Color::Green),
        Some(SlotState::UnlockPending(_)) => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::DarkGray),
    };
    let slot_label = match slot {
        Some(SlotState::Editable) => "open",
        Some(SlotState::UnlockPending(_)) => "unlocking",
        _ => "locked",
    };

    let team_style = |team: &str| {
        if !prediction.team.is_empty() && prediction.team == team {
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default()
        }
    };

    let outcome = if game.completed && !game.winner.is_empty() {
        if prediction.team == game.winner {
            Span::styled(" won", Style::default().fg(Color::Green))
        } else {
            Span::styled(" lost", Style::default().fg(Color::Red))
        }
    } else {
        Span::raw("")
    };

    let mut line = Line::from(vec![
        Span::raw(format!("{marker} #{:<3}", index + 1)),
        Span::styled(
            format!("{}  ", local_time(game.start)),
            Style::default().fg(Color::Gray),
        ),
        Span::styled(format!("{:>6}", game.left), team_style(&game.left)),
        Span::raw(" vs "),
        Span::styled(format!("{:<6}", game.right), team_style(&game.right)),
        Span::raw(format!(
            "  conf {:>3}  ",
            if prediction.confidence == 0 { "-".to_string() } else { prediction.confidence.to_string() }
        )),
        Span::styled(format!("{:<9}", slot_label), slot_style),
        Span::styled(format!(" {:<11}", status.label()), status_style(status)),
        outcome,
    ]);
    if selected {
        line = line.style(Style::default().bg(Color::Rgb(30, 30, 40)));
    }
    line
}

fn draw_match_detail(f: &mut Frame, area: Rect, index: usize, editor: &PredictionEditor, now: DateTime<Utc>) {
    let Some(um) = editor.user_matches().get(index) else {
        return;
    };
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Match #{} ", index + 1));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let game = &um.game;
    let (percent, status) = clock::status_of(game, now);
    let mut lines = vec![Line::from(format!(
        "{} vs {}   {} to {}   {} ({percent}%)",
        game.left,
        game.right,
        local_time(game.start),
        local_time(game.effective_end()),
        status.label()
    ))];

    let mom = if um.prediction.mom.is_empty() { "-" } else { um.prediction.mom.as_str() };
    lines.push(Line::from(format!("Your man of the match: {mom}")));

    if game.completed {
        lines.push(Line::from(format!(
            "Result: {} won, man of the match {}",
            if game.winner.is_empty() { "nobody" } else { game.winner.as_str() },
            if game.mom.is_empty() { "-" } else { game.mom.as_str() }
        )));
    } else {
        match editor.state(index) {
            Some(SlotState::Editable) => lines.push(Line::from(format!(
                "Locks at {}",
                local_time(clock::lock_threshold(game.start))
            ))),
            Some(SlotState::Locked) => {
                let text = match editor.quote(index, now) {
                    Ok(quote) if editor.wallet().can_unlock(quote.status, now) => {
                        let price = match quote.payment {
                            Some(Payment::FreeHit { .. }) => "a free hit".to_string(),
                            Some(Payment::Points(points)) => format!("{points} points"),
                            None => "-".to_string(),
                        };
                        format!("Locked. Press e to unlock for {price}.")
                    }
                    _ => "Locked.".to_string(),
                };
                lines.push(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray))));
            }
            _ => {}
        }
    }
    f.render_widget(Paragraph::new(lines), inner);
}

fn status_style(status: MatchStatus) -> Style {
    match status {
        MatchStatus::NotStarted => Style::default().fg(Color::White),
        MatchStatus::Completed => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::LightRed),
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

fn draw_leaderboard(f: &mut Frame, area: Rect, app: &App) {
    let board = &app.state.leaderboard;
    let block = default_border(Color::White).title(format!(
        " {} leaderboard {} ",
        board.board.label(),
        board.league_name
    ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(msg) = query_message(&board.scores, "scores") {
        draw_message(f, inner, &msg);
        return;
    }
    let rows = board.page_rows();
    if rows.is_empty() {
        draw_message(f, inner, "No scores yet");
        return;
    }

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Page {}/{}   Tab switches board, h/l pages", board.page + 1, board.page_count()),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
    ];
    let header = match board.board {
        Board::Survivor => format!("{:<6}{:<24}{:>8}  {}", "Rank", "Player", "Strikes", "Lost matches"),
        Board::Confidence => format!("{:<6}{:<24}{:>8}{:>12}", "Rank", "Player", "Score", "Remaining"),
    };
    lines.push(Line::from(Span::styled(header, Style::default().add_modifier(Modifier::BOLD))));

    for (_, record) in rows {
        let name = if record.username.is_empty() { &record.user_id } else { &record.username };
        let text = match board.board {
            Board::Survivor => format!(
                "{:<6}{:<24}{:>8}  {}",
                record.survivor_rank,
                name,
                record.strikes,
                record
                    .lost_matches
                    .iter()
                    .map(|i| format!("#{}", i + 1))
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            Board::Confidence => format!(
                "{:<6}{:<24}{:>8}{:>12}",
                record.confidence_rank, name, record.confidence_score, record.remaining_points
            ),
        };
        let style = if record.user_id == app.settings.user {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(text, style)));
    }
    f.render_widget(Paragraph::new(lines), inner);
}

// ---------------------------------------------------------------------------
// Schedule editor
// ---------------------------------------------------------------------------

fn draw_schedule(f: &mut Frame, area: Rect, app: &App) {
    let editor = &app.state.schedule_editor;
    let dirty = if editor.dirty { " [unsaved]" } else { "" };
    let block = default_border(Color::White).title(format!(" Schedule {}{dirty} ", editor.tournament));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if editor.matches.is_empty() {
        draw_message(f, inner, "Open a league to edit its tournament schedule");
        return;
    }

    let [list_area, field_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(7)]).areas(inner);

    let rows = list_area.height.max(1) as usize;
    let offset = visible_offset(0, editor.selected, rows);
    let lines: Vec<Line> = editor
        .matches
        .iter()
        .enumerate()
        .skip(offset)
        .take(rows)
        .map(|(i, m)| {
            let marker = if i == editor.selected { ">" } else { " " };
            let result = if m.completed {
                format!("{} won, {}", m.winner, m.mom)
            } else {
                "pending".to_string()
            };
            Line::from(format!(
                "{marker} #{:<3}{}  {:>6} vs {:<6}  {result}",
                i + 1,
                local_time(m.start),
                m.left,
                m.right
            ))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), list_area);

    let Some(m) = editor.selected_match() else {
        return;
    };
    let value = |field: Field| -> String {
        match field {
            Field::Start => local_time(m.start),
            Field::End => m.end.map(local_time).unwrap_or_else(|| "-".to_string()),
            Field::Winner => if m.winner.is_empty() { "-".to_string() } else { m.winner.clone() },
            Field::ManOfMatch => if m.mom.is_empty() { "-".to_string() } else { m.mom.clone() },
            Field::Finished => if m.completed { "yes".to_string() } else { "no".to_string() },
        }
    };
    let fields = [Field::Start, Field::End, Field::Winner, Field::ManOfMatch, Field::Finished];
    let lines: Vec<Line> = fields
        .into_iter()
        .map(|field| {
            let focused = field == editor.field;
            let style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{} {:<18}", if focused { ">" } else { " " }, field.label()), style),
                Span::raw(value(field)),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::TOP).title(format!(" Match #{} ", editor.selected + 1))),
        field_area,
    );
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%a %d %b %H:%M").to_string()
}

/// Text to show instead of content while a query is not ready.
fn query_message<T>(query: &Query<T>, what: &str) -> Option<String> {
    match query {
        Query::Ready(_) => None,
        Query::Failed(err) => Some(format!("Failed to load {what}:\n{err}")),
        Query::Idle | Query::Loading => Some(format!("Loading {what}...")),
    }
}

fn draw_message(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg.to_owned())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    let block = default_border(Color::DarkGray);
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(
        Paragraph::new(msg.to_owned()).style(Style::default().fg(Color::Gray)),
        inner,
    );
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let line = match &app.state.notification {
        Some(n) if n.is_error => Line::from(Span::styled(n.message.clone(), Style::default().fg(Color::Red))),
        Some(n) => Line::from(Span::styled(n.message.clone(), Style::default().fg(Color::Green))),
        None => Line::from(Span::styled(
            format!("signed in as {}   ? for help", app.settings.user),
            Style::default().fg(Color::DarkGray),
        )),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::White))
        .style_debug(Style::default().fg(Color::Gray))
        .output_separator(' ');
    f.render_widget(logs, area);
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_follows_selection() {
        assert_eq!(visible_offset(0, 3, 10), 0);
        assert_eq!(visible_offset(0, 12, 10), 3);
        assert_eq!(visible_offset(5, 2, 10), 2);
        assert_eq!(visible_offset(3, 8, 10), 3);
    }

    #[test]
    fn query_messages() {
        assert_eq!(query_message(&Query::<u8>::Ready(1), "x"), None);
        assert_eq!(query_message(&Query::<u8>::Loading, "scores").as_deref(), Some("Loading scores..."));
        assert!(
            query_message(&Query::<u8>::Failed("HTTP 500".into()), "scores")
                .is_some_and(|m| m.contains("HTTP 500"))
        );
    }
}
