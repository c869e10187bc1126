use tui::buffer::Buffer;
use tui::layout::{Constraint, Flex, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget};

use crate::state::league_forms::{CreateField, CreateLeagueForm, LeagueForm, MembersForm};

const WIDTH: u16 = 60;
const CREATE_HEIGHT: u16 = 9;
const MEMBERS_MIN_HEIGHT: u16 = 8;

/// Overlay for the Leagues tab forms.
pub struct LeagueDialog<'a> {
    pub form: &'a LeagueForm,
}

fn create_lines(form: &CreateLeagueForm) -> Vec<Line<'static>> {
    let field = |which: CreateField, value: &str| {
        let active = form.field == which;
        let style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if active { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{:<12} ", which.label()), style),
            Span::raw(format!("{value}{cursor}")),
        ])
    };
    vec![
        field(CreateField::Name, &form.name),
        field(CreateField::Description, &form.description),
        field(CreateField::Tournament, &form.tournament),
        Line::from(""),
        Line::from(Span::styled(
            "Tab next field   Enter create   Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn members_lines(form: &MembersForm) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = form
        .members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let marker = if i == form.selected { ">" } else { " " };
            let admin = if i == 0 { "  (admin)" } else { "" };
            Line::from(format!("{marker} {member}{admin}"))
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Invite: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{}_", form.input)),
    ]));
    lines.push(Line::from(Span::styled(
        "Enter add, or save when empty   Del remove   Esc cancel",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}

impl Widget for LeagueDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, lines, height) = match self.form {
            LeagueForm::Create(form) => (" New league ".to_string(), create_lines(form), CREATE_HEIGHT),
            LeagueForm::Members(form) => {
                let lines = members_lines(form);
                let height = (lines.len() as u16 + 2).max(MEMBERS_MIN_HEIGHT);
                (format!(" Members of {} ", form.league.league_name), lines, height)
            }
        };

        let [row] = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center).areas(area);
        let [dialog] = Layout::horizontal([Constraint::Length(WIDTH)]).flex(Flex::Center).areas(row);

        Clear.render(dialog, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title);
        let inner = block.inner(dialog);
        block.render(dialog, buf);
        Paragraph::new(lines).render(inner, buf);
    }
}
