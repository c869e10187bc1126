use chrono::Local;
use tui::buffer::Buffer;
use tui::layout::{Constraint, Flex, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap};
use trufan_api::{Match, Prediction};

use crate::engine::wallet::{Payment, UnlockQuote};

const WIDTH: u16 = 64;
const HEIGHT: u16 = 11;

/// Confirmation overlay for buying back a locked prediction.
pub struct UnlockDialog<'a> {
    pub index: usize,
    pub game: &'a Match,
    pub draft: &'a Prediction,
    pub quote: &'a UnlockQuote,
    pub points_left: i64,
}

impl UnlockDialog<'_> {
    fn price_line(&self) -> Line<'static> {
        let note = self.quote.status.progress_note();
        match (self.quote.payment, self.quote.cost) {
            (Some(Payment::FreeHit { match_index }), _) => Line::from(format!(
                "{note} this unlock uses the free hit earned on match #{}.",
                match_index + 1
            )),
            (Some(Payment::Points(cost)), _) => Line::from(format!(
                "{note} unlocking costs {cost} of your {} power-play points.",
                self.points_left
            )),
            (None, Some(cost)) => Line::from(Span::styled(
                format!("{note} unlocking needs {cost} points; you have {}.", self.points_left),
                Style::default().fg(Color::Red),
            )),
            (None, None) => Line::from(Span::styled(
                format!("{note} it can no longer be unlocked."),
                Style::default().fg(Color::Red),
            )),
        }
    }
}

impl Widget for UnlockDialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [row] = Layout::vertical([Constraint::Length(HEIGHT)]).flex(Flex::Center).areas(area);
        let [dialog] = Layout::horizontal([Constraint::Length(WIDTH)]).flex(Flex::Center).areas(row);

        Clear.render(dialog, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(Color::Yellow))
            .title(format!(" Unlock match #{} ", self.index + 1));
        let inner = block.inner(dialog);
        block.render(dialog, buf);

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let pick = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
        let mut lines = vec![
            Line::from(vec![
                Span::styled(format!("{} vs {}", self.game.left, self.game.right), bold),
                Span::raw(format!(
                    "  {}",
                    self.game.start.with_timezone(&Local).format("%a %d %b %H:%M")
                )),
            ]),
            self.price_line(),
            Line::from(""),
            Line::from(format!(
                "New pick: {}   confidence: {}   man of the match: {}",
                pick(&self.draft.team),
                self.draft.confidence,
                pick(&self.draft.mom)
            )),
        ];
        if self.quote.free_hits_available > 0
            && let Some(expiry) = self.quote.next_expiry
        {
            lines.push(Line::from(Span::styled(
                format!(
                    "{} free hit(s), next expires {}",
                    self.quote.free_hits_available,
                    expiry.with_timezone(&Local).format("%d %b %H:%M")
                ),
                Style::default().fg(Color::Gray),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "a/d team  +/- c confidence  m man of the match  y confirm  Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        Paragraph::new(lines).wrap(Wrap { trim: true }).render(inner, buf);
    }
}
