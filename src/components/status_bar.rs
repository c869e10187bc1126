use chrono::{DateTime, Utc};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::Widget;

use crate::engine::ledger::ConfidenceLedger;
use crate::engine::wallet::PowerPlayWallet;

/// One-line summary above the match list: confidence weights left, the
/// power-play wallet and whether there is anything to save.
pub struct StatusBar<'a> {
    pub ledger: &'a ConfidenceLedger,
    pub wallet: &'a PowerPlayWallet,
    pub now: DateTime<Utc>,
    pub dirty: bool,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let mut spans = vec![Span::styled("Confidence ", Style::default().fg(Color::Gray))];
        for entry in &self.ledger.scores {
            let color = if entry.remaining > 0 { Color::Green } else { Color::DarkGray };
            spans.push(Span::styled(
                format!("{}x{} ", entry.score, entry.remaining.max(0)),
                Style::default().fg(color),
            ));
        }

        spans.push(Span::styled(
            format!("({} left)", self.ledger.total_remaining()),
            Style::default().fg(Color::Gray),
        ));

        let free_hits = self.wallet.valid_free_hits(self.now).len();
        spans.push(Span::styled(" | Power play ", Style::default().fg(Color::Gray)));
        spans.push(Span::raw(format!("{}/{}", self.wallet.remaining, self.wallet.total)));
        spans.push(Span::styled(" | Free hits ", Style::default().fg(Color::Gray)));
        spans.push(Span::raw(free_hits.to_string()));

        if self.dirty {
            spans.push(Span::styled(
                "  [unsaved, s to save]",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ));
        }

        Line::from(spans).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures;
    use crate::engine::ledger::recompute;

    fn rendered(bar: StatusBar) -> String {
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);
        bar.render(area, &mut buf);
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn shows_weights_and_wallet() {
        let ledger = recompute(&fixtures::user_matches(10));
        let wallet = PowerPlayWallet::new(1000);
        let text = rendered(StatusBar { ledger: &ledger, wallet: &wallet, now: fixtures::kickoff(), dirty: false });
        assert!(text.starts_with("Confidence 20x2 40x2 60x2 80x2 100x2"));
        assert!(text.contains("Power play 1000/1000"));
        assert!(!text.contains("unsaved"));
    }

    #[test]
    fn flags_unsaved_changes() {
        let ledger = recompute(&fixtures::user_matches(5));
        let wallet = PowerPlayWallet::default();
        let text = rendered(StatusBar { ledger: &ledger, wallet: &wallet, now: fixtures::kickoff(), dirty: true });
        assert!(text.contains("[unsaved, s to save]"));
    }
}
