//! # TitleBar Component
//!
//! Top status bar: thread title, latest status, and the trace the ratings go
//! to. Purely presentational, all data arrives as props.
//!
//! ```text
//! threadview · Weekly signups | Rated: good answer | trace 3f2a…
//! ```
//!
//! A thread without a trace id shows `no trace` so it is obvious why rating
//! does nothing.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

/// Characters of the trace id shown before eliding.
const TRACE_PREFIX_CHARS: usize = 8;

pub struct TitleBar<'a> {
    pub title: &'a str,
    pub status_message: &'a str,
    pub trace_id: Option<&'a str>,
}

impl<'a> TitleBar<'a> {
    pub fn new(title: &'a str, status_message: &'a str, trace_id: Option<&'a str>) -> Self {
        Self {
            title,
            status_message,
            trace_id,
        }
    }

    fn trace_label(&self) -> String {
        match self.trace_id {
            Some(id) if id.chars().count() > TRACE_PREFIX_CHARS => {
                let short: String = id.chars().take(TRACE_PREFIX_CHARS).collect();
                format!("trace {short}…")
            }
            Some(id) => format!("trace {id}"),
            None => "no trace".to_string(),
        }
    }
}

impl Component for TitleBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let sep = Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let mut spans = vec![
            Span::styled("threadview", Style::default().fg(Color::Cyan)),
            Span::raw(" · "),
            Span::raw(self.title.to_string()),
        ];
        if !self.status_message.is_empty() {
            spans.push(sep.clone());
            spans.push(Span::raw(self.status_message.to_string()));
        }
        spans.push(sep);
        spans.push(Span::styled(
            self.trace_label(),
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Line::from(spans), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn draw(mut bar: TitleBar<'_>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal.draw(|f| bar.render(f, f.area())).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn shows_title_status_and_short_trace() {
        let text = draw(TitleBar::new(
            "Weekly signups",
            "Rated: good answer",
            Some("3f2a9c1d-0000-4000-8000-000000000000"),
        ));
        assert!(text.contains("threadview · Weekly signups"));
        assert!(text.contains("Rated: good answer"));
        assert!(text.contains("trace 3f2a9c1d…"));
    }

    #[test]
    fn missing_trace_is_called_out() {
        let text = draw(TitleBar::new("Untitled", "", None));
        assert!(text.contains("no trace"));
        // No empty status segment
        assert!(!text.contains("|  |"));
    }

    #[test]
    fn short_trace_is_shown_whole() {
        let text = draw(TitleBar::new("t", "", Some("abc")));
        assert!(text.contains("trace abc"));
        assert!(!text.contains('…'));
    }
}
