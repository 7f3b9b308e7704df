//! # FeedbackInput Component
//!
//! Text box shown under the thread while a bad rating waits for feedback.
//! Typing appends, Backspace deletes, Enter submits, Esc dismisses.
//!
//! The buffer is internal state. Which answer the feedback belongs to is
//! tracked by the parent (`InputMode::Feedback { key }`).

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Borders (2).
const HORIZONTAL_OVERHEAD: u16 = 2;
const VERTICAL_OVERHEAD: u16 = 2;
/// Wrapped lines shown before older ones scroll out of view.
const MAX_VISIBLE_LINES: u16 = 3;

pub const PLACEHOLDER: &str = "Help us improve the assistant…";

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackInputEvent {
    Submit(String),
    Dismiss,
    ContentChanged,
}

#[derive(Debug, Default)]
pub struct FeedbackInput {
    pub buffer: String,
}

impl FeedbackInput {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrap(&self, width: u16) -> Vec<String> {
        let inner = width.saturating_sub(HORIZONTAL_OVERHEAD) as usize;
        if inner == 0 || self.buffer.is_empty() {
            return vec![String::new()];
        }
        // Ratatui-compatible wrapping: break long words, split on ASCII spaces
        let options = textwrap::Options::new(inner)
            .break_words(true)
            .word_separator(textwrap::WordSeparator::AsciiSpace);
        textwrap::wrap(&self.buffer, options)
            .into_iter()
            .map(|l| l.into_owned())
            .collect()
    }

    /// Height for the current buffer, between 1 and MAX_VISIBLE_LINES rows
    /// of text plus borders.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let lines = self.wrap(width).len() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }
}

impl Component for FeedbackInput {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .title("Feedback (Enter to send, Esc to dismiss)")
            .border_style(Style::default().fg(Color::Yellow));

        let lines = self.wrap(area.width);
        // Keep the tail (where the cursor is) in view
        let skip = lines.len().saturating_sub(MAX_VISIBLE_LINES as usize);
        let visible = &lines[skip..];

        let paragraph = if self.buffer.is_empty() {
            Paragraph::new(PLACEHOLDER).style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
        } else {
            Paragraph::new(visible.join("\n")).style(Style::default().fg(Color::White))
        };
        frame.render_widget(paragraph.block(block), area);

        let last = visible.last().map(String::as_str).unwrap_or("");
        let max_x = area.x + area.width.saturating_sub(2);
        let cursor_x = (area.x + 1 + last.width() as u16).min(max_x);
        let cursor_y = area.y + visible.len().max(1) as u16;
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

impl EventHandler for FeedbackInput {
    type Event = FeedbackInputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.push(*c);
                Some(FeedbackInputEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                // Single-line input
                self.buffer.push_str(&text.replace(['\r', '\n'], " "));
                Some(FeedbackInputEvent::ContentChanged)
            }
            TuiEvent::Backspace => self
                .buffer
                .pop()
                .map(|_| FeedbackInputEvent::ContentChanged),
            TuiEvent::Submit => Some(FeedbackInputEvent::Submit(self.buffer.clone())),
            TuiEvent::Escape => Some(FeedbackInputEvent::Dismiss),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn type_str(input: &mut FeedbackInput, s: &str) {
        for c in s.chars() {
            input.handle_event(&TuiEvent::InputChar(c));
        }
    }

    #[test]
    fn typing_and_backspace() {
        let mut input = FeedbackInput::new();
        type_str(&mut input, "wrong");
        assert_eq!(input.buffer, "wrong");
        assert_eq!(
            input.handle_event(&TuiEvent::Backspace),
            Some(FeedbackInputEvent::ContentChanged)
        );
        assert_eq!(input.buffer, "wron");

        let mut empty = FeedbackInput::new();
        assert_eq!(empty.handle_event(&TuiEvent::Backspace), None);
    }

    #[test]
    fn submit_and_dismiss() {
        let mut input = FeedbackInput::new();
        type_str(&mut input, "Wrong numbers");
        assert_eq!(
            input.handle_event(&TuiEvent::Submit),
            Some(FeedbackInputEvent::Submit("Wrong numbers".into()))
        );
        assert_eq!(
            input.handle_event(&TuiEvent::Escape),
            Some(FeedbackInputEvent::Dismiss)
        );
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut input = FeedbackInput::new();
        input.handle_event(&TuiEvent::Paste("line one\nline two".into()));
        assert_eq!(input.buffer, "line one line two");
    }

    #[test]
    fn height_grows_then_caps() {
        let mut input = FeedbackInput::new();
        assert_eq!(input.calculate_height(20), 1 + VERTICAL_OVERHEAD);
        // inner width 8: "aaaa bbbb" wraps onto two lines
        type_str(&mut input, "aaaa bbbb");
        assert_eq!(input.calculate_height(10), 2 + VERTICAL_OVERHEAD);
        type_str(&mut input, " cccc dddd eeee");
        assert_eq!(
            input.calculate_height(10),
            MAX_VISIBLE_LINES + VERTICAL_OVERHEAD
        );
    }

    #[test]
    fn empty_input_shows_placeholder() {
        let mut terminal = Terminal::new(TestBackend::new(50, 3)).unwrap();
        let mut input = FeedbackInput::new();
        terminal.draw(|f| input.render(f, f.area())).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Help us improve"));
        assert!(text.contains("Feedback"));
    }
}
