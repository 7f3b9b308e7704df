//! # MessageCard Component
//!
//! Renders one text, reasoning, or notice block as a rounded card:
//!
//! ```text
//! ╭assistant──────────────────────────╮
//! │ You had 1,204 signups last week.  │
//! │                                   │
//! │ [+] good answer  [-] bad answer   │
//! ╰───────────────────────────────────╯
//! ```
//!
//! Heights come from the same `Paragraph` that renders the card, so the
//! list's layout cache always agrees with what is drawn.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{self, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::thread::message::ButtonVariant;
use crate::thread::render::{FormButton, RETRY_NOTICE};
use crate::thread::{ActionSlot, Block, FeedbackMachine, FeedbackStatus, Rating, Role, Tone};
use crate::tui::markdown;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
pub const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
pub const VERTICAL_OVERHEAD: u16 = 2;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub const FEEDBACK_PROMPT: &str = "What disappointed you about the answer?";
pub const FEEDBACK_THANKS: &str = "Thank you for your feedback!";

fn role_style(role: Role) -> Style {
    match role {
        Role::Human => Style::default().fg(Color::Green),
        Role::Assistant => Style::default().fg(Color::Blue),
    }
}

fn tone_style(tone: Tone, role: Role) -> Style {
    match tone {
        Tone::Normal => role_style(role),
        Tone::Danger => Style::default().fg(Color::Red),
        Tone::Warning => Style::default().fg(Color::Yellow),
    }
}

fn hint_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn key_hint(key: &str, label: &str, style: Style) -> Vec<Span<'static>> {
    vec![
        Span::styled(format!("[{key}] "), hint_style()),
        Span::styled(label.to_string(), style),
    ]
}

fn button_style(variant: ButtonVariant) -> Style {
    match variant {
        ButtonVariant::Primary => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        ButtonVariant::Secondary => Style::default().fg(Color::White),
        ButtonVariant::Tertiary => Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    }
}

/// A transient, props-only card for a single rendered block.
#[derive(Clone, Copy)]
pub struct MessageCard<'a> {
    pub role: Role,
    pub block: &'a Block,
    pub is_selected: bool,
    /// Rating state for answers with success actions.
    pub feedback: FeedbackMachine,
    pub spinner_frame: usize,
    /// Highlighted form option, picked with Enter.
    pub form_cursor: usize,
}

impl<'a> MessageCard<'a> {
    pub fn new(role: Role, block: &'a Block, is_selected: bool) -> Self {
        Self {
            role,
            block,
            is_selected,
            feedback: FeedbackMachine::default(),
            spinner_frame: 0,
            form_cursor: 0,
        }
    }

    pub fn with_feedback(mut self, feedback: FeedbackMachine) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn with_spinner_frame(mut self, frame: usize) -> Self {
        self.spinner_frame = frame;
        self
    }

    pub fn with_form_cursor(mut self, cursor: usize) -> Self {
        self.form_cursor = cursor;
        self
    }

    fn title(&self) -> &'static str {
        match self.block {
            Block::Reasoning { .. } => "thinking",
            Block::RetryNotice => "notice",
            _ => self.role.label(),
        }
    }

    fn base_style(&self) -> Style {
        match self.block {
            Block::Reasoning { .. } => Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            block => tone_style(block.tone(), self.role),
        }
    }

    fn body(&self) -> Vec<Line<'static>> {
        let style = self.base_style();
        match self.block {
            Block::Text { content, action, .. } => {
                let mut lines = markdown::render(content, style).lines;
                if let Some(action) = action {
                    lines.push(Line::default());
                    lines.extend(self.action_lines(action));
                }
                lines
            }
            Block::Reasoning { headline, substeps } => {
                let spinner = SPINNER[self.spinner_frame % SPINNER.len()];
                let mut lines = vec![Line::from(vec![
                    Span::styled(format!("{spinner} "), Style::default().fg(Color::Cyan)),
                    Span::styled(headline.clone(), style.add_modifier(Modifier::BOLD)),
                ])];
                lines.extend(
                    substeps
                        .iter()
                        .map(|step| Line::from(Span::styled(format!("  · {step}"), style))),
                );
                lines
            }
            Block::RetryNotice => markdown::render(RETRY_NOTICE, style).lines,
            // Drawn by VisualizationCard
            Block::Visualization { .. } => Vec::new(),
        }
    }

    fn action_lines(&self, action: &ActionSlot) -> Vec<Line<'static>> {
        match action {
            ActionSlot::Retry => vec![Line::from(key_hint(
                "r",
                "↻ Try again",
                Style::default().fg(Color::White),
            ))],
            ActionSlot::Form(buttons) => vec![form_line(buttons, self.form_cursor)],
            ActionSlot::Success { retriable } => {
                let mut lines = vec![self.rating_line(*retriable)];
                lines.extend(self.feedback_lines());
                lines
            }
        }
    }

    fn rating_line(&self, retriable: bool) -> Line<'static> {
        let chosen = self.feedback.rating();
        let mut spans = Vec::new();
        for rating in self.feedback.visible_ratings() {
            if !spans.is_empty() {
                spans.push(Span::raw("  "));
            }
            let (key, label, color) = match rating {
                Rating::Good => ("+", "good answer", Color::Green),
                Rating::Bad => ("-", "bad answer", Color::Red),
            };
            if chosen == Some(*rating) {
                spans.push(Span::styled(
                    format!("● {label}"),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ));
            } else {
                spans.extend(key_hint(key, label, Style::default().fg(Color::White)));
            }
        }
        if retriable {
            spans.push(Span::raw("  "));
            spans.extend(key_hint("r", "↻ try again", Style::default().fg(Color::White)));
        }
        Line::from(spans)
    }

    fn feedback_lines(&self) -> Vec<Line<'static>> {
        let heading = match self.feedback.status() {
            FeedbackStatus::Hidden => return Vec::new(),
            FeedbackStatus::Pending => FEEDBACK_PROMPT,
            FeedbackStatus::Submitted => FEEDBACK_THANKS,
        };
        let mut spans = vec![
            Span::styled(heading, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
        ];
        spans.extend(key_hint("x", "dismiss", hint_style()));
        vec![Line::default(), Line::from(spans)]
    }

    fn paragraph(&self) -> Paragraph<'static> {
        Paragraph::new(self.body())
            .style(self.base_style())
            .wrap(Wrap { trim: false })
    }

    /// Rows needed at `width`, borders included.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = self.paragraph().line_count(content_width) as u16;
        lines.max(1) + VERTICAL_OVERHEAD
    }
}

/// Options with a digit key.
const NUMBERED_OPTIONS: usize = 9;

fn form_line(buttons: &[FormButton], cursor: usize) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, button) in buttons.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let key = if i < NUMBERED_OPTIONS {
            format!("{}", i + 1)
        } else if i == cursor {
            "↵".to_string()
        } else {
            "·".to_string()
        };
        let mut style = button_style(button.variant);
        if i == cursor {
            style = style.add_modifier(Modifier::REVERSED);
        }
        spans.extend(key_hint(&key, &button.value, style));
    }
    if buttons.len() > NUMBERED_OPTIONS {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("←/→ then Enter for the rest", hint_style()));
    }
    Line::from(spans)
}

impl Widget for MessageCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let style = self.base_style();
        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            style.add_modifier(Modifier::DIM)
        };

        let frame = widgets::Block::bordered()
            .title(self.title())
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner = frame.inner(area);
        frame.render(area, buf);
        self.paragraph().render(inner, buf);
    }
}
