use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::core::state::App;
use crate::thread::ViewRow;
use crate::tui::component::Component;
use crate::tui::components::{MessageList, TitleBar};
use crate::tui::{InputMode, TuiState};

const KEY_HINTS: &[(&str, &str)] = &[
    ("↑↓", "select"),
    ("+/-", "rate"),
    ("r", "retry"),
    ("1-9", "option"),
    ("s", "details"),
    ("o", "open"),
    ("x", "dismiss"),
    ("q", "quit"),
];

/// Height of the bottom area: key hints, or the feedback box while typing.
pub fn footer_height(tui: &TuiState, width: u16) -> u16 {
    match &tui.input_mode {
        InputMode::Browse => 1,
        InputMode::Feedback { .. } => tui.feedback_input.calculate_height(width),
    }
}

fn split(area: Rect, footer: u16) -> [Rect; 3] {
    use Constraint::{Length, Min};
    Layout::vertical([Length(1), Min(0), Length(footer)]).areas(area)
}

pub fn draw_ui(frame: &mut Frame, app: &App, rows: &[ViewRow<'_>], tui: &mut TuiState, spinner_frame: usize) {
    let footer = footer_height(tui, frame.area().width);
    let [title_area, main_area, footer_area] = split(frame.area(), footer);

    TitleBar::new(&app.title, &app.status_message, app.trace_id.as_deref())
        .render(frame, title_area);

    MessageList::new(
        &mut tui.message_list,
        rows,
        &app.feedback,
        &app.expanded_summaries,
        spinner_frame,
    )
    .render(frame, main_area);

    match tui.input_mode {
        InputMode::Browse => frame.render_widget(key_hints(), footer_area),
        InputMode::Feedback { .. } => tui.feedback_input.render(frame, footer_area),
    }
}

fn key_hints() -> Line<'static> {
    let mut spans = Vec::new();
    for (i, (key, label)) in KEY_HINTS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(*key, Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(
            format!(" {label}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

/// Hit test: which row (if any) is drawn at screen row `screen_y`.
pub fn hit_test_message(
    screen_y: u16,
    frame_area: Rect,
    scroll_offset_y: u16,
    prefix_heights: &[u16],
    footer_height: u16,
) -> Option<usize> {
    let [_title_area, main_area, _footer_area] = split(frame_area, footer_height);

    if screen_y < main_area.y || screen_y >= main_area.y + main_area.height {
        return None;
    }

    let content_y = (screen_y - main_area.y) + scroll_offset_y;
    let index = prefix_heights.partition_point(|&end| end <= content_y);
    (index < prefix_heights.len()).then_some(index)
}
