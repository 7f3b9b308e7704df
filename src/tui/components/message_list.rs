//! # MessageList Component
//!
//! Scrollable view of the rendered thread.
//!
//! ## Responsibilities
//!
//! - Lay out one card per view row (messages plus the retry notice)
//! - Manage scrolling and stick-to-bottom
//! - Cache row heights between frames
//! - Provide prefix heights for mouse hit testing
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the current rows (props).
//! Row heights only change when a row's content or its UI state changes, so
//! the parent calls [`MessageListState::invalidate_from`] after every update
//! and the cache recomputes from that row onward.

use std::collections::{HashMap, HashSet};

use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::thread::{Block, FeedbackMachine, MessageKey, Role, ViewRow};
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageCard;
use crate::tui::components::visualization::VisualizationCard;
use crate::tui::event::TuiEvent;

/// Layout and scroll state for the message list.
/// Must be persisted in the parent TuiState.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    pub layout: LayoutCache,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Selected row (hover or keyboard navigation)
    pub selected_index: Option<usize>,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
    /// Highlighted option of the form on screen
    pub form_cursor: usize,
    /// Earliest row whose cached height is stale
    stale_from: Option<usize>,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            layout: LayoutCache::new(),
            stick_to_bottom: true,
            selected_index: None,
            viewport_height: 0,
            form_cursor: 0,
            stale_from: None,
        }
    }

    /// Mark heights from `row` onward for recalculation.
    pub fn invalidate_from(&mut self, row: usize) {
        self.stale_from = Some(self.stale_from.map_or(row, |s| s.min(row)));
    }

    fn total_height(&self) -> u16 {
        self.layout.heights.iter().sum()
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Scroll the viewport so the selected row is fully visible.
    /// Rows taller than the viewport are aligned to their top edge.
    pub fn scroll_to_selected(&mut self) {
        let Some(idx) = self.selected_index else {
            return;
        };
        let Some(&item_bottom) = self.layout.prefix_heights.get(idx) else {
            return;
        };
        let item_top = idx
            .checked_sub(1)
            .and_then(|prev| self.layout.prefix_heights.get(prev).copied())
            .unwrap_or(0);
        let offset_y = self.scroll_state.offset().y;

        if item_top < offset_y {
            self.scroll_state.set_offset(Position { x: 0, y: item_top });
            self.stick_to_bottom = false;
        } else if item_bottom > offset_y + self.viewport_height {
            let new_y = item_bottom
                .saturating_sub(self.viewport_height)
                .min(item_top);
            self.scroll_state.set_offset(Position { x: 0, y: new_y });
            let max_y = self.total_height().saturating_sub(self.viewport_height);
            self.stick_to_bottom = new_y >= max_y;
        }
    }

    /// Re-engage auto-scroll once the user has scrolled to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.total_height().saturating_sub(self.viewport_height);
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Move the selection by one row, starting from the last row.
    pub fn select_previous(&mut self, row_count: usize) {
        if row_count == 0 {
            return;
        }
        let idx = self
            .selected_index
            .map(|i| i.saturating_sub(1))
            .unwrap_or(row_count - 1);
        self.selected_index = Some(idx.min(row_count - 1));
        self.scroll_to_selected();
    }

    pub fn select_next(&mut self, row_count: usize) {
        if let Some(idx) = self.selected_index
            && idx + 1 < row_count
        {
            self.selected_index = Some(idx + 1);
            self.scroll_to_selected();
        }
    }
}

/// Scrollable thread view component.
/// Created fresh each frame with references to state and data.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub rows: &'a [ViewRow<'a>],
    pub feedback: &'a HashMap<MessageKey, FeedbackMachine>,
    pub expanded_summaries: &'a HashSet<MessageKey>,
    pub spinner_frame: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        rows: &'a [ViewRow<'a>],
        feedback: &'a HashMap<MessageKey, FeedbackMachine>,
        expanded_summaries: &'a HashSet<MessageKey>,
        spinner_frame: usize,
    ) -> Self {
        Self {
            state,
            rows,
            feedback,
            expanded_summaries,
            spinner_frame,
        }
    }
}

/// What a row renders as. Both cards measure themselves.
enum RowCard<'a> {
    Message(MessageCard<'a>),
    Visualization(VisualizationCard<'a>),
}

impl RowCard<'_> {
    fn height(&self, width: u16) -> u16 {
        match self {
            RowCard::Message(card) => card.calculate_height(width),
            RowCard::Visualization(card) => card.calculate_height(width),
        }
    }
}

const NOTICE: &Block = &Block::RetryNotice;

fn row_card<'a>(
    row: &ViewRow<'a>,
    is_selected: bool,
    feedback: &HashMap<MessageKey, FeedbackMachine>,
    expanded: &HashSet<MessageKey>,
    spinner_frame: usize,
    form_cursor: usize,
) -> RowCard<'a> {
    match *row {
        ViewRow::Message { role, message, .. } => match &message.block {
            Block::Visualization { query } => RowCard::Visualization(VisualizationCard::new(
                query,
                is_selected,
                expanded.contains(&message.key),
            )),
            block => RowCard::Message(
                MessageCard::new(role, block, is_selected)
                    .with_feedback(feedback.get(&message.key).copied().unwrap_or_default())
                    .with_spinner_frame(spinner_frame)
                    .with_form_cursor(form_cursor),
            ),
        },
        ViewRow::Notice { .. } => {
            RowCard::Message(MessageCard::new(Role::Assistant, NOTICE, is_selected))
        }
    }
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.rows.is_empty() {
            let waiting = Paragraph::new("Waiting for messages…")
                .alignment(Alignment::Center)
                .style(
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                );
            let y = area.y + area.height / 2;
            frame.render_widget(waiting, Rect::new(area.x, y, area.width, 1.min(area.height)));
            self.state.layout = LayoutCache::new();
            return;
        }

        let content_width = area.width.saturating_sub(1); // -1 for scrollbar safe area
        let row_count = self.rows.len();

        // 1. Update layout cache
        let stale_from = self.state.stale_from.take();
        let layout = &mut self.state.layout;
        let reusable = layout.reusable_count(row_count, content_width, stale_from);
        layout.heights.truncate(reusable);
        for row in self.rows.iter().skip(layout.heights.len()) {
            let card = row_card(row, false, self.feedback, self.expanded_summaries, 0, 0);
            layout.heights.push(card.height(content_width));
        }
        layout.rebuild_prefix_heights();
        layout.update_metadata(row_count, content_width);

        let total_height = self.state.total_height();

        // 2. Clamp scroll offset to prevent overscrolling past content
        self.state.viewport_height = area.height;
        if let Some(selected) = self.state.selected_index
            && selected >= row_count
        {
            self.state.selected_index = Some(row_count - 1);
        }
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let scroll_offset = self.state.scroll_state.offset().y;
        let visible_range = self.state.layout.visible_range(scroll_offset, area.height);

        // 3. Render visible rows into a ScrollView
        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = visible_range
            .start
            .checked_sub(1)
            .map(|prev| self.state.layout.prefix_heights[prev])
            .unwrap_or(0);

        for i in visible_range {
            let height = self.state.layout.heights[i];
            let is_selected = self.state.selected_index == Some(i);
            let rect = Rect::new(0, y_offset, content_width, height);
            match row_card(
                &self.rows[i],
                is_selected,
                self.feedback,
                self.expanded_summaries,
                self.spinner_frame,
                self.state.form_cursor,
            ) {
                RowCard::Message(card) => scroll_view.render_widget(card, rect),
                RowCard::Visualization(card) => scroll_view.render_widget(card, rect),
            }
            y_offset += height;
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}

/// EventHandler lives on `MessageListState` because scroll position and the
/// stick-to-bottom flag must survive between frames.
impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.stick_to_bottom = false;
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollToBottom => {
                self.stick_to_bottom = true;
                self.scroll_state.scroll_to_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Cached row heights.
pub struct LayoutCache {
    pub heights: Vec<u16>,
    pub prefix_heights: Vec<u16>,
    row_count: usize,
    content_width: u16,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutCache {
    pub fn new() -> Self {
        Self {
            heights: Vec::new(),
            prefix_heights: Vec::new(),
            row_count: 0,
            content_width: 0,
        }
    }

    /// How many leading cached heights are still valid.
    pub fn reusable_count(
        &self,
        row_count: usize,
        content_width: u16,
        stale_from: Option<usize>,
    ) -> usize {
        if self.content_width != content_width || self.heights.is_empty() {
            return 0;
        }
        // Rows removed: the tail no longer lines up
        if row_count < self.row_count {
            return 0;
        }
        let valid = self.heights.len().min(row_count);
        match stale_from {
            Some(row) => valid.min(row),
            None => valid,
        }
    }

    pub fn update_metadata(&mut self, row_count: usize, content_width: u16) {
        self.row_count = row_count;
        self.content_width = content_width;
    }

    pub fn rebuild_prefix_heights(&mut self) {
        self.prefix_heights = self
            .heights
            .iter()
            .scan(0u16, |acc, &h| {
                *acc += h;
                Some(*acc)
            })
            .collect();
    }

    pub fn visible_range(&self, scroll_offset: u16, viewport_height: u16) -> std::ops::Range<usize> {
        let buffer = viewport_height / 2;
        let buffered_start = scroll_offset.saturating_sub(buffer);
        let buffered_end = scroll_offset
            .saturating_add(viewport_height)
            .saturating_add(buffer);

        let start = self
            .prefix_heights
            .partition_point(|&end| end <= buffered_start);
        let end = self
            .prefix_heights
            .partition_point(|&end| end < buffered_end)
            .saturating_add(1)
            .min(self.prefix_heights.len());

        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::{Message, RenderPolicy, ThreadProps, build_thread_view};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn reusable_count_rules() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![3; 5];
        cache.update_metadata(5, 80);

        assert_eq!(cache.reusable_count(5, 80, None), 5);
        // Appended rows keep the cached prefix
        assert_eq!(cache.reusable_count(7, 80, None), 5);
        // Width change invalidates everything
        assert_eq!(cache.reusable_count(5, 40, None), 0);
        // Rows removed (snapshot shrank)
        assert_eq!(cache.reusable_count(4, 80, None), 0);
        // Row 2 changed
        assert_eq!(cache.reusable_count(5, 80, Some(2)), 2);
    }

    #[test]
    fn invalidate_keeps_earliest_row() {
        let mut state = MessageListState::new();
        state.invalidate_from(4);
        state.invalidate_from(1);
        state.invalidate_from(3);
        assert_eq!(state.stale_from, Some(1));
    }

    #[test]
    fn visible_range_covers_viewport() {
        let mut cache = LayoutCache::new();
        cache.heights = vec![5; 20];
        cache.rebuild_prefix_heights();
        let range = cache.visible_range(50, 10);
        assert!(range.start <= 10 && range.end >= 12);
        assert!(range.end <= 20);
    }

    #[test]
    fn selection_moves_and_stops_at_edges() {
        let mut state = MessageListState::new();
        state.select_previous(3);
        assert_eq!(state.selected_index, Some(2));
        state.select_next(3);
        assert_eq!(state.selected_index, Some(2));
        state.select_previous(3);
        state.select_previous(3);
        state.select_previous(3);
        assert_eq!(state.selected_index, Some(0));
    }

    #[test]
    fn renders_rows_and_caches_heights() {
        let messages = vec![Message::human("hi"), Message::assistant("hello")];
        let policy = RenderPolicy::default();
        let view = build_thread_view(ThreadProps {
            messages: &messages,
            trace_id: Some("t"),
            policy: &policy,
        });
        let rows = view.rows();
        let feedback = HashMap::new();
        let expanded = HashSet::new();
        let mut state = MessageListState::new();

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal
            .draw(|f| {
                MessageList::new(&mut state, &rows, &feedback, &expanded, 0).render(f, f.area())
            })
            .unwrap();

        assert_eq!(state.layout.heights.len(), 2);
        // "hi": 1 line + borders
        assert_eq!(state.layout.heights[0], 3);
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("you"));
        assert!(text.contains("hello"));
        assert!(text.contains("good answer"));
    }

    #[test]
    fn empty_thread_shows_waiting() {
        let mut state = MessageListState::new();
        let feedback = HashMap::new();
        let expanded = HashSet::new();
        let mut terminal = Terminal::new(TestBackend::new(40, 5)).unwrap();
        terminal
            .draw(|f| MessageList::new(&mut state, &[], &feedback, &expanded, 0).render(f, f.area()))
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Waiting for messages"));
    }
}
