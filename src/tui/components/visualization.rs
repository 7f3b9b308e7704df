//! # VisualizationCard Component
//!
//! Shows an assistant-built query. Charts don't fit in a terminal, so the
//! card shows what the query asks for instead:
//!
//! **Collapsed**:
//!   `╭─ ◆ Trends ───────────────────────────────╮`
//!   `│ dau of $pageview · by $browser           │`
//!   `│ ▸ [s] show definition   [o] open as new… │`
//!   `╰──────────────────────────────────────────╯`
//!
//! **Expanded** adds the series, filter, and breakdown sections. SQL queries
//! show their (highlighted) SQL instead, capped at MAX_SQL_LINES until expanded.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::thread::QueryDescriptor;
use crate::thread::query::QuerySource;
use crate::tui::components::message::{HORIZONTAL_OVERHEAD, VERTICAL_OVERHEAD};
use crate::tui::markdown;

const CONTENT_PAD_H: u16 = 1;
/// SQL lines shown while the definition is collapsed.
const MAX_SQL_LINES: usize = 6;

// ─── Styles ──────────────────────────────────────────────────────────

const fn card_style() -> Style {
    Style::new().fg(Color::Magenta)
}
const fn label_style() -> Style {
    Style::new().fg(Color::White).add_modifier(Modifier::BOLD)
}
const fn value_style() -> Style {
    Style::new().fg(Color::White)
}
const fn hint_style() -> Style {
    Style::new().fg(Color::DarkGray)
}
const fn overflow_style() -> Style {
    Style::new()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM)
}

// ─── VisualizationCard ───────────────────────────────────────────────

pub struct VisualizationCard<'a> {
    pub query: &'a QueryDescriptor,
    pub is_selected: bool,
    pub summary_expanded: bool,
}

impl<'a> VisualizationCard<'a> {
    pub fn new(query: &'a QueryDescriptor, is_selected: bool, summary_expanded: bool) -> Self {
        Self {
            query,
            is_selected,
            summary_expanded,
        }
    }

    /// Rows needed at `width`, borders included.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let lines = self.paragraph(content_width).line_count(content_width) as u16;
        lines.max(1) + VERTICAL_OVERHEAD
    }

    fn paragraph(&self, width: u16) -> Paragraph<'static> {
        Paragraph::new(self.lines(width as usize)).wrap(Wrap { trim: false })
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let source = self.query.source();
        let mut lines = Vec::new();

        match source.sql() {
            Some(sql) if source.is_hogql() => {
                let limit = if self.summary_expanded {
                    usize::MAX
                } else {
                    MAX_SQL_LINES
                };
                lines.extend(sql_lines(sql, limit));
            }
            _ => lines.push(overview_line(source, width)),
        }

        lines.push(self.controls_line(width));

        if self.summary_expanded && !source.is_hogql() {
            lines.extend(summary_lines(source));
        }
        lines
    }

    fn controls_line(&self, width: usize) -> Line<'static> {
        let (arrow, toggle) = if self.summary_expanded {
            ("▾", "hide definition")
        } else {
            ("▸", "show definition")
        };
        let left = format!("{arrow} [s] {toggle}");
        let right = "[o] open as new insight";
        let gap = width.saturating_sub(left.width() + right.width());
        if gap == 0 {
            return Line::from(Span::styled(truncate_to(&left, width), hint_style()));
        }
        Line::from(vec![
            Span::styled(left, hint_style()),
            Span::raw(" ".repeat(gap)),
            Span::styled(right, hint_style()),
        ])
    }
}

impl Widget for VisualizationCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }
        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            card_style().add_modifier(Modifier::DIM)
        };
        let block = Block::bordered()
            .title(format!("◆ {}", self.query.heading()))
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner = block.inner(area);
        block.render(area, buf);
        if inner.width == 0 || inner.height == 0 {
            return;
        }
        self.paragraph(inner.width).render(inner, buf);
    }
}

// ─── Content helpers ─────────────────────────────────────────────────

/// One-line gist: series, then breakdown, truncated to `width`.
fn overview_line(source: &QuerySource, width: usize) -> Line<'static> {
    let mut parts = source.series_labels();
    if parts.is_empty() {
        parts.push(source.kind.heading().to_string());
    }
    let mut gist = join_with_ellipsis(&parts, width);
    if let Some(breakdown) = source.breakdown() {
        let suffix = format!(" · by {breakdown}");
        if gist.width() + suffix.width() <= width {
            gist.push_str(&suffix);
        }
    }
    Line::from(Span::styled(gist, value_style()))
}

fn summary_lines(source: &QuerySource) -> Vec<Line<'static>> {
    let mut lines = vec![Line::default(), Line::from(Span::styled("Series", label_style()))];
    let series = source.series_labels();
    if series.is_empty() {
        lines.push(Line::from(Span::styled("  None", overflow_style())));
    }
    for (i, label) in series.into_iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}. ", i + 1), hint_style()),
            Span::styled(label, value_style()),
        ]));
    }

    lines.push(Line::from(Span::styled("Filters", label_style())));
    let filters = source.property_filters();
    if filters.is_empty() {
        lines.push(Line::from(Span::styled("  None", overflow_style())));
    }
    lines.extend(
        filters
            .into_iter()
            .map(|f| Line::from(Span::styled(format!("  {f}"), value_style()))),
    );

    lines.push(Line::from(Span::styled("Breakdown", label_style())));
    lines.push(match source.breakdown() {
        Some(b) => Line::from(Span::styled(format!("  {b}"), value_style())),
        None => Line::from(Span::styled("  None", overflow_style())),
    });
    lines
}

fn sql_lines(sql: &str, limit: usize) -> Vec<Line<'static>> {
    let sql = sql.trim();
    if sql.is_empty() {
        return vec![Line::from(Span::styled("(empty query)", overflow_style()))];
    }
    let mut lines = markdown::highlight(sql, "sql", value_style());
    let total = lines.len();
    if total > limit {
        let take = limit.saturating_sub(1);
        lines.truncate(take);
        lines.push(Line::from(Span::styled(
            format!("… +{} lines", total - take),
            overflow_style(),
        )));
    }
    lines
}

/// Join parts with `, `, ending in `…` once the next part would not fit.
fn join_with_ellipsis(parts: &[String], budget: usize) -> String {
    let mut result = String::new();
    let total = parts.len();

    for (i, part) in parts.iter().enumerate() {
        let sep = if i > 0 { ", " } else { "" };
        let remaining = total - i - 1;
        let candidate = result.width() + sep.width() + part.width();
        let ellipsis = if remaining > 0 { ", …".width() } else { 0 };

        if candidate + ellipsis > budget && i > 0 {
            result.push_str(", …");
            return result;
        }
        result.push_str(sep);
        result.push_str(part);
    }

    if result.width() > budget {
        return truncate_to(&result, budget);
    }
    result
}

/// Truncate to `budget` display columns, appending `…` if cut.
fn truncate_to(s: &str, budget: usize) -> String {
    if s.width() <= budget {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
