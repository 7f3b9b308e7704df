//! Markdown → ratatui `Text`.
//!
//! Message content is markdown. We walk `pulldown_cmark` events and emit
//! styled lines: headings, emphasis, inline code, lists, blockquotes, links,
//! and fenced code blocks highlighted with syntect. Tables, images and HTML
//! are dropped.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME: LazyLock<Theme> = LazyLock::new(|| {
    let mut themes = ThemeSet::load_defaults().themes;
    themes.remove("base16-ocean.dark").unwrap_or_default()
});

const TAB: &str = "    ";

fn frame_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Render markdown in `base` style. Output owns its strings.
pub fn render(content: &str, base: Style) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut out = Builder::new(base);
    for event in Parser::new_ext(content, opts) {
        out.event(event);
    }
    out.text
}

/// Highlight `code` with the syntax registered for `token` (e.g. `sql`).
/// Unknown tokens come back as plain lines in `fallback`.
pub fn highlight(code: &str, token: &str, fallback: Style) -> Vec<Line<'static>> {
    let Some(syntax) = SYNTAX_SET.find_syntax_by_token(token) else {
        return code
            .lines()
            .map(|l| Line::from(Span::styled(l.replace('\t', TAB), fallback)))
            .collect();
    };
    let mut hl = HighlightLines::new(syntax, &THEME);
    LinesWithEndings::from(code)
        .map(|line| highlight_line(&mut hl, line, fallback))
        .collect()
}

fn highlight_line(hl: &mut HighlightLines<'_>, line: &str, fallback: Style) -> Line<'static> {
    match hl.highlight_line(line, &SYNTAX_SET) {
        Ok(ranges) => Line::from(
            ranges
                .into_iter()
                .filter_map(|(style, frag)| {
                    let frag = frag.trim_end_matches(['\n', '\r']).replace('\t', TAB);
                    if frag.is_empty() {
                        return None;
                    }
                    let fg = style.foreground;
                    Some(Span::styled(frag, Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b))))
                })
                .collect::<Vec<_>>(),
        ),
        Err(_) => Line::from(Span::styled(
            line.trim_end_matches(['\n', '\r']).replace('\t', TAB),
            fallback,
        )),
    }
}

enum CodeBlock {
    Highlighted(HighlightLines<'static>),
    Plain,
}

struct Builder {
    text: Text<'static>,
    base: Style,
    /// Inline styles; each entry is already patched onto its parent.
    styles: Vec<Style>,
    /// Prefix spans repeated on every new line (blockquote bars, code gutter).
    gutters: Vec<Span<'static>>,
    /// None = bullet list, Some(n) = ordered list at item n.
    lists: Vec<Option<u64>>,
    code: Option<CodeBlock>,
    link: Option<String>,
    pending_gap: bool,
}

impl Builder {
    fn new(base: Style) -> Self {
        Self {
            text: Text::default(),
            base,
            styles: Vec::new(),
            gutters: Vec::new(),
            lists: Vec::new(),
            code: None,
            link: None,
            pending_gap: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or(self.base)
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn new_line(&mut self, mut line: Line<'static>) {
        for gutter in self.gutters.iter().rev() {
            line.spans.insert(0, gutter.clone());
        }
        self.text.lines.push(line);
    }

    fn span(&mut self, span: Span<'static>) {
        match self.text.lines.last_mut() {
            Some(line) => line.push_span(span),
            None => self.new_line(Line::from(span)),
        }
    }

    fn gap(&mut self) {
        if self.pending_gap {
            self.new_line(Line::default());
            self.pending_gap = false;
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(t) => self.text(&t),
            Event::Code(c) => {
                let style = Style::default().fg(Color::White).bg(Color::DarkGray);
                self.span(Span::styled(c.to_string(), style));
            }
            Event::SoftBreak => self.span(Span::raw(" ")),
            Event::HardBreak => self.new_line(Line::default()),
            Event::Rule => {
                self.gap();
                self.new_line(Line::from(Span::styled("─".repeat(40), frame_style())));
                self.pending_gap = true;
            }
            Event::TaskListMarker(done) => {
                self.span(Span::raw(if done { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.gap();
                self.new_line(Line::default());
            }
            Tag::Heading { level, .. } => {
                self.gap();
                let style = heading_style(self.base, level);
                self.new_line(Line::from(Span::styled(
                    format!("{} ", "#".repeat(level as usize)),
                    style,
                )));
                self.styles.push(style);
            }
            Tag::BlockQuote(_) => {
                self.gap();
                self.gutters.push(Span::styled("│ ", frame_style()));
                self.push_style(Style::default().add_modifier(Modifier::DIM | Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                if !self.text.lines.is_empty() {
                    self.new_line(Line::default());
                }
                let lang = match &kind {
                    CodeBlockKind::Fenced(l) => l.split_whitespace().next().unwrap_or(""),
                    CodeBlockKind::Indented => "",
                };
                let top = if lang.is_empty() {
                    Line::from(Span::styled("╭──", frame_style()))
                } else {
                    Line::from(vec![
                        Span::styled("╭── ", frame_style()),
                        Span::styled(lang.to_owned(), frame_style().add_modifier(Modifier::BOLD)),
                        Span::styled(" ──", frame_style()),
                    ])
                };
                self.new_line(top);
                self.gutters.push(Span::styled("│ ", frame_style()));
                self.code = Some(
                    SYNTAX_SET
                        .find_syntax_by_token(lang)
                        .filter(|_| !lang.is_empty())
                        .map(|syntax| CodeBlock::Highlighted(HighlightLines::new(syntax, &THEME)))
                        .unwrap_or(CodeBlock::Plain),
                );
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.gap();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.new_line(Line::default());
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}- "),
                };
                self.span(Span::styled(marker, frame_style()));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } => {
                self.link = Some(dest_url.to_string());
                self.push_style(link_style());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.pending_gap = true,
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.pending_gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.gutters.pop();
                self.styles.pop();
                self.pending_gap = true;
            }
            TagEnd::CodeBlock => {
                self.code = None;
                self.gutters.pop();
                self.new_line(Line::from(Span::styled("╰──", frame_style())));
                self.pending_gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.pending_gap = true;
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(url) = self.link.take() {
                    self.span(Span::raw(" ("));
                    self.span(Span::styled(url, link_style()));
                    self.span(Span::raw(")"));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, raw: &str) {
        // ratatui renders \t as zero-width
        let text = raw.replace('\t', TAB);
        match self.code.take() {
            Some(CodeBlock::Highlighted(mut hl)) => {
                for line in LinesWithEndings::from(raw) {
                    let rendered = highlight_line(&mut hl, line, self.base);
                    self.new_line(rendered);
                }
                self.code = Some(CodeBlock::Highlighted(hl));
            }
            Some(CodeBlock::Plain) => {
                let style = Style::default().fg(Color::White);
                for line in text.lines() {
                    self.new_line(Line::from(Span::styled(line.to_owned(), style)));
                }
                self.code = Some(CodeBlock::Plain);
            }
            None => {
                let style = self.style();
                self.span(Span::styled(text, style));
            }
        }
    }
}

fn link_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::UNDERLINED)
}

fn heading_style(base: Style, level: HeadingLevel) -> Style {
    let modifier = match level {
        HeadingLevel::H1 => Modifier::BOLD | Modifier::UNDERLINED,
        HeadingLevel::H2 => Modifier::BOLD,
        _ => Modifier::BOLD | Modifier::ITALIC,
    };
    base.add_modifier(modifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn placeholder_renders_italic() {
        let text = render("*No text.*", Style::default().fg(Color::Green));
        let span = text.lines[0]
            .spans
            .iter()
            .find(|s| s.content == "No text.")
            .unwrap();
        assert!(span.style.add_modifier.contains(Modifier::ITALIC));
        assert_eq!(span.style.fg, Some(Color::Green));
    }

    #[test]
    fn heading_text_keeps_heading_style() {
        let text = render("## Signups", Style::default().fg(Color::Blue));
        let line = &text.lines[0];
        assert_eq!(line.spans[0].content, "## ");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line.spans[1].style.fg, Some(Color::Blue));
    }

    #[test]
    fn ordered_list_numbers_items() {
        let lines = plain(&render("1. one\n2. two", Style::default()));
        assert!(lines.iter().any(|l| l == "1. one"));
        assert!(lines.iter().any(|l| l == "2. two"));
    }

    #[test]
    fn code_block_is_framed() {
        let lines = plain(&render("```\nselect 1\n```", Style::default()));
        assert!(lines[0].starts_with('╭'));
        assert_eq!(lines[1], "│ select 1");
        assert!(lines.last().unwrap().starts_with('╰'));
    }

    #[test]
    fn link_url_follows_text() {
        let lines = plain(&render("[docs](https://example.com)", Style::default()));
        assert_eq!(lines[0], "docs (https://example.com)");
    }

    #[test]
    fn highlight_sql_keeps_text() {
        let lines = highlight("SELECT count()\nFROM events", "sql", Style::default());
        assert_eq!(lines.len(), 2);
        let first: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(first, "SELECT count()");
    }

    #[test]
    fn highlight_unknown_token_is_plain() {
        let lines = highlight("a\tb", "no-such-language", Style::default());
        assert_eq!(lines[0].spans[0].content, "a    b");
    }
}
