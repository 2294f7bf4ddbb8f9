//! Markdown to terminal lines.
//!
//! Fences are tracked across lines here; every other line is parsed on its
//! own with `pulldown_cmark` and its events mapped onto styled spans.
//! Wrapping is left to the widget.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const CODE_COLOR: Color = Color::Yellow;
const RULE_WIDTH: usize = 40;

/// Render markdown `text` into styled lines, using `accent` for headings
pub fn render(text: &str, accent: Color) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for raw in text.lines() {
        let trimmed = raw.trim_start();

        if let Some(rest) = trimmed.strip_prefix("```") {
            if in_code_block {
                in_code_block = false;
            } else {
                in_code_block = true;
                lines.push(fence_label(rest.trim()));
            }
            continue;
        }

        if in_code_block {
            lines.push(code_line(raw));
            continue;
        }

        lines.push(render_prose_line(raw, accent));
    }

    lines
}

fn fence_label(lang: &str) -> Line<'static> {
    let label = if lang.is_empty() {
        "── code ──".to_string()
    } else {
        format!("── {lang} ──")
    };
    Line::from(Span::styled(label, Style::default().fg(Color::DarkGray)))
}

fn code_line(text: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(text.to_string(), Style::default().fg(CODE_COLOR)),
    ])
}

fn render_prose_line(raw: &str, accent: Color) -> Line<'static> {
    if raw.trim().is_empty() {
        return Line::default();
    }

    let indent = raw.len() - raw.trim_start().len();
    let mut builder = LineBuilder::new(accent, indent);
    for event in Parser::new_ext(raw, Options::ENABLE_STRIKETHROUGH) {
        builder.event(event);
    }
    Line::from(builder.spans)
}

/// Folds the parser events of a single line into spans
struct LineBuilder {
    accent: Color,
    indent: usize,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    lists: Vec<Option<u64>>,
}

impl LineBuilder {
    fn new(accent: Color, indent: usize) -> Self {
        Self {
            accent,
            indent,
            spans: Vec::new(),
            styles: vec![Style::default()],
            lists: Vec::new(),
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => {
                if matches!(tag, TagEnd::List(..)) {
                    self.lists.pop();
                }
                if self.styles.len() > 1 {
                    self.styles.pop();
                }
            }
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                self.push(text.trim_end_matches('\n'), self.style());
            }
            Event::Code(code) => self.push(&code, self.style().fg(CODE_COLOR)),
            Event::SoftBreak | Event::HardBreak => self.push(" ", self.style()),
            Event::Rule => self.push(&"─".repeat(RULE_WIDTH), Style::default().fg(Color::DarkGray)),
            _ => {}
        }
    }

    /// Every start pushes a style so the matching end can pop it
    fn start(&mut self, tag: Tag<'_>) {
        let current = self.style();
        let style = match tag {
            Tag::Heading { level, .. } => {
                let style = current.fg(self.accent).add_modifier(Modifier::BOLD);
                if level == HeadingLevel::H1 {
                    style.add_modifier(Modifier::UNDERLINED)
                } else {
                    style
                }
            }
            Tag::BlockQuote { .. } => {
                self.push("│ ", Style::default().fg(Color::DarkGray));
                current.fg(Color::Gray).add_modifier(Modifier::ITALIC)
            }
            Tag::CodeBlock(..) => {
                self.push("  ", Style::default());
                current.fg(CODE_COLOR)
            }
            Tag::List(first) => {
                self.lists.push(first);
                current
            }
            Tag::Item => {
                let marker = match self.lists.last_mut() {
                    Some(Some(number)) => {
                        let marker = format!("{number}. ");
                        *number += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                if self.spans.is_empty() {
                    self.push(&" ".repeat(self.indent), Style::default());
                }
                self.push(&marker, Style::default());
                current
            }
            Tag::Emphasis => current.add_modifier(Modifier::ITALIC),
            Tag::Strong => current.add_modifier(Modifier::BOLD),
            Tag::Strikethrough => current.add_modifier(Modifier::CROSSED_OUT),
            Tag::Link { .. } => current.add_modifier(Modifier::UNDERLINED),
            _ => current,
        };
        self.styles.push(style);
    }

    fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(text),
            _ => self.spans.push(Span::styled(text.to_string(), style)),
        }
    }
}
