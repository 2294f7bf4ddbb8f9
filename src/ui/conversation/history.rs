//! Conversation history display component

use crate::conversation::{Message, Role};
use crate::markdown;
use crate::ui::conversation::loading::LoadingIndicator;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use std::cell::Cell;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Scroll state for the message list.
///
/// The offset counts lines up from the bottom, so zero follows new messages.
#[derive(Debug, Default)]
pub struct ConversationHistory {
    scroll_offset: usize,
    max_offset: Cell<usize>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.max_offset.get());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn view<'a>(
        &'a self,
        messages: &'a [Message],
        loading: bool,
        accent: Color,
        elapsed_millis: u128,
    ) -> HistoryView<'a> {
        HistoryView {
            history: self,
            messages,
            loading,
            accent,
            elapsed_millis,
        }
    }
}

/// One frame's worth of history to draw
pub struct HistoryView<'a> {
    history: &'a ConversationHistory,
    messages: &'a [Message],
    loading: bool,
    accent: Color,
    elapsed_millis: u128,
}

impl HistoryView<'_> {
    /// All wrapped lines, oldest first
    pub fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let width = width as usize;
        let mut all_lines = Vec::new();

        for message in self.messages {
            all_lines.extend(message_lines(message, self.accent, width));
            all_lines.push(Line::default());
        }

        if self.loading {
            all_lines.push(bot_badge(self.accent));
            all_lines.push(LoadingIndicator::new(self.accent).line(self.elapsed_millis));
        }

        all_lines
    }
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.messages.is_empty() && !self.loading {
            Paragraph::new(welcome_lines(self.accent))
                .alignment(Alignment::Center)
                .render(inner, buf);
            return;
        }

        let all_lines = self.lines(inner.width);
        let height = inner.height as usize;
        let max_offset = all_lines.len().saturating_sub(height);
        self.history.max_offset.set(max_offset);

        let offset = self.history.scroll_offset.min(max_offset);
        let end = all_lines.len() - offset;
        let start = end.saturating_sub(height);

        Paragraph::new(all_lines[start..end].to_vec()).render(inner, buf);
    }
}

fn welcome_lines(accent: Color) -> Vec<Line<'static>> {
    vec![
        Line::default(),
        Line::from(Span::styled(
            "How can I help you today?",
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Type a message below and press Enter to send.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            "Type / for commands.",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn bot_badge(accent: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled("◆ ", Style::default().fg(accent)),
        Span::styled(
            Role::Bot.display_name(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
    ])
}

fn user_badge(accent: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            Role::User.display_name(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ●", Style::default().fg(accent)),
    ])
    .alignment(Alignment::Right)
}

/// Badge plus markdown body for one message, wrapped to `width`
fn message_lines(message: &Message, accent: Color, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    match message.role {
        Role::User => {
            lines.push(user_badge(accent));
            for line in markdown::render(&message.text, accent) {
                lines.extend(wrap_line(line.alignment(Alignment::Right), width));
            }
        }
        Role::Bot => {
            lines.push(bot_badge(accent));
            for line in markdown::render(&message.text, accent) {
                lines.extend(wrap_line(line, width));
            }
        }
    }

    lines
}

/// Word-wrap a styled line to `width` display columns, hard-splitting overlong words
pub fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line];
    }

    let alignment = line.alignment;
    let mut wrapped = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0;

    for span in line.spans {
        let style = span.style;
        for piece in span.content.split_inclusive(' ') {
            let mut token = piece.to_string();
            loop {
                let cols = token.width();
                if used + cols <= width {
                    push_text(&mut current, token, style);
                    used += cols;
                    break;
                }

                let trimmed_cols = token.trim_end().width();
                if trimmed_cols > 0 && used + trimmed_cols <= width {
                    push_text(&mut current, token.trim_end().to_string(), style);
                    wrapped.push(finish_line(&mut current, &mut used, alignment));
                    break;
                }

                if used > 0 {
                    wrapped.push(finish_line(&mut current, &mut used, alignment));
                    continue;
                }

                let split = split_at_column(&token, width);
                let tail = token.split_off(split);
                push_text(&mut current, token, style);
                wrapped.push(finish_line(&mut current, &mut used, alignment));
                if tail.is_empty() {
                    break;
                }
                token = tail;
            }
        }
    }

    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(finish_line(&mut current, &mut used, alignment));
    }

    wrapped
}

/// Byte index where `token` stops fitting in `width` columns; always past the first char
fn split_at_column(token: &str, width: usize) -> usize {
    let mut cols = 0;
    for (idx, c) in token.char_indices() {
        cols += c.width().unwrap_or(0);
        if cols > width {
            return if idx == 0 { c.len_utf8() } else { idx };
        }
    }
    token.len()
}

/// Close the line being built, dropping whitespace left at its end
fn finish_line(
    current: &mut Vec<Span<'static>>,
    used: &mut usize,
    alignment: Option<Alignment>,
) -> Line<'static> {
    if let Some(last) = current.last_mut() {
        let trimmed_len = last.content.trim_end().len();
        last.content.to_mut().truncate(trimmed_len);
    }
    current.retain(|span| !span.content.is_empty());

    let mut line = Line::from(std::mem::take(current));
    line.alignment = alignment;
    *used = 0;
    line
}

fn push_text(spans: &mut Vec<Span<'static>>, text: String, style: Style) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(last) if last.style == style => last.content.to_mut().push_str(&text),
        _ => spans.push(Span::styled(text, style)),
    }
}
